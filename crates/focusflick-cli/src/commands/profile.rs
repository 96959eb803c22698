//! Profile commands: name, daily goal and progress.

use clap::Subcommand;
use serde_json::json;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show level, XP, streak and goal progress
    Show,
    /// Change the display name
    Name {
        /// New name
        name: String,
    },
    /// Set the daily focus goal
    Goal {
        /// Minutes per day
        minutes: u32,
    },
}

pub fn run(action: ProfileAction) -> CliResult {
    let mut app = open_app()?;
    match action {
        ProfileAction::Show => {
            let user = &app.document().user;
            print_json(&json!({
                "name": user.name,
                "level": app.level_progress(),
                "streak": user.streak,
                "sessions": user.sessions,
                "total_seconds": user.total_seconds,
                "daily_goal": app.daily_goal_progress(),
            }))?;
        }
        ProfileAction::Name { name } => {
            app.set_name(&name)?;
            println!("Name set to {}", app.document().user.name);
        }
        ProfileAction::Goal { minutes } => {
            app.set_daily_goal(minutes)?;
            println!("Daily goal set to {minutes} minutes");
        }
    }
    Ok(())
}
