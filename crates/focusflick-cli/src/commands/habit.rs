//! Habit tracking commands for CLI.

use clap::Subcommand;
use focusflick_core::habit;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Add {
        /// Habit name
        name: String,
        /// Habit description
        #[arg(long)]
        description: Option<String>,
    },
    /// List habits with streaks
    List {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a habit or change its description
    Edit {
        /// Habit ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description (empty string clears it)
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark a habit as done today
    Check {
        /// Habit ID
        id: String,
    },
    /// Remove today's check mark
    Uncheck {
        /// Habit ID
        id: String,
    },
    /// Toggle whether a habit is active
    Toggle {
        /// Habit ID
        id: String,
    },
    /// Delete a habit
    Delete {
        /// Habit ID
        id: String,
    },
}

pub fn run(action: HabitAction) -> CliResult {
    let mut app = open_app()?;
    let today = app.now().date();

    match action {
        HabitAction::Add { name, description } => {
            let habit = app.add_habit(&name, description.as_deref())?;
            println!("Habit created: {}", habit.id);
            print_json(&habit)?;
        }
        HabitAction::List { json } => {
            let habits = &app.document().user.habits;
            if json {
                print_json(habits)?;
            } else if habits.is_empty() {
                println!("No habits.");
            } else {
                for h in habits {
                    let mark = if h.is_done_on(today) { "x" } else { " " };
                    let inactive = if h.active { "" } else { "  (inactive)" };
                    println!(
                        "[{mark}] {}  {}  streak {}{inactive}",
                        h.id,
                        h.name,
                        h.streak(today)
                    );
                }
            }
        }
        HabitAction::Edit {
            id,
            name,
            description,
        } => {
            let current = habit::find(&app.document().user.habits, &id)?;
            let name = name.unwrap_or_else(|| current.name.clone());
            let description = description.or_else(|| current.description.clone());
            app.edit_habit(&id, &name, description.as_deref())?;
            println!("Habit updated: {id}");
        }
        HabitAction::Check { id } => {
            let events = app.set_habit_completed_today(&id, true)?;
            if events.is_empty() {
                println!("Already done today: {id}");
            } else {
                println!("Habit done: {id}");
                print_json(&events)?;
            }
        }
        HabitAction::Uncheck { id } => {
            app.set_habit_completed_today(&id, false)?;
            println!("Habit unchecked: {id}");
        }
        HabitAction::Toggle { id } => {
            let active = app.toggle_habit_active(&id)?;
            println!(
                "Habit {}: {id}",
                if active { "activated" } else { "deactivated" }
            );
        }
        HabitAction::Delete { id } => {
            let habit = app.delete_habit(&id)?;
            println!("Habit deleted: {} ({})", habit.id, habit.name);
        }
    }
    Ok(())
}
