use clap::Subcommand;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a setting
    Get {
        /// Setting key (e.g. "focus_duration", "sounds")
        key: String,
    },
    /// Change a setting
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    let mut app = open_app()?;
    match action {
        ConfigAction::Get { key } => match app.settings().get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            app.set_setting(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => print_json(app.settings())?,
        ConfigAction::Reset => {
            app.reset_settings()?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
