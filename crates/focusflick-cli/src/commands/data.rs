//! Backup and restore of the data file.

use std::path::PathBuf;

use clap::Subcommand;

use super::{open_app, CliResult};

#[derive(Subcommand)]
pub enum DataAction {
    /// Write all data to a JSON file
    Export {
        /// Destination path
        path: PathBuf,
    },
    /// Replace all data with the contents of a JSON file
    Import {
        /// Source path
        path: PathBuf,
    },
}

pub fn run(action: DataAction) -> CliResult {
    let mut app = open_app()?;
    match action {
        DataAction::Export { path } => {
            app.export_to(&path)?;
            println!("Exported to {}", path.display());
        }
        DataAction::Import { path } => {
            app.import_from(&path)?;
            let user = &app.document().user;
            println!(
                "Imported {} tasks and {} habits for {}",
                user.tasks.len(),
                user.habits.len(),
                user.name
            );
        }
    }
    Ok(())
}
