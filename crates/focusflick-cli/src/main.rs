use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

mod commands;

#[derive(Parser)]
#[command(name = "focusflick", version, about = "FocusFlick study timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single focus session
    Focus(commands::timer::FocusArgs),
    /// Run an open-ended stopwatch with laps
    Stopwatch(commands::timer::StopwatchArgs),
    /// Run Pomodoro cycles
    Pomodoro(commands::timer::PomodoroArgs),
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Habit tracking
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Session statistics
    Stats(commands::stats::StatsArgs),
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Name, daily goal and progress
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Export or import all data
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Overview of today
    Dashboard,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Focus(args) => commands::timer::run_focus(args),
        Commands::Stopwatch(args) => commands::timer::run_stopwatch(args),
        Commands::Pomodoro(args) => commands::timer::run_pomodoro(args),
        Commands::Task { action } => commands::task::run(action),
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Data { action } => commands::data::run(action),
        Commands::Dashboard => commands::stats::dashboard(),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "focusflick", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pomodoro_overrides_parse() {
        let cli = Cli::try_parse_from([
            "focusflick", "pomodoro", "--focus", "50", "--short", "10", "--cycles", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Pomodoro(args) => {
                assert_eq!(args.focus, Some(50));
                assert_eq!(args.short, Some(10));
                assert_eq!(args.long, None);
                assert_eq!(args.cycles, Some(2));
            }
            _ => panic!("expected pomodoro"),
        }
    }

    #[test]
    fn stats_period_defaults_to_today() {
        let cli = Cli::try_parse_from(["focusflick", "stats"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Stats(commands::stats::StatsArgs {
                period: commands::stats::PeriodArg::Today,
                json: false,
            })
        ));
    }
}
