//! Statistics and dashboard commands.

use clap::{Args, ValueEnum};
use focusflick_core::{task, Period, Summary};
use rand::seq::SliceRandom;

use super::{format_duration, open_app, print_json, progress_bar, CliResult};

const GREETINGS: &[&str] = &[
    "Welcome back, {}!",
    "Great to see you, {}!",
    "Hello again, {}!",
    "Ready to focus, {}?",
    "Let's get productive, {}!",
    "Time to shine, {}!",
    "Welcome to your workspace, {}!",
    "Let's make today count, {}!",
    "Your focus awaits, {}!",
    "Ready for an amazing session, {}?",
];

const QUOTES: &[&str] = &[
    "The expert in anything was once a beginner.",
    "Quality is not an act, it's a habit.",
    "Small daily improvements lead to stunning results.",
    "Your future is created by what you do today.",
    "Success is the sum of small efforts repeated daily.",
    "Concentration is the secret of strength.",
    "Productivity is never an accident. It's the result of commitment.",
    "Discipline is choosing between what you want now and what you want most.",
];

#[derive(Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Today,
    Week,
    Month,
    All,
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Today => Period::Today,
            PeriodArg::Week => Period::ThisWeek,
            PeriodArg::Month => Period::ThisMonth,
            PeriodArg::All => Period::AllTime,
        }
    }
}

#[derive(Args)]
pub struct StatsArgs {
    /// Period to summarize
    #[arg(value_enum, default_value = "today")]
    pub period: PeriodArg,
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs) -> CliResult {
    let app = open_app()?;
    let summary = app.summary(args.period.into());
    if args.json {
        return print_json(&summary);
    }
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("{}", summary.period.label());
    println!("  Focus time:        {}", format_duration(summary.focus_secs));
    println!("  Sessions:          {}", summary.sessions);
    println!("  Tasks completed:   {}", summary.tasks_completed);
    println!("  Habit check-ins:   {}", summary.habit_completions);
    if summary.daily_focus.len() > 1 {
        println!("  By day:");
        for (day, secs) in &summary.daily_focus {
            println!("    {}  {}", day.format("%a %m/%d"), format_duration(*secs));
        }
    }
    if !summary.habit_streaks.is_empty() {
        println!("  Habit streaks:");
        for h in &summary.habit_streaks {
            println!("    {:<24} {}", h.name, h.streak);
        }
    }
}

/// Greeting, level and goal progress, and what is left for today.
pub fn dashboard() -> CliResult {
    let app = open_app()?;
    let user = &app.document().user;
    let mut rng = rand::thread_rng();

    let greeting = GREETINGS
        .choose(&mut rng)
        .map(|g| g.replace("{}", &user.name))
        .unwrap_or_default();
    println!("{greeting}");
    if let Some(quote) = QUOTES.choose(&mut rng) {
        println!("\"{quote}\"");
    }
    println!();

    let level = app.level_progress();
    println!(
        "Level {}  {} {}/{} XP",
        level.level,
        progress_bar(level.fraction, 20),
        level.xp,
        level.xp_needed
    );
    let goal = app.daily_goal_progress();
    println!(
        "Today   {} {} of {}m goal",
        progress_bar(goal.fraction, 20),
        format_duration(goal.focused_secs),
        goal.goal_minutes
    );
    println!(
        "Streak  {} day(s)   Sessions {}   Total {}",
        user.streak,
        user.sessions,
        format_duration(user.total_seconds)
    );

    let today = app.now().date();
    let open: Vec<_> = task::open_tasks(&user.tasks).collect();
    println!();
    println!(
        "Tasks: {} open, {} done today",
        open.len(),
        task::completed_on(&user.tasks, today)
    );
    for t in open.iter().take(5) {
        println!("  - {} [{}]", t.name, t.priority.label());
    }

    let habits: Vec<_> = user.habits.iter().filter(|h| h.active).collect();
    if !habits.is_empty() {
        println!("Habits:");
        for h in habits {
            let mark = if h.is_done_on(today) { "x" } else { " " };
            println!("  [{mark}] {} (streak {})", h.name, h.streak(today));
        }
    }
    Ok(())
}
