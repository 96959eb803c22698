//! Interactive timer sessions.
//!
//! A single-threaded tokio runtime ticks the app once a second and reads
//! one-letter commands from stdin. Ctrl-C, SIGTERM and SIGHUP flush the
//! session like `q`.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use focusflick_core::{Event, PhaseOverrides, Snapshot, TimerMode, TimerState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use super::{format_clock, open_app, CliApp, CliResult};

#[derive(Args)]
pub struct FocusArgs {
    /// Session length in minutes (default: focus_duration setting)
    #[arg(long)]
    pub minutes: Option<u32>,
    /// Task ID to associate with the session
    #[arg(long)]
    pub task: Option<String>,
    /// Note filed under the task when the session is credited
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args)]
pub struct StopwatchArgs {
    /// Task ID to associate with the session
    #[arg(long)]
    pub task: Option<String>,
}

#[derive(Args)]
pub struct PomodoroArgs {
    /// Focus phase in minutes (overrides the setting for this run)
    #[arg(long)]
    pub focus: Option<u32>,
    /// Short break in minutes
    #[arg(long)]
    pub short: Option<u32>,
    /// Long break in minutes
    #[arg(long)]
    pub long: Option<u32>,
    /// Focus phases before a long break
    #[arg(long)]
    pub cycles: Option<u32>,
    /// Task ID to associate with the session
    #[arg(long)]
    pub task: Option<String>,
}

const HELP: &str = "commands: [p]ause [r]esume [l]ap s[k]ip [s]top [q]uit";

pub fn run_focus(args: FocusArgs) -> CliResult {
    let mut app = open_app()?;
    let events = app.start_focus(args.minutes, args.task, args.note)?;
    drive(app, events)
}

pub fn run_stopwatch(args: StopwatchArgs) -> CliResult {
    let mut app = open_app()?;
    let events = app.start_stopwatch(args.task)?;
    drive(app, events)
}

pub fn run_pomodoro(args: PomodoroArgs) -> CliResult {
    let mut app = open_app()?;
    let overrides = PhaseOverrides {
        focus: args.focus,
        short_break: args.short,
        long_break: args.long,
        cycles: args.cycles,
    };
    let events = app.start_pomodoro_with(overrides, args.task)?;
    drive(app, events)
}

fn drive(app: CliApp, started: Vec<Event>) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session_loop(app, started));
    // A pending stdin read would otherwise hold the process open.
    runtime.shutdown_background();
    result
}

enum Flow {
    Continue,
    Finished,
}

async fn session_loop(mut app: CliApp, started: Vec<Event>) -> CliResult {
    // Installed before anything is printed so a signal sent as soon as the
    // session is visible still flushes it.
    let mut signals = match ExitSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            app.shutdown()?;
            return Err(e.into());
        }
    };
    report(&started);
    println!("{HELP}");

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match app.tick() {
                    Ok(events) if !events.is_empty() => {
                        clear_status();
                        report(&events);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        clear_status();
                        eprintln!("error: {e}");
                    }
                }
                if app.active().is_none() {
                    break;
                }
                render_status(&app.snapshot());
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(cmd)) => {
                        clear_status();
                        match handle_command(&mut app, cmd.trim()) {
                            Ok(Flow::Continue) => {}
                            Ok(Flow::Finished) => break,
                            Err(e) => eprintln!("error: {e}"),
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("stdin closed, running until the timer ends");
                        stdin_open = false;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "unreadable input, ignoring stdin from now on");
                        stdin_open = false;
                    }
                }
            }
            name = signals.recv() => {
                tracing::info!(signal = name, "ending session");
                let events = app.shutdown()?;
                clear_status();
                report(&events);
                break;
            }
        }
    }
    print_summary(&app);
    Ok(())
}

/// Signals that end a session with the same flush as `q`.
#[cfg(unix)]
struct ExitSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ExitSignals {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "interrupt",
            _ = self.terminate.recv() => "terminate",
            _ = self.hangup.recv() => "hangup",
        }
    }
}

#[cfg(not(unix))]
struct ExitSignals;

#[cfg(not(unix))]
impl ExitSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
        "interrupt"
    }
}

fn handle_command(app: &mut CliApp, cmd: &str) -> CliResult<Flow> {
    let events = match cmd {
        "" => return Ok(Flow::Continue),
        "p" | "pause" => app.pause()?,
        "r" | "resume" => app.resume()?,
        "k" | "skip" => app.skip()?,
        "l" | "lap" => {
            let lap = app.lap()?;
            println!(
                "Lap {}: {} (+{})",
                lap.number,
                format_clock(lap.elapsed_secs),
                format_clock(lap.delta_secs)
            );
            return Ok(Flow::Continue);
        }
        "s" | "stop" => {
            report(&app.stop()?);
            return Ok(Flow::Finished);
        }
        "q" | "quit" => {
            report(&app.shutdown()?);
            return Ok(Flow::Finished);
        }
        "?" | "h" | "help" => {
            println!("{HELP}");
            return Ok(Flow::Continue);
        }
        other => {
            println!("unknown command '{other}'. {HELP}");
            return Ok(Flow::Continue);
        }
    };
    report(&events);
    Ok(Flow::Continue)
}

fn report(events: &[Event]) {
    for event in events {
        if let Some(line) = describe(event) {
            println!("{line}");
        }
    }
}

fn describe(event: &Event) -> Option<String> {
    let text = match event {
        Event::TimerStarted {
            mode,
            duration_secs: Some(secs),
            ..
        } => format!("{} started ({})", mode_name(*mode), format_clock(*secs)),
        Event::TimerStarted { mode, .. } => format!("{} started", mode_name(*mode)),
        Event::TimerPaused { elapsed_secs, .. } => {
            format!("Paused at {}", format_clock(*elapsed_secs))
        }
        Event::TimerResumed { .. } => "Resumed".into(),
        Event::TimerCompleted { mode, .. } => format!("{} complete!", mode_name(*mode)),
        Event::TimerStopped {
            elapsed_secs,
            credited: false,
            ..
        } => format!("Stopped after {} (not counted)", format_clock(*elapsed_secs)),
        Event::TimerStopped { elapsed_secs, .. } => {
            format!("Stopped after {}", format_clock(*elapsed_secs))
        }
        Event::PhaseChanged {
            label,
            skipped,
            auto_started,
            ..
        } => {
            let mut line = format!("{}: {label}", if *skipped { "Skipped" } else { "Next" });
            if !auto_started {
                line.push_str(" (type 'r' to start)");
            }
            line
        }
        Event::SessionCredited {
            seconds, xp, streak, ..
        } => format!(
            "+{xp} XP for {} of focus. Streak: {streak} day(s)",
            format_clock(*seconds)
        ),
        Event::LevelUp { level, .. } => format!("Level up! You reached level {level}"),
        Event::NoteAdded { .. } => "Session note saved to task".into(),
        _ => return None,
    };
    Some(text)
}

fn mode_name(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Focus => "Focus session",
        TimerMode::Stopwatch => "Stopwatch",
        TimerMode::Pomodoro => "Pomodoro",
    }
}

fn render_status(snap: &Snapshot) {
    let clock = match snap.remaining_secs {
        Some(left) => format!("{} left", format_clock(left)),
        None => format_clock(snap.elapsed_secs),
    };
    let label = snap.phase_label.as_deref().unwrap_or("");
    let paused = if snap.state == TimerState::Paused {
        " [paused]"
    } else {
        ""
    };
    print!("\r\x1b[2K{label}{}{clock}{paused}", if label.is_empty() { "" } else { "  " });
    let _ = std::io::stdout().flush();
}

fn clear_status() {
    print!("\r\x1b[2K");
    let _ = std::io::stdout().flush();
}

fn print_summary(app: &CliApp) {
    let snap = app.snapshot();
    println!(
        "Level {} ({}/{} XP), {} sessions, streak {}",
        snap.level, snap.xp, snap.xp_needed, snap.sessions, snap.streak
    );
}
