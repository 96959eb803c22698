pub mod config;
pub mod data;
pub mod habit;
pub mod profile;
pub mod stats;
pub mod task;
pub mod timer;

use std::io::Write;

use focusflick_core::{App, JsonFileStore, Notifier, SystemClock};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub type CliApp = App<JsonFileStore, SystemClock, TerminalNotifier>;

/// Rings the terminal bell. The core has already applied the sound and
/// notification toggles by the time this is called.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, event: &str) {
        tracing::debug!(event, "notify");
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}

/// Open the app on the default data file.
pub fn open_app() -> CliResult<CliApp> {
    let store = JsonFileStore::open_default()?;
    tracing::debug!(path = %store.path().display(), "opening data file");
    Ok(App::open(store, SystemClock, TerminalNotifier))
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// `2h 05m`, or `42m` under an hour.
pub fn format_duration(secs: u64) -> String {
    let (h, m) = (secs / 3600, secs % 3600 / 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else {
        format!("{m}m")
    }
}

/// Text progress bar, `width` cells wide.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0)) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(3725), "1:02:05");
    }

    #[test]
    fn duration_format() {
        assert_eq!(format_duration(59), "0m");
        assert_eq!(format_duration(2520), "42m");
        assert_eq!(format_duration(7500), "2h 05m");
    }

    #[test]
    fn bar_is_clamped() {
        assert_eq!(progress_bar(0.5, 4), "[##--]");
        assert_eq!(progress_bar(2.0, 4), "[####]");
        assert_eq!(progress_bar(-1.0, 2), "[--]");
    }
}
