mod engine;
mod focus;
mod pomodoro;
mod stopwatch;

pub use engine::{TimerEngine, TimerState, Tick};
pub use focus::FocusController;
pub use pomodoro::{next_phase_after, Phase, PhaseOverrides, PomodoroController};
pub use stopwatch::{Lap, StopwatchController};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::progress::{self, MIN_CREDIT_SECS};
use crate::storage::UserProfile;
use crate::task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Focus,
    Stopwatch,
    Pomodoro,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::Stopwatch => "stopwatch",
            TimerMode::Pomodoro => "pomodoro",
        }
    }
}

/// Whether a manually stopped session of `elapsed` seconds earns credit.
pub fn qualifies_for_credit(elapsed: u64) -> bool {
    elapsed >= MIN_CREDIT_SECS
}

/// Credit `seconds` to the ledger and, when the session was tied to a task,
/// file the session note under it. Returns the resulting events.
pub(crate) fn credit(
    user: &mut UserProfile,
    mode: TimerMode,
    seconds: u64,
    task_id: Option<&str>,
    note: Option<&str>,
    now: NaiveDateTime,
) -> Vec<Event> {
    let credit = progress::credit_session(user, mode, seconds, now);
    let mut events = vec![Event::SessionCredited {
        mode,
        seconds: credit.seconds,
        xp: credit.xp,
        sessions: user.sessions,
        total_seconds: user.total_seconds,
        streak: credit.streak,
        at: now,
    }];
    events.extend(
        credit
            .level_ups
            .into_iter()
            .map(|level| Event::LevelUp { level, at: now }),
    );

    if let (Some(id), Some(text)) = (task_id, note) {
        match task::add_note(&mut user.tasks, id, text, now) {
            Ok(true) => events.push(Event::NoteAdded {
                task_id: id.to_string(),
                at: now,
            }),
            Ok(false) => {}
            // The task may have been deleted while the timer ran.
            Err(e) => tracing::warn!(error = %e, "session note not saved"),
        }
    }
    events
}
