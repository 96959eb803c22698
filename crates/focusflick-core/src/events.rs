use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::timer::{Lap, Phase, TimerMode, TimerState};

/// Every state change in the system produces an Event.
/// The presentation layer renders them; notifications are derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        /// `None` for the stopwatch.
        duration_secs: Option<u64>,
        at: NaiveDateTime,
    },
    TimerPaused {
        mode: TimerMode,
        elapsed_secs: u64,
        at: NaiveDateTime,
    },
    TimerResumed {
        mode: TimerMode,
        elapsed_secs: u64,
        at: NaiveDateTime,
    },
    /// A countdown ran to zero.
    TimerCompleted {
        mode: TimerMode,
        duration_secs: u64,
        at: NaiveDateTime,
    },
    TimerStopped {
        mode: TimerMode,
        elapsed_secs: u64,
        credited: bool,
        at: NaiveDateTime,
    },
    LapRecorded {
        lap: Lap,
        at: NaiveDateTime,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        label: String,
        cycles_completed: u32,
        skipped: bool,
        auto_started: bool,
        at: NaiveDateTime,
    },
    SessionCredited {
        mode: TimerMode,
        seconds: u64,
        xp: u64,
        sessions: u64,
        total_seconds: u64,
        streak: u32,
        at: NaiveDateTime,
    },
    XpAwarded {
        amount: u64,
        reason: String,
        at: NaiveDateTime,
    },
    LevelUp {
        level: u32,
        at: NaiveDateTime,
    },
    NoteAdded {
        task_id: String,
        at: NaiveDateTime,
    },
    TaskCompleted {
        task_id: String,
        name: String,
        at: NaiveDateTime,
    },
    HabitCompleted {
        habit_id: String,
        name: String,
        day: NaiveDate,
        at: NaiveDateTime,
    },
    DailyReset {
        at: NaiveDateTime,
    },
}

/// How a notification should reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sound,
    Notification,
}

impl Event {
    /// Notification name and channel, for events that make noise.
    pub fn notification(&self) -> Option<(&'static str, Channel)> {
        match self {
            Event::TimerStarted { .. } => Some(("session_started", Channel::Sound)),
            Event::TimerCompleted { .. } => Some(("session_completed", Channel::Sound)),
            Event::TimerStopped { credited: true, .. } => Some(("session_stopped", Channel::Sound)),
            Event::PhaseChanged { .. } => Some(("phase_changed", Channel::Notification)),
            Event::LevelUp { .. } => Some(("level_up", Channel::Sound)),
            _ => None,
        }
    }

    /// True when the event reflects a change to persisted data.
    pub fn mutates_document(&self) -> bool {
        matches!(
            self,
            Event::SessionCredited { .. }
                | Event::XpAwarded { .. }
                | Event::LevelUp { .. }
                | Event::NoteAdded { .. }
                | Event::TaskCompleted { .. }
                | Event::HabitCompleted { .. }
                | Event::DailyReset { .. }
        )
    }
}

/// Read-only view of the active timer and the ledger, rebuilt after every
/// command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Option<TimerMode>,
    pub state: TimerState,
    pub elapsed_secs: u64,
    pub remaining_secs: Option<u64>,
    pub phase: Option<Phase>,
    pub phase_label: Option<String>,
    pub cycles_completed: Option<u32>,
    pub task_id: Option<String>,
    pub laps: Vec<Lap>,
    pub level: u32,
    pub xp: u64,
    pub xp_needed: u64,
    pub streak: u32,
    pub sessions: u64,
    pub total_seconds: u64,
    pub at: NaiveDateTime,
}
