//! # FocusFlick Core Library
//!
//! Core logic for the FocusFlick study timer: focus sessions, a lap
//! stopwatch and Pomodoro cycles, plus the XP / level / streak ledger, tasks
//! and habits. Every front end (the `focusflick` CLI included) is a thin
//! layer over [`App`].
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine. The caller passes
//!   the current instant into every command and calls `tick()` periodically
//! - **Controllers**: Focus, stopwatch and Pomodoro rules on top of the
//!   engine; they return [`Event`]s instead of calling back
//! - **Progress**: XP, levels, streaks and the session history
//! - **Storage**: One JSON document merged over defaults on load
//!
//! ## Key Components
//!
//! - [`App`]: Owns the document and the single active timer
//! - [`TimerEngine`]: Core timer state machine
//! - [`Document`]: Persisted user profile and settings
//! - [`Storage`], [`Clock`], [`Notifier`]: Injected collaborators

pub mod app;
pub mod clock;
pub mod error;
pub mod events;
pub mod habit;
pub mod notify;
pub mod progress;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use app::{ActiveTimer, App};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, StorageError, ValidationError};
pub use events::{Channel, Event, Snapshot};
pub use habit::Habit;
pub use notify::{LogNotifier, Notifier, NullNotifier, RecordingNotifier};
pub use progress::{GoalProgress, LevelProgress, SessionRecord};
pub use stats::{Period, Summary};
pub use storage::{Document, JsonFileStore, MemoryStore, Settings, Storage, Theme, UserProfile};
pub use task::{Priority, Task, TaskDraft};
pub use timer::{
    FocusController, Lap, Phase, PhaseOverrides, PomodoroController, StopwatchController, Tick,
    TimerEngine, TimerMode, TimerState,
};
