//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine shared by every
//! timer mode. It does not use internal threads - the caller passes the
//! current instant into every command and is responsible for calling
//! `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> (Completed | Stopped) -> Idle
//! ```
//!
//! Pausing never accumulates a separate offset. On resume the recorded start
//! instant is shifted forward by the pause length, so elapsed time is always
//! `now - started_at`. Late or missed ticks therefore self-correct.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
        }
    }
}

/// Result of polling the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing is running.
    Idle,
    /// Countdown still in progress (seconds left).
    Remaining(u64),
    /// Open-ended count-up (seconds so far).
    Elapsed(u64),
    /// Countdown reached zero on this poll. The engine is Idle again.
    Completed { duration_secs: u64 },
}

/// Core timer engine.
///
/// `duration_secs` is `None` for open-ended (stopwatch) timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    duration_secs: Option<u64>,
    state: TimerState,
    /// Start instant, shifted forward by every completed pause.
    started_at: Option<NaiveDateTime>,
    paused_at: Option<NaiveDateTime>,
}

impl TimerEngine {
    /// Fixed-duration countdown.
    pub fn countdown(duration_secs: u64) -> Self {
        Self::with_duration(Some(duration_secs))
    }

    /// Open-ended count-up.
    pub fn open_ended() -> Self {
        Self::with_duration(None)
    }

    fn with_duration(duration_secs: Option<u64>) -> Self {
        Self {
            duration_secs,
            state: TimerState::Idle,
            started_at: None,
            paused_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != TimerState::Idle
    }

    pub fn duration_secs(&self) -> Option<u64> {
        self.duration_secs
    }

    /// Seconds elapsed so far. Frozen at the pause instant while paused.
    pub fn elapsed_secs(&self, now: NaiveDateTime) -> u64 {
        let Some(start) = self.started_at else {
            return 0;
        };
        let until = match self.state {
            TimerState::Paused => self.paused_at.unwrap_or(now),
            _ => now,
        };
        seconds_between(start, until)
    }

    /// Seconds left for a countdown, `None` when open-ended.
    pub fn remaining_secs(&self, now: NaiveDateTime) -> Option<u64> {
        self.duration_secs
            .map(|d| d.saturating_sub(self.elapsed_secs(now)))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: NaiveDateTime) -> Result<()> {
        self.require(TimerState::Idle, "start")?;
        self.state = TimerState::Running;
        self.started_at = Some(now);
        self.paused_at = None;
        Ok(())
    }

    /// Start directly in the paused state with nothing elapsed.
    ///
    /// Used when a phase is prepared but must wait for an explicit resume.
    pub fn arm(&mut self, now: NaiveDateTime) -> Result<()> {
        self.require(TimerState::Idle, "arm")?;
        self.state = TimerState::Paused;
        self.started_at = Some(now);
        self.paused_at = Some(now);
        Ok(())
    }

    pub fn pause(&mut self, now: NaiveDateTime) -> Result<()> {
        self.require(TimerState::Running, "pause")?;
        self.state = TimerState::Paused;
        self.paused_at = Some(now);
        Ok(())
    }

    pub fn resume(&mut self, now: NaiveDateTime) -> Result<()> {
        self.require(TimerState::Paused, "resume")?;
        if let (Some(start), Some(paused)) = (self.started_at, self.paused_at) {
            let pause_len = (now - paused).max(Duration::zero());
            self.started_at = Some(start + pause_len);
        }
        self.state = TimerState::Running;
        self.paused_at = None;
        Ok(())
    }

    /// Stop from Running or Paused. Returns the final elapsed seconds.
    pub fn stop(&mut self, now: NaiveDateTime) -> Result<u64> {
        if !self.is_active() {
            return Err(CoreError::invalid("stop", self.state.as_str()));
        }
        let elapsed = self.elapsed_secs(now);
        self.reset();
        Ok(elapsed)
    }

    /// Call periodically. Returns `Tick::Completed` exactly once when a
    /// countdown runs out.
    pub fn tick(&mut self, now: NaiveDateTime) -> Tick {
        match (self.state, self.duration_secs) {
            (TimerState::Idle, _) => Tick::Idle,
            (TimerState::Running, Some(duration)) => {
                let elapsed = self.elapsed_secs(now);
                if elapsed >= duration {
                    self.reset();
                    Tick::Completed {
                        duration_secs: duration,
                    }
                } else {
                    Tick::Remaining(duration - elapsed)
                }
            }
            (TimerState::Paused, Some(duration)) => {
                Tick::Remaining(duration.saturating_sub(self.elapsed_secs(now)))
            }
            (_, None) => Tick::Elapsed(self.elapsed_secs(now)),
        }
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.started_at = None;
        self.paused_at = None;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require(&self, expected: TimerState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CoreError::invalid(action, self.state.as_str()))
        }
    }
}

fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> u64 {
    (to - from).num_seconds().max(0) as u64
}
