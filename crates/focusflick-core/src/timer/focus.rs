//! Single fixed-length focus session.

use chrono::NaiveDateTime;

use super::{credit, qualifies_for_credit, TimerEngine, TimerMode, Tick};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::storage::UserProfile;

const MODE: TimerMode = TimerMode::Focus;

#[derive(Debug, Clone)]
pub struct FocusController {
    engine: TimerEngine,
    task_id: Option<String>,
    note: Option<String>,
}

impl FocusController {
    /// A session of `minutes`, optionally tied to a task.
    pub fn new(minutes: u32, task_id: Option<String>) -> Result<Self> {
        if minutes == 0 {
            return Err(ValidationError::NotPositive("duration".into()).into());
        }
        Ok(Self {
            engine: TimerEngine::countdown(u64::from(minutes) * 60),
            task_id,
            note: None,
        })
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn duration_secs(&self) -> u64 {
        self.engine.duration_secs().unwrap_or(0)
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Text filed under the associated task when the session is credited.
    pub fn set_note(&mut self, note: Option<String>) {
        self.note = note;
    }

    pub fn start(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.engine.start(now)?;
        tracing::debug!(duration_secs = self.duration_secs(), "focus session started");
        Ok(vec![Event::TimerStarted {
            mode: MODE,
            duration_secs: Some(self.duration_secs()),
            at: now,
        }])
    }

    pub fn pause(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.engine.pause(now)?;
        Ok(vec![Event::TimerPaused {
            mode: MODE,
            elapsed_secs: self.engine.elapsed_secs(now),
            at: now,
        }])
    }

    pub fn resume(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.engine.resume(now)?;
        Ok(vec![Event::TimerResumed {
            mode: MODE,
            elapsed_secs: self.engine.elapsed_secs(now),
            at: now,
        }])
    }

    /// Poll the countdown. On completion the full configured duration is
    /// credited, regardless of how late the tick arrived.
    pub fn tick(&mut self, user: &mut UserProfile, now: NaiveDateTime) -> (Tick, Vec<Event>) {
        let tick = self.engine.tick(now);
        let Tick::Completed { duration_secs } = tick else {
            return (tick, Vec::new());
        };
        let mut events = vec![Event::TimerCompleted {
            mode: MODE,
            duration_secs,
            at: now,
        }];
        events.extend(self.credit(user, duration_secs, now));
        (tick, events)
    }

    /// End early. Credits the elapsed time only when it reaches the minimum.
    pub fn stop(&mut self, user: &mut UserProfile, now: NaiveDateTime) -> Result<Vec<Event>> {
        let elapsed = self.engine.stop(now)?;
        let credited = qualifies_for_credit(elapsed);
        let mut events = vec![Event::TimerStopped {
            mode: MODE,
            elapsed_secs: elapsed,
            credited,
            at: now,
        }];
        if credited {
            events.extend(self.credit(user, elapsed, now));
        } else {
            tracing::debug!(elapsed, "focus session too short to credit");
        }
        Ok(events)
    }

    fn credit(&self, user: &mut UserProfile, seconds: u64, now: NaiveDateTime) -> Vec<Event> {
        credit(
            user,
            MODE,
            seconds,
            self.task_id.as_deref(),
            self.note.as_deref(),
            now,
        )
    }
}
