//! Open-ended stopwatch with laps.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{credit, qualifies_for_credit, TimerEngine, TimerMode, TimerState, Tick};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::UserProfile;

const MODE: TimerMode = TimerMode::Stopwatch;

/// One recorded lap. `delta_secs` is the time since the previous lap, or
/// the lap's own elapsed time for the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lap {
    pub number: usize,
    pub elapsed_secs: u64,
    pub delta_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StopwatchController {
    engine: TimerEngine,
    /// Elapsed seconds at each lap, in order.
    laps: Vec<u64>,
    task_id: Option<String>,
}

impl Default for StopwatchController {
    fn default() -> Self {
        Self::new(None)
    }
}

impl StopwatchController {
    pub fn new(task_id: Option<String>) -> Self {
        Self {
            engine: TimerEngine::open_ended(),
            laps: Vec::new(),
            task_id,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn laps(&self) -> Vec<Lap> {
        let mut previous = None;
        self.laps
            .iter()
            .enumerate()
            .map(|(idx, &elapsed)| {
                let delta = previous.map_or(elapsed, |p: u64| elapsed.saturating_sub(p));
                previous = Some(elapsed);
                Lap {
                    number: idx + 1,
                    elapsed_secs: elapsed,
                    delta_secs: delta,
                }
            })
            .collect()
    }

    pub fn start(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.engine.start(now)?;
        self.laps.clear();
        Ok(vec![Event::TimerStarted {
            mode: MODE,
            duration_secs: None,
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

    /// Record a lap. Only valid while running.
    pub fn lap(&mut self, now: NaiveDateTime) -> Result<Lap> {
        if self.engine.state() != TimerState::Running {
            return Err(CoreError::invalid("lap", self.engine.state().as_str()));
        }
        self.laps.push(self.engine.elapsed_secs(now));
        let lap = self
            .laps()
            .pop()
            .ok_or_else(|| CoreError::invalid("lap", "idle"))?;
        tracing::debug!(lap = lap.number, elapsed = lap.elapsed_secs, "lap recorded");
        Ok(lap)
    }

    pub fn tick(&mut self, now: NaiveDateTime) -> Tick {
        self.engine.tick(now)
    }

    /// Stop and credit the elapsed time if it reaches the minimum. Laps are
    /// discarded either way.
    pub fn stop(&mut self, user: &mut UserProfile, now: NaiveDateTime) -> Result<Vec<Event>> {
        let elapsed = self.engine.stop(now)?;
        self.laps.clear();
        let credited = qualifies_for_credit(elapsed);
        let mut events = vec![Event::TimerStopped {
            mode: MODE,
            elapsed_secs: elapsed,
            credited,
            at: now,
        }];
        if credited {
            events.extend(credit(
                user,
                MODE,
                elapsed,
                self.task_id.as_deref(),
                None,
                now,
            ));
        }
        Ok(events)
    }
}
