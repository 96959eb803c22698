//! Application facade.
//!
//! [`App`] owns the document and at most one active timer. Every command
//! reads `now` from the injected clock, runs the controller or ledger
//! operation, persists when stored data changed, fires notifications, and
//! returns the produced events for the presentation layer.

use std::path::Path;

use chrono::{Duration, NaiveDateTime};

use crate::clock::Clock;
use crate::error::{CoreError, Result, StorageError, ValidationError};
use crate::events::{Channel, Event, Snapshot};
use crate::habit::{self, Habit};
use crate::notify::Notifier;
use crate::progress::{self, GoalProgress, LevelProgress};
use crate::stats::{self, Period, Summary};
use crate::storage::{self, Document, Settings, Storage};
use crate::task::{self, non_blank, Task, TaskDraft};
use crate::timer::{
    FocusController, Lap, PhaseOverrides, PomodoroController, StopwatchController, Tick, TimerMode,
    TimerState,
};

/// The daily-reset check runs at most this often from `tick()`.
const RESET_CHECK_INTERVAL_SECS: i64 = 3600;

/// The one timer that may be running.
#[derive(Debug, Clone)]
pub enum ActiveTimer {
    Focus(FocusController),
    Stopwatch(StopwatchController),
    /// Each phase reads the stored settings with `overrides` on top.
    Pomodoro {
        controller: PomodoroController,
        overrides: PhaseOverrides,
    },
}

impl ActiveTimer {
    pub fn mode(&self) -> TimerMode {
        match self {
            ActiveTimer::Focus(_) => TimerMode::Focus,
            ActiveTimer::Stopwatch(_) => TimerMode::Stopwatch,
            ActiveTimer::Pomodoro { .. } => TimerMode::Pomodoro,
        }
    }

    pub fn state(&self) -> TimerState {
        match self {
            ActiveTimer::Focus(c) => c.engine().state(),
            ActiveTimer::Stopwatch(c) => c.engine().state(),
            ActiveTimer::Pomodoro { controller, .. } => controller.engine().state(),
        }
    }

    fn task_id(&self) -> Option<&str> {
        match self {
            ActiveTimer::Focus(c) => c.task_id(),
            ActiveTimer::Stopwatch(c) => c.task_id(),
            ActiveTimer::Pomodoro { controller, .. } => controller.task_id(),
        }
    }
}

pub struct App<S: Storage, C: Clock, N: Notifier> {
    storage: S,
    clock: C,
    notifier: N,
    doc: Document,
    active: Option<ActiveTimer>,
    last_reset_check: Option<NaiveDateTime>,
}

impl<S: Storage, C: Clock, N: Notifier> App<S, C, N> {
    /// Load the document (falling back to defaults) and roll the day over
    /// if needed.
    pub fn open(storage: S, clock: C, notifier: N) -> Self {
        let now = clock.now();
        let doc = storage.load(now);
        let mut app = Self {
            storage,
            clock,
            notifier,
            doc,
            active: None,
            last_reset_check: None,
        };
        if let Err(e) = app.check_daily_reset(now).and_then(|events| app.commit(events, false)) {
            tracing::warn!(error = %e, "could not save after daily reset");
        }
        app
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn settings(&self) -> &Settings {
        &self.doc.settings
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn active(&self) -> Option<&ActiveTimer> {
        self.active.as_ref()
    }

    pub fn level_progress(&self) -> LevelProgress {
        progress::level_progress(&self.doc.user)
    }

    pub fn daily_goal_progress(&self) -> GoalProgress {
        progress::daily_goal_progress(&self.doc.user, self.clock.now().date())
    }

    pub fn summary(&self, period: Period) -> Summary {
        stats::summarize(&self.doc.user, period, self.clock.now().date())
    }

    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let user = &self.doc.user;
        let mut snap = Snapshot {
            mode: None,
            state: TimerState::Idle,
            elapsed_secs: 0,
            remaining_secs: None,
            phase: None,
            phase_label: None,
            cycles_completed: None,
            task_id: None,
            laps: Vec::new(),
            level: user.level,
            xp: user.xp,
            xp_needed: progress::xp_needed(user.level),
            streak: user.streak,
            sessions: user.sessions,
            total_seconds: user.total_seconds,
            at: now,
        };
        let Some(active) = &self.active else {
            return snap;
        };
        snap.mode = Some(active.mode());
        snap.state = active.state();
        snap.task_id = active.task_id().map(str::to_string);
        let engine = match active {
            ActiveTimer::Focus(c) => c.engine(),
            ActiveTimer::Stopwatch(c) => {
                snap.laps = c.laps();
                c.engine()
            }
            ActiveTimer::Pomodoro { controller, .. } => {
                snap.phase = Some(controller.phase());
                snap.phase_label = Some(controller.label());
                snap.cycles_completed = Some(controller.cycles_completed());
                controller.engine()
            }
        };
        snap.elapsed_secs = engine.elapsed_secs(now);
        snap.remaining_secs = engine.remaining_secs(now);
        snap
    }

    // ── Timer commands ───────────────────────────────────────────────

    /// Start a focus session. `minutes` defaults to the configured focus
    /// duration.
    pub fn start_focus(
        &mut self,
        minutes: Option<u32>,
        task_id: Option<String>,
        note: Option<String>,
    ) -> Result<Vec<Event>> {
        self.ensure_idle()?;
        self.check_task(task_id.as_deref())?;
        let minutes = minutes.unwrap_or(self.doc.settings.focus_duration);
        let mut controller = FocusController::new(minutes, task_id)?;
        controller.set_note(note);
        let events = controller.start(self.clock.now())?;
        self.active = Some(ActiveTimer::Focus(controller));
        self.commit(events, false)
    }

    pub fn start_stopwatch(&mut self, task_id: Option<String>) -> Result<Vec<Event>> {
        self.ensure_idle()?;
        self.check_task(task_id.as_deref())?;
        let mut controller = StopwatchController::new(task_id);
        let events = controller.start(self.clock.now())?;
        self.active = Some(ActiveTimer::Stopwatch(controller));
        self.commit(events, false)
    }

    /// Start a Pomodoro cycle with the stored settings.
    pub fn start_pomodoro(&mut self, task_id: Option<String>) -> Result<Vec<Event>> {
        self.start_pomodoro_with(PhaseOverrides::default(), task_id)
    }

    /// Start a Pomodoro cycle with one-off durations. The stored settings
    /// are not changed.
    pub fn start_pomodoro_with(
        &mut self,
        overrides: PhaseOverrides,
        task_id: Option<String>,
    ) -> Result<Vec<Event>> {
        self.ensure_idle()?;
        self.check_task(task_id.as_deref())?;
        let settings = overrides.apply(&self.doc.settings);
        let mut controller = PomodoroController::new(&settings, task_id)?;
        let events = controller.start(self.clock.now())?;
        self.active = Some(ActiveTimer::Pomodoro {
            controller,
            overrides,
        });
        self.commit(events, false)
    }

    pub fn pause(&mut self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let events = match self.active.as_mut() {
            Some(ActiveTimer::Focus(c)) => c.pause(now)?,
            Some(ActiveTimer::Stopwatch(c)) => c.pause(now)?,
            Some(ActiveTimer::Pomodoro { controller, .. }) => controller.pause(now)?,
            None => return Err(CoreError::invalid("pause", "idle")),
        };
        self.commit(events, false)
    }

    pub fn resume(&mut self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let events = match self.active.as_mut() {
            Some(ActiveTimer::Focus(c)) => c.resume(now)?,
            Some(ActiveTimer::Stopwatch(c)) => c.resume(now)?,
            Some(ActiveTimer::Pomodoro { controller, .. }) => controller.resume(now)?,
            None => return Err(CoreError::invalid("resume", "idle")),
        };
        self.commit(events, false)
    }

    /// Stop the active timer, crediting it under the one-minute rule.
    pub fn stop(&mut self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let user = &mut self.doc.user;
        let events = match self.active.as_mut() {
            Some(ActiveTimer::Focus(c)) => c.stop(user, now)?,
            Some(ActiveTimer::Stopwatch(c)) => c.stop(user, now)?,
            Some(ActiveTimer::Pomodoro { controller, .. }) => controller.stop(user, now)?,
            None => return Err(CoreError::invalid("stop", "idle")),
        };
        self.active = None;
        self.commit(events, false)
    }

    /// Abandon the current Pomodoro phase without credit.
    pub fn skip(&mut self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let events = match self.active.as_mut() {
            Some(ActiveTimer::Pomodoro {
                controller,
                overrides,
            }) => controller.skip(&overrides.apply(&self.doc.settings), now)?,
            Some(other) => return Err(CoreError::invalid("skip", other.mode().as_str())),
            None => return Err(CoreError::invalid("skip", "idle")),
        };
        self.commit(events, false)
    }

    pub fn lap(&mut self) -> Result<Lap> {
        let now = self.clock.now();
        let lap = match self.active.as_mut() {
            Some(ActiveTimer::Stopwatch(c)) => c.lap(now)?,
            Some(other) => return Err(CoreError::invalid("lap", other.mode().as_str())),
            None => return Err(CoreError::invalid("lap", "idle")),
        };
        self.commit(vec![Event::LapRecorded { lap, at: now }], false)?;
        Ok(lap)
    }

    /// Replace the note filed under the task when the focus session is
    /// credited.
    pub fn set_session_note(&mut self, note: Option<String>) -> Result<()> {
        match self.active.as_mut() {
            Some(ActiveTimer::Focus(c)) => {
                c.set_note(note.as_deref().and_then(|n| non_blank(Some(n))));
                Ok(())
            }
            Some(other) => Err(CoreError::invalid("add a note", other.mode().as_str())),
            None => Err(CoreError::invalid("add a note", "idle")),
        }
    }

    /// Drive the active timer and the daily reset. Call about once a second.
    pub fn tick(&mut self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let due = self.last_reset_check.map_or(true, |last| {
            now - last >= Duration::seconds(RESET_CHECK_INTERVAL_SECS)
        });
        let mut events = if due {
            self.check_daily_reset(now)?
        } else {
            Vec::new()
        };

        let user = &mut self.doc.user;
        let stored = &self.doc.settings;
        let (tick, timer_events) = match self.active.as_mut() {
            Some(ActiveTimer::Focus(c)) => c.tick(user, now),
            Some(ActiveTimer::Stopwatch(c)) => (c.tick(now), Vec::new()),
            Some(ActiveTimer::Pomodoro {
                controller,
                overrides,
            }) => controller.tick(user, &overrides.apply(stored), now),
            None => (Tick::Idle, Vec::new()),
        };
        events.extend(timer_events);
        if matches!(tick, Tick::Completed { .. })
            && matches!(self.active, Some(ActiveTimer::Focus(_)))
        {
            self.active = None;
        }
        self.commit(events, false)
    }

    /// Flush the in-progress session and save. Used on exit.
    pub fn shutdown(&mut self) -> Result<Vec<Event>> {
        let active = self.active.as_ref().map_or(false, |a| a.state() != TimerState::Idle);
        let events = if active { self.stop()? } else { Vec::new() };
        self.active = None;
        self.storage.save(&self.doc)?;
        tracing::debug!("shutdown complete");
        Ok(events)
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(&mut self, draft: &TaskDraft) -> Result<Task> {
        let task = task::add(&mut self.doc.user.tasks, draft, self.clock.now())?;
        self.commit(Vec::new(), true)?;
        Ok(task)
    }

    pub fn edit_task(&mut self, id: &str, draft: &TaskDraft) -> Result<()> {
        task::edit(&mut self.doc.user.tasks, id, draft)?;
        self.commit(Vec::new(), true)?;
        Ok(())
    }

    /// Mark a task done (awarding XP once) or not done.
    pub fn set_task_completed(&mut self, id: &str, completed: bool) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let toggle = task::set_completed(&mut self.doc.user, id, completed, now)?;
        let mut events = Vec::new();
        if toggle.xp_awarded > 0 {
            let name = task::find(&self.doc.user.tasks, id)?.name.clone();
            events.push(Event::XpAwarded {
                amount: toggle.xp_awarded,
                reason: format!("task: {name}"),
                at: now,
            });
            events.push(Event::TaskCompleted {
                task_id: id.to_string(),
                name,
                at: now,
            });
            events.extend(toggle.level_ups.into_iter().map(|level| Event::LevelUp { level, at: now }));
        }
        self.commit(events, true)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let removed = task::delete(&mut self.doc.user.tasks, id)?;
        self.commit(Vec::new(), true)?;
        Ok(removed)
    }

    /// Append a dated note. Returns `false` for a blank note.
    pub fn add_task_note(&mut self, id: &str, text: &str) -> Result<bool> {
        let now = self.clock.now();
        let added = task::add_note(&mut self.doc.user.tasks, id, text, now)?;
        if added {
            self.commit(
                vec![Event::NoteAdded {
                    task_id: id.to_string(),
                    at: now,
                }],
                true,
            )?;
        }
        Ok(added)
    }

    // ── Habits ───────────────────────────────────────────────────────

    pub fn add_habit(&mut self, name: &str, description: Option<&str>) -> Result<Habit> {
        let habit = habit::add(&mut self.doc.user.habits, name, description, self.clock.now())?;
        self.commit(Vec::new(), true)?;
        Ok(habit)
    }

    pub fn edit_habit(&mut self, id: &str, name: &str, description: Option<&str>) -> Result<()> {
        habit::edit(&mut self.doc.user.habits, id, name, description)?;
        self.commit(Vec::new(), true)?;
        Ok(())
    }

    /// Returns the new active flag.
    pub fn toggle_habit_active(&mut self, id: &str) -> Result<bool> {
        let active = habit::toggle_active(&mut self.doc.user.habits, id)?;
        self.commit(Vec::new(), true)?;
        Ok(active)
    }

    pub fn delete_habit(&mut self, id: &str) -> Result<Habit> {
        let removed = habit::delete(&mut self.doc.user.habits, id)?;
        self.commit(Vec::new(), true)?;
        Ok(removed)
    }

    /// Check or uncheck a habit for today.
    pub fn set_habit_completed_today(&mut self, id: &str, completed: bool) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let day = now.date();
        let toggle = habit::set_completed(&mut self.doc.user, id, day, completed)?;
        if !toggle.changed {
            return Ok(Vec::new());
        }
        let mut events = Vec::new();
        if toggle.xp_awarded > 0 {
            let name = habit::find(&self.doc.user.habits, id)?.name.clone();
            events.push(Event::XpAwarded {
                amount: toggle.xp_awarded,
                reason: format!("habit: {name}"),
                at: now,
            });
            events.push(Event::HabitCompleted {
                habit_id: id.to_string(),
                name,
                day,
                at: now,
            });
            events.extend(toggle.level_ups.into_iter().map(|level| Event::LevelUp { level, at: now }));
        }
        self.commit(events, true)
    }

    // ── Profile and settings ─────────────────────────────────────────

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let name = non_blank(Some(name)).ok_or(ValidationError::EmptyName("Name"))?;
        self.doc.user.name = name;
        self.commit(Vec::new(), true)?;
        Ok(())
    }

    /// Daily focus goal in minutes. Must be positive.
    pub fn set_daily_goal(&mut self, minutes: u32) -> Result<()> {
        if minutes == 0 {
            return Err(ValidationError::NotPositive("daily_goal".into()).into());
        }
        self.doc.user.daily_goal = minutes;
        self.commit(Vec::new(), true)?;
        Ok(())
    }

    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.doc.settings.set(key, value)?;
        self.commit(Vec::new(), true)?;
        Ok(())
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.doc.settings = settings;
        self.commit(Vec::new(), true)?;
        Ok(())
    }

    pub fn reset_settings(&mut self) -> Result<()> {
        self.update_settings(Settings::default())
    }

    // ── Data ─────────────────────────────────────────────────────────

    pub fn export_to(&self, path: &Path) -> Result<()> {
        storage::write_document(path, &self.doc)?;
        tracing::info!(path = %path.display(), "data exported");
        Ok(())
    }

    /// Replace the document with the one at `path`, merged over defaults.
    /// Not allowed while a timer is running.
    pub fn import_from(&mut self, path: &Path) -> Result<()> {
        if let Some(active) = self.active.as_ref().filter(|a| a.state() != TimerState::Idle) {
            return Err(CoreError::invalid("import", active.state().as_str()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| StorageError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.doc = storage::read_document(&content, self.clock.now())?;
        self.active = None;
        tracing::info!(path = %path.display(), "data imported");
        self.commit(Vec::new(), true)?;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_idle(&self) -> Result<()> {
        match &self.active {
            Some(active) if active.state() != TimerState::Idle => {
                Err(CoreError::invalid("start", active.state().as_str()))
            }
            _ => Ok(()),
        }
    }

    fn check_task(&self, task_id: Option<&str>) -> Result<()> {
        if let Some(id) = task_id {
            task::find(&self.doc.user.tasks, id)?;
        }
        Ok(())
    }

    fn check_daily_reset(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.last_reset_check = Some(now);
        if progress::daily_reset(&mut self.doc.user, now) {
            Ok(vec![Event::DailyReset { at: now }])
        } else {
            Ok(Vec::new())
        }
    }

    /// Notify, then save if anything persisted changed. A failed save keeps
    /// the in-memory state and is reported to the caller.
    fn commit(&mut self, events: Vec<Event>, dirty: bool) -> Result<Vec<Event>> {
        for event in &events {
            let Some((name, channel)) = event.notification() else {
                continue;
            };
            let enabled = match channel {
                Channel::Sound => self.doc.settings.sounds,
                Channel::Notification => self.doc.settings.notifications,
            };
            if enabled {
                self.notifier.notify(name);
            }
        }
        if dirty || events.iter().any(Event::mutates_document) {
            self.storage.save(&self.doc)?;
        }
        Ok(events)
    }
}
