//! Pomodoro cycle: focus phases separated by short breaks, with a long
//! break after every `pomodoro_cycles` completed focus phases.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{credit, qualifies_for_credit, TimerEngine, TimerMode, Tick};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::{Settings, UserProfile};

const MODE: TimerMode = TimerMode::Pomodoro;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Focus)
    }

    pub fn duration_secs(self, settings: &Settings) -> u64 {
        match self {
            Phase::Focus => settings.focus_secs(),
            Phase::ShortBreak => settings.short_break_secs(),
            Phase::LongBreak => settings.long_break_secs(),
        }
    }

    /// Whether this phase starts on its own when the previous one ends.
    pub fn auto_starts(self, settings: &Settings) -> bool {
        match self {
            Phase::Focus => settings.auto_start_pomodoros,
            Phase::ShortBreak | Phase::LongBreak => settings.auto_start_breaks,
        }
    }
}

/// One-off durations for a single run, layered over the stored settings
/// each time a phase begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseOverrides {
    pub focus: Option<u32>,
    pub short_break: Option<u32>,
    pub long_break: Option<u32>,
    pub cycles: Option<u32>,
}

impl PhaseOverrides {
    pub fn apply(&self, settings: &Settings) -> Settings {
        Settings {
            focus_duration: self.focus.unwrap_or(settings.focus_duration),
            short_break: self.short_break.unwrap_or(settings.short_break),
            long_break: self.long_break.unwrap_or(settings.long_break),
            pomodoro_cycles: self.cycles.unwrap_or(settings.pomodoro_cycles),
            ..settings.clone()
        }
    }
}

/// The phase that follows `phase`, given the focus phases completed so far
/// (already counting the one that just ended).
///
/// A long break needs at least one completed focus phase, so skipping the
/// very first focus phase leads to a short break.
pub fn next_phase_after(phase: Phase, cycles_completed: u32, pomodoro_cycles: u32) -> Phase {
    match phase {
        Phase::Focus => {
            let cycles = pomodoro_cycles.max(1);
            if cycles_completed > 0 && cycles_completed % cycles == 0 {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        }
        Phase::ShortBreak | Phase::LongBreak => Phase::Focus,
    }
}

#[derive(Debug, Clone)]
pub struct PomodoroController {
    engine: TimerEngine,
    phase: Phase,
    cycles_completed: u32,
    pomodoro_cycles: u32,
    task_id: Option<String>,
}

impl PomodoroController {
    /// A cycle using the durations in `settings`.
    pub fn new(settings: &Settings, task_id: Option<String>) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            engine: TimerEngine::countdown(Phase::Focus.duration_secs(settings)),
            phase: Phase::Focus,
            cycles_completed: 0,
            pomodoro_cycles: settings.pomodoro_cycles,
            task_id,
        })
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn label(&self) -> String {
        match self.phase {
            Phase::Focus => format!(
                "Focus Session {} of {}",
                self.cycles_completed + 1,
                self.pomodoro_cycles
            ),
            Phase::ShortBreak => "Short Break".into(),
            Phase::LongBreak => "Long Break".into(),
        }
    }

    pub fn start(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.engine.start(now)?;
        Ok(vec![Event::TimerStarted {
            mode: MODE,
            duration_secs: self.engine.duration_secs(),
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

    /// Poll the current phase and advance when it runs out. A completed
    /// focus phase is credited with its full configured length.
    pub fn tick(
        &mut self,
        user: &mut UserProfile,
        settings: &Settings,
        now: NaiveDateTime,
    ) -> (Tick, Vec<Event>) {
        let tick = self.engine.tick(now);
        let Tick::Completed { duration_secs } = tick else {
            return (tick, Vec::new());
        };

        let mut events = vec![Event::TimerCompleted {
            mode: MODE,
            duration_secs,
            at: now,
        }];
        if self.phase == Phase::Focus {
            self.cycles_completed += 1;
            events.extend(credit(
                user,
                MODE,
                duration_secs,
                self.task_id.as_deref(),
                None,
                now,
            ));
        }
        events.push(self.advance(settings, false, now));
        (tick, events)
    }

    /// Abandon the current phase without credit and move to the next one.
    pub fn skip(&mut self, settings: &Settings, now: NaiveDateTime) -> Result<Vec<Event>> {
        if !self.engine.is_active() {
            return Err(CoreError::invalid("skip", self.engine.state().as_str()));
        }
        self.engine.reset();
        Ok(vec![self.advance(settings, true, now)])
    }

    /// End the cycle. Only an in-progress focus phase of at least a minute is
    /// credited, with its elapsed time.
    pub fn stop(&mut self, user: &mut UserProfile, now: NaiveDateTime) -> Result<Vec<Event>> {
        let elapsed = self.engine.stop(now)?;
        let credited = self.phase == Phase::Focus && qualifies_for_credit(elapsed);
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

    fn advance(&mut self, settings: &Settings, skipped: bool, now: NaiveDateTime) -> Event {
        let from = self.phase;
        // Keep the cycle length the user started with unless settings are usable.
        if settings.pomodoro_cycles > 0 {
            self.pomodoro_cycles = settings.pomodoro_cycles;
        }
        let to = next_phase_after(from, self.cycles_completed, self.pomodoro_cycles);
        self.phase = to;
        self.engine = TimerEngine::countdown(to.duration_secs(settings).max(1));

        let auto_started = to.auto_starts(settings);
        // A fresh engine is always idle, so neither call can fail.
        let armed = if auto_started {
            self.engine.start(now)
        } else {
            self.engine.arm(now)
        };
        if let Err(e) = armed {
            tracing::warn!(error = %e, "could not arm next phase");
        }

        tracing::debug!(?from, ?to, skipped, auto_started, "pomodoro phase changed");
        Event::PhaseChanged {
            from,
            to,
            label: self.label(),
            cycles_completed: self.cycles_completed,
            skipped,
            auto_started,
            at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerState;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn at(secs: i64) -> NaiveDateTime {
        t0() + Duration::seconds(secs)
    }

    #[test]
    fn fourth_completed_focus_earns_long_break() {
        let phases: Vec<_> = (1..=4)
            .map(|n| next_phase_after(Phase::Focus, n, 4))
            .collect();
        assert_eq!(
            phases,
            [Phase::ShortBreak, Phase::ShortBreak, Phase::ShortBreak, Phase::LongBreak]
        );
        assert_eq!(next_phase_after(Phase::Focus, 8, 4), Phase::LongBreak);
        assert_eq!(next_phase_after(Phase::LongBreak, 4, 4), Phase::Focus);
    }

    #[test]
    fn skipping_first_focus_is_a_short_break() {
        assert_eq!(next_phase_after(Phase::Focus, 0, 4), Phase::ShortBreak);
    }

    #[test]
    fn completed_focus_credits_configured_duration_and_breaks_are_free() {
        let settings = Settings::default();
        let mut user = UserProfile::new(t0());
        let mut pomo = PomodoroController::new(&settings, None).unwrap();
        pomo.start(at(0)).unwrap();
        assert_eq!(pomo.label(), "Focus Session 1 of 4");

        // Tick arrives late: credit is still exactly 25 minutes.
        let (_, events) = pomo.tick(&mut user, &settings, at(1600));
        assert_eq!(user.total_seconds, 1500);
        assert_eq!(user.xp, 250);
        assert_eq!(pomo.cycles_completed(), 1);
        assert_eq!(pomo.phase(), Phase::ShortBreak);
        assert!(matches!(
            events.last(),
            Some(Event::PhaseChanged { to: Phase::ShortBreak, auto_started: true, .. })
        ));

        // The short break runs out: no credit, back to focus.
        pomo.tick(&mut user, &settings, at(1600 + 300));
        assert_eq!(user.sessions, 1);
        assert_eq!(pomo.phase(), Phase::Focus);
        assert_eq!(pomo.label(), "Focus Session 2 of 4");
    }

    #[test]
    fn full_cycle_reaches_long_break() {
        let settings = Settings::default();
        let mut user = UserProfile::new(t0());
        let mut pomo = PomodoroController::new(&settings, None).unwrap();
        pomo.start(at(0)).unwrap();

        let mut now = 0;
        let mut breaks = Vec::new();
        for _ in 0..4 {
            now += 1500;
            pomo.tick(&mut user, &settings, at(now));
            breaks.push(pomo.phase());
            now += pomo.phase().duration_secs(&settings) as i64;
            pomo.tick(&mut user, &settings, at(now));
        }
        assert_eq!(
            breaks,
            [Phase::ShortBreak, Phase::ShortBreak, Phase::ShortBreak, Phase::LongBreak]
        );
        assert_eq!(user.sessions, 4);
    }

    #[test]
    fn skip_advances_without_credit() {
        let settings = Settings::default();
        let user = UserProfile::new(t0());
        let mut pomo = PomodoroController::new(&settings, None).unwrap();
        pomo.start(at(0)).unwrap();
        let events = pomo.skip(&settings, at(1400)).unwrap();
        assert!(matches!(events[0], Event::PhaseChanged { skipped: true, .. }));
        assert_eq!(pomo.phase(), Phase::ShortBreak);
        assert_eq!(pomo.cycles_completed(), 0);
        assert_eq!(user.sessions, 0);

        pomo.skip(&settings, at(1410)).unwrap();
        assert_eq!(pomo.phase(), Phase::Focus);
        assert_eq!(pomo.label(), "Focus Session 1 of 4");
    }

    #[test]
    fn skip_requires_active_cycle() {
        let settings = Settings::default();
        let mut pomo = PomodoroController::new(&settings, None).unwrap();
        assert!(pomo.skip(&settings, at(0)).is_err());
    }

    #[test]
    fn disabled_auto_start_waits_for_resume() {
        let settings = Settings {
            auto_start_breaks: false,
            ..Settings::default()
        };
        let mut user = UserProfile::new(t0());
        let mut pomo = PomodoroController::new(&settings, None).unwrap();
        pomo.start(at(0)).unwrap();
        pomo.tick(&mut user, &settings, at(1500));
        assert_eq!(pomo.phase(), Phase::ShortBreak);
        assert_eq!(pomo.engine().state(), TimerState::Paused);

        // Waiting does not eat into the break.
        let (tick, _) = pomo.tick(&mut user, &settings, at(5000));
        assert_eq!(tick, Tick::Remaining(300));
        pomo.resume(at(5000)).unwrap();
        let (tick, _) = pomo.tick(&mut user, &settings, at(5100));
        assert_eq!(tick, Tick::Remaining(200));
    }

    #[test]
    fn stop_credits_focus_elapsed_only() {
        let settings = Settings::default();
        let mut user = UserProfile::new(t0());
        let mut pomo = PomodoroController::new(&settings, None).unwrap();
        pomo.start(at(0)).unwrap();
        let events = pomo.stop(&mut user, at(600)).unwrap();
        assert!(matches!(events[0], Event::TimerStopped { credited: true, .. }));
        assert_eq!(user.total_seconds, 600);
        assert_eq!(user.xp, 100);
    }

    #[test]
    fn stop_during_break_is_never_credited() {
        let settings = Settings::default();
        let mut user = UserProfile::new(t0());
        let mut pomo = PomodoroController::new(&settings, None).unwrap();
        pomo.start(at(0)).unwrap();
        pomo.skip(&settings, at(10)).unwrap();
        let events = pomo.stop(&mut user, at(250)).unwrap();
        assert!(matches!(events[0], Event::TimerStopped { credited: false, .. }));
        assert_eq!(user.sessions, 0);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = Settings {
            pomodoro_cycles: 0,
            ..Settings::default()
        };
        assert!(PomodoroController::new(&settings, None).is_err());
    }

    #[test]
    fn overrides_replace_only_what_they_name() {
        let stored = Settings {
            long_break: 20,
            auto_start_breaks: false,
            ..Settings::default()
        };
        let overrides = PhaseOverrides {
            focus: Some(50),
            cycles: Some(2),
            ..PhaseOverrides::default()
        };
        let merged = overrides.apply(&stored);
        assert_eq!(merged.focus_duration, 50);
        assert_eq!(merged.pomodoro_cycles, 2);
        assert_eq!(merged.short_break, 5);
        assert_eq!(merged.long_break, 20);
        assert!(!merged.auto_start_breaks);
    }
}
