//! Period statistics over the session history and the ledger.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::habit;
use crate::storage::UserProfile;
use crate::timer::TimerMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    /// Monday through `today`.
    ThisWeek,
    ThisMonth,
    AllTime,
}

impl Period {
    /// Inclusive date bounds; `None` is unbounded.
    pub fn range(self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            Period::Today => (Some(today), Some(today)),
            Period::ThisWeek => {
                let back = i64::from(today.weekday().num_days_from_monday());
                (Some(today - Duration::days(back)), Some(today))
            }
            Period::ThisMonth => (Some(today.with_day(1).unwrap_or(today)), Some(today)),
            Period::AllTime => (None, None),
        }
    }

    pub fn contains(self, today: NaiveDate, day: NaiveDate) -> bool {
        let (from, to) = self.range(today);
        from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Today => "Today",
            Period::ThisWeek => "This Week",
            Period::ThisMonth => "This Month",
            Period::AllTime => "All Time",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitStreak {
    pub id: String,
    pub name: String,
    pub streak: u32,
    pub done_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub period: Period,
    pub focus_secs: u64,
    pub sessions: u64,
    /// Credited sessions per timer mode.
    pub by_mode: BTreeMap<String, u64>,
    pub tasks_completed: usize,
    pub habit_completions: usize,
    /// Credited seconds per calendar day, oldest first.
    pub daily_focus: BTreeMap<NaiveDate, u64>,
    pub habit_streaks: Vec<HabitStreak>,
}

impl Summary {
    pub fn focus_minutes(&self) -> u64 {
        self.focus_secs / 60
    }
}

/// Summarize `user` over `period`, relative to `today`.
///
/// All-time focus and session totals come from the aggregate counters,
/// which predate the per-session history in older documents.
pub fn summarize(user: &UserProfile, period: Period, today: NaiveDate) -> Summary {
    let records: Vec<_> = user
        .history
        .iter()
        .filter(|r| period.contains(today, r.completed_at.date()))
        .collect();

    let mut daily_focus = BTreeMap::new();
    let mut by_mode = BTreeMap::new();
    for record in &records {
        *daily_focus.entry(record.completed_at.date()).or_insert(0) += record.seconds;
        *by_mode.entry(record.mode.as_str().to_string()).or_insert(0) += 1;
    }

    let (focus_secs, sessions) = match period {
        Period::AllTime => (user.total_seconds, user.sessions),
        _ => (
            records.iter().map(|r| r.seconds).sum(),
            records.len() as u64,
        ),
    };

    let tasks_completed = user
        .tasks
        .iter()
        .filter(|t| t.completed)
        .filter(|t| match (period, t.completed_date) {
            (Period::AllTime, _) => true,
            (_, Some(done)) => period.contains(today, done.date()),
            (_, None) => false,
        })
        .count();

    let (from, to) = period.range(today);
    let habit_completions = habit::completions_between(&user.habits, from, to);

    let habit_streaks = user
        .habits
        .iter()
        .filter(|h| h.active)
        .map(|h| HabitStreak {
            id: h.id.clone(),
            name: h.name.clone(),
            streak: h.streak(today),
            done_today: h.is_done_on(today),
        })
        .collect();

    Summary {
        period,
        focus_secs,
        sessions,
        by_mode,
        tasks_completed,
        habit_completions,
        daily_focus,
        habit_streaks,
    }
}

/// Sessions credited in `mode` across the whole history.
pub fn sessions_in_mode(user: &UserProfile, mode: TimerMode) -> usize {
    user.history.iter().filter(|r| r.mode == mode).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress;
    use crate::task::{self, TaskDraft};
    use chrono::NaiveDateTime;

    // 2024-05-08 is a Wednesday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 8).unwrap()
    }

    fn on(day: NaiveDate, hour: u32) -> NaiveDateTime {
        day.and_hms_opt(hour, 0, 0).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    #[test]
    fn week_starts_on_monday() {
        let (from, to) = Period::ThisWeek.range(today());
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 5, 6));
        assert_eq!(to, Some(today()));

        let monday = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(Period::ThisWeek.range(monday).0, Some(monday));
    }

    #[test]
    fn month_starts_on_first() {
        let (from, _) = Period::ThisMonth.range(today());
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(Period::AllTime.range(today()), (None, None));
    }

    #[test]
    fn periods_filter_history() {
        let mut user = UserProfile::new(on(days_ago(40), 9));
        for (day, secs) in [(days_ago(40), 600), (days_ago(5), 1200), (days_ago(1), 300), (today(), 1500)] {
            progress::credit_session(&mut user, TimerMode::Focus, secs, on(day, 10));
        }
        progress::credit_session(&mut user, TimerMode::Stopwatch, 120, on(today(), 15));

        let day = summarize(&user, Period::Today, today());
        assert_eq!(day.focus_secs, 1620);
        assert_eq!(day.sessions, 2);
        assert_eq!(day.by_mode["stopwatch"], 1);

        let week = summarize(&user, Period::ThisWeek, today());
        assert_eq!(week.focus_secs, 1920);
        assert_eq!(week.daily_focus.len(), 2);

        let month = summarize(&user, Period::ThisMonth, today());
        assert_eq!(month.sessions, 4);
        assert_eq!(month.focus_secs, 1200 + 300 + 1500 + 120);

        let all = summarize(&user, Period::AllTime, today());
        assert_eq!(all.sessions, 5);
        assert_eq!(all.focus_secs, 600 + 1200 + 300 + 1500 + 120);
    }

    #[test]
    fn all_time_uses_counters_without_history() {
        let mut user = UserProfile::new(on(today(), 9));
        user.sessions = 12;
        user.total_seconds = 18_000;
        let all = summarize(&user, Period::AllTime, today());
        assert_eq!((all.sessions, all.focus_secs), (12, 18_000));
        assert_eq!(summarize(&user, Period::Today, today()).sessions, 0);
    }

    #[test]
    fn counts_tasks_and_habits_in_period() {
        let mut user = UserProfile::new(on(days_ago(10), 9));
        let old = task::add(&mut user.tasks, &TaskDraft::named("old"), on(days_ago(10), 9)).unwrap();
        let new = task::add(&mut user.tasks, &TaskDraft::named("new"), on(today(), 9)).unwrap();
        task::set_completed(&mut user, &old.id, true, on(days_ago(9), 9)).unwrap();
        task::set_completed(&mut user, &new.id, true, on(today(), 11)).unwrap();

        let h = habit::add(&mut user.habits, "Read", None, on(days_ago(10), 9)).unwrap();
        for n in [0, 1, 2, 9] {
            habit::set_completed(&mut user, &h.id, days_ago(n), true).unwrap();
        }

        let day = summarize(&user, Period::Today, today());
        assert_eq!(day.tasks_completed, 1);
        assert_eq!(day.habit_completions, 1);
        assert_eq!(day.habit_streaks[0].streak, 3);
        assert!(day.habit_streaks[0].done_today);

        let all = summarize(&user, Period::AllTime, today());
        assert_eq!(all.tasks_completed, 2);
        assert_eq!(all.habit_completions, 4);
    }

    #[test]
    fn inactive_habits_have_no_streak_entry() {
        let mut user = UserProfile::new(on(today(), 9));
        let h = habit::add(&mut user.habits, "Run", None, on(today(), 9)).unwrap();
        habit::toggle_active(&mut user.habits, &h.id).unwrap();
        assert!(summarize(&user, Period::Today, today()).habit_streaks.is_empty());
    }
}
