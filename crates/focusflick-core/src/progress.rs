//! Progress ledger: XP, levels, streaks and credited session time.
//!
//! Everything here is a plain function over [`UserProfile`]; callers decide
//! when to persist.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::storage::UserProfile;
use crate::timer::TimerMode;

/// XP needed to leave level `n` is `n * XP_PER_LEVEL`.
pub const XP_PER_LEVEL: u64 = 1000;
/// XP per whole minute of credited focus time.
pub const XP_PER_MINUTE: u64 = 10;
/// Stopped sessions shorter than this are discarded.
pub const MIN_CREDIT_SECS: u64 = 60;

/// One credited session, kept for period statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub mode: TimerMode,
    pub seconds: u64,
    pub completed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakChange {
    /// Already credited today.
    Unchanged,
    Extended,
    Reset,
}

/// Everything a credited session changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub mode: TimerMode,
    pub seconds: u64,
    pub xp: u64,
    pub level_ups: Vec<u32>,
    pub streak: u32,
    pub streak_change: StreakChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u64,
    pub xp_needed: u64,
    /// 0.0 ..= 1.0
    pub fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal_minutes: u32,
    pub focused_secs: u64,
    /// 0.0 ..= 1.0
    pub fraction: f64,
}

pub fn xp_for_seconds(secs: u64) -> u64 {
    secs / 60 * XP_PER_MINUTE
}

pub fn xp_needed(level: u32) -> u64 {
    u64::from(level.max(1)) * XP_PER_LEVEL
}

/// Add XP and level up as many times as the new total allows.
///
/// Returns every level reached, in order, so a large award that crosses
/// several thresholds reports each one.
pub fn award_xp(user: &mut UserProfile, amount: u64) -> Vec<u32> {
    user.level = user.level.max(1);
    user.xp = user.xp.saturating_add(amount);

    let mut reached = Vec::new();
    while user.xp >= xp_needed(user.level) {
        user.xp -= xp_needed(user.level);
        user.level += 1;
        reached.push(user.level);
    }
    for level in &reached {
        tracing::info!(level, "level up");
    }
    reached
}

/// Advance the daily streak for a session credited at `now`.
///
/// Same day: unchanged. No previous session or previous session yesterday:
/// extended. Anything else, including a last session dated in the future:
/// reset to 1. `last_session` is always rewritten to `now`.
pub fn update_streak(user: &mut UserProfile, now: NaiveDateTime) -> StreakChange {
    let today = now.date();
    let change = match user.last_session.map(|t| t.date()) {
        Some(last) if last == today => StreakChange::Unchanged,
        None => StreakChange::Extended,
        Some(last) if last + Duration::days(1) == today => StreakChange::Extended,
        Some(_) => StreakChange::Reset,
    };
    match change {
        StreakChange::Unchanged => {}
        StreakChange::Extended => user.streak += 1,
        StreakChange::Reset => user.streak = 1,
    }
    user.last_session = Some(now);
    change
}

/// Roll `last_reset` over to `now` on the first call of a new day.
/// Returns `true` when a reset happened.
pub fn daily_reset(user: &mut UserProfile, now: NaiveDateTime) -> bool {
    if user.last_reset.date() == now.date() {
        return false;
    }
    user.last_reset = now;
    tracing::debug!(%now, "daily reset");
    true
}

/// Credit a session of `seconds` to the profile.
pub fn credit_session(
    user: &mut UserProfile,
    mode: TimerMode,
    seconds: u64,
    now: NaiveDateTime,
) -> Credit {
    user.sessions += 1;
    user.total_seconds += seconds;
    let xp = xp_for_seconds(seconds);
    let level_ups = award_xp(user, xp);
    let streak_change = update_streak(user, now);
    user.history.push(SessionRecord {
        mode,
        seconds,
        completed_at: now,
    });
    tracing::info!(
        mode = mode.as_str(),
        seconds,
        xp,
        streak = user.streak,
        "session credited"
    );
    Credit {
        mode,
        seconds,
        xp,
        level_ups,
        streak: user.streak,
        streak_change,
    }
}

pub fn level_progress(user: &UserProfile) -> LevelProgress {
    let needed = xp_needed(user.level);
    LevelProgress {
        level: user.level,
        xp: user.xp,
        xp_needed: needed,
        fraction: (user.xp as f64 / needed as f64).min(1.0),
    }
}

/// Seconds credited on `day`, from the session history.
pub fn focused_on(user: &UserProfile, day: NaiveDate) -> u64 {
    user.history
        .iter()
        .filter(|r| r.completed_at.date() == day)
        .map(|r| r.seconds)
        .sum()
}

pub fn daily_goal_progress(user: &UserProfile, today: NaiveDate) -> GoalProgress {
    let focused_secs = focused_on(user, today);
    let goal_secs = u64::from(user.daily_goal.max(1)) * 60;
    GoalProgress {
        goal_minutes: user.daily_goal,
        focused_secs,
        fraction: (focused_secs as f64 / goal_secs as f64).min(1.0),
    }
}
