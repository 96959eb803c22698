//! Habit tracking.
//!
//! A habit stores the set of calendar days it was done on. The streak is
//! derived from that set, never stored.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::progress;
use crate::storage::UserProfile;
use crate::task::{new_id, non_blank};

/// XP granted the first time a habit is checked off for a given day.
pub const HABIT_XP: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    pub created: NaiveDateTime,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique by construction; serialized as a sorted array of ISO dates.
    #[serde(default)]
    pub completions: BTreeSet<NaiveDate>,
}

fn default_active() -> bool {
    true
}

impl Habit {
    /// Consecutive days ending today. A habit not done today has streak 0.
    pub fn streak(&self, today: NaiveDate) -> u32 {
        let mut expected = today;
        let mut streak = 0;
        for day in self.completions.iter().rev() {
            if *day > today {
                continue;
            }
            if *day != expected {
                break;
            }
            streak += 1;
            expected -= Duration::days(1);
        }
        streak
    }

    pub fn is_done_on(&self, day: NaiveDate) -> bool {
        self.completions.contains(&day)
    }
}

/// Outcome of checking or unchecking a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitToggle {
    pub changed: bool,
    pub xp_awarded: u64,
    pub level_ups: Vec<u32>,
}

fn validated_name(name: &str) -> Result<String, ValidationError> {
    non_blank(Some(name)).ok_or(ValidationError::EmptyName("Habit"))
}

fn find_mut<'a>(habits: &'a mut [Habit], id: &str) -> Result<&'a mut Habit> {
    habits
        .iter_mut()
        .find(|h| h.id == id)
        .ok_or_else(|| CoreError::not_found("habit", id))
}

pub fn find<'a>(habits: &'a [Habit], id: &str) -> Result<&'a Habit> {
    habits
        .iter()
        .find(|h| h.id == id)
        .ok_or_else(|| CoreError::not_found("habit", id))
}

pub fn add(
    habits: &mut Vec<Habit>,
    name: &str,
    description: Option<&str>,
    now: NaiveDateTime,
) -> Result<Habit> {
    let habit = Habit {
        id: new_id(),
        name: validated_name(name)?,
        created: now,
        active: true,
        description: non_blank(description),
        completions: BTreeSet::new(),
    };
    tracing::debug!(id = %habit.id, name = %habit.name, "habit added");
    habits.push(habit.clone());
    Ok(habit)
}

pub fn edit(habits: &mut [Habit], id: &str, name: &str, description: Option<&str>) -> Result<()> {
    let name = validated_name(name)?;
    let habit = find_mut(habits, id)?;
    habit.name = name;
    habit.description = non_blank(description);
    Ok(())
}

/// Flip the active flag. Returns the new value.
pub fn toggle_active(habits: &mut [Habit], id: &str) -> Result<bool> {
    let habit = find_mut(habits, id)?;
    habit.active = !habit.active;
    Ok(habit.active)
}

pub fn delete(habits: &mut Vec<Habit>, id: &str) -> Result<Habit> {
    let idx = habits
        .iter()
        .position(|h| h.id == id)
        .ok_or_else(|| CoreError::not_found("habit", id))?;
    Ok(habits.remove(idx))
}

/// Check or uncheck a habit for `day`.
///
/// Checking a day that is not yet recorded awards [`HABIT_XP`]. Unchecking
/// removes the day and keeps any XP already granted.
pub fn set_completed(
    user: &mut UserProfile,
    id: &str,
    day: NaiveDate,
    completed: bool,
) -> Result<HabitToggle> {
    let habit = find_mut(&mut user.habits, id)?;
    let changed = if completed {
        habit.completions.insert(day)
    } else {
        habit.completions.remove(&day)
    };

    if !(completed && changed) {
        return Ok(HabitToggle {
            changed,
            xp_awarded: 0,
            level_ups: Vec::new(),
        });
    }
    let level_ups = progress::award_xp(user, HABIT_XP);
    Ok(HabitToggle {
        changed,
        xp_awarded: HABIT_XP,
        level_ups,
    })
}

/// Total completions across all habits whose date is in `[from, to]`.
pub fn completions_between(habits: &[Habit], from: Option<NaiveDate>, to: Option<NaiveDate>) -> usize {
    habits
        .iter()
        .flat_map(|h| h.completions.iter())
        .filter(|d| from.map_or(true, |f| **d >= f) && to.map_or(true, |t| **d <= t))
        .count()
}
