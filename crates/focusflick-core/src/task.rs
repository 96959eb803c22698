//! Task list.
//!
//! Tasks live in the `user.tasks` array of the document. The JSON shape
//! matches what earlier versions wrote (`priority` as an integer, notes as
//! `{date, content}`), with an `id` added for addressing.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result, ValidationError};
use crate::progress;
use crate::storage::UserProfile;

/// Priority of a task. Persisted as 1 (High), 2 (Medium) or 3 (Low).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    /// XP granted when a task of this priority is completed.
    pub fn xp_reward(self) -> u64 {
        u64::from(u8::from(self)) * 25
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(format!("invalid priority {other}, expected 1, 2 or 3")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub date: NaiveDateTime,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    pub created: NaiveDateTime,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// User input for creating or editing a task, before validation.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub name: String,
    pub priority: Priority,
    /// `MM/DD/YYYY` or `YYYY-MM-DD`; blank means no due date.
    pub due_date: Option<String>,
    pub description: Option<String>,
}

impl TaskDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<ValidDraft, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName("Task"));
        }
        let due_date = match self.due_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_due_date(raw)?),
            _ => None,
        };
        Ok(ValidDraft {
            name: name.to_string(),
            priority: self.priority,
            due_date,
            description: non_blank(self.description.as_deref()),
        })
    }
}

struct ValidDraft {
    name: String,
    priority: Priority,
    due_date: Option<NaiveDateTime>,
    description: Option<String>,
}

/// Outcome of toggling a task's completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskToggle {
    pub xp_awarded: u64,
    pub level_ups: Vec<u32>,
}

pub fn parse_due_date(raw: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ValidationError::InvalidDate(raw.to_string()))
}

pub(crate) fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub fn find<'a>(tasks: &'a [Task], id: &str) -> Result<&'a Task> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| CoreError::not_found("task", id))
}

fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Result<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| CoreError::not_found("task", id))
}

pub fn add(tasks: &mut Vec<Task>, draft: &TaskDraft, now: NaiveDateTime) -> Result<Task> {
    let valid = draft.validate()?;
    let task = Task {
        id: new_id(),
        name: valid.name,
        priority: valid.priority,
        created: now,
        completed: false,
        completed_date: None,
        due_date: valid.due_date,
        description: valid.description,
        notes: Vec::new(),
    };
    tracing::debug!(id = %task.id, name = %task.name, "task added");
    tasks.push(task.clone());
    Ok(task)
}

/// Replace name, priority, due date and description. Blank optional fields
/// clear the stored value. Nothing changes if validation fails.
pub fn edit(tasks: &mut [Task], id: &str, draft: &TaskDraft) -> Result<()> {
    let valid = draft.validate()?;
    let task = find_mut(tasks, id)?;
    task.name = valid.name;
    task.priority = valid.priority;
    task.due_date = valid.due_date;
    task.description = valid.description;
    Ok(())
}

/// Mark a task done or not done.
///
/// XP is awarded only on the false -> true transition, so repeating
/// `completed = true` never pays twice.
pub fn set_completed(
    user: &mut UserProfile,
    id: &str,
    completed: bool,
    now: NaiveDateTime,
) -> Result<TaskToggle> {
    let task = find_mut(&mut user.tasks, id)?;
    let was_completed = task.completed;
    task.completed = completed;

    if !completed {
        task.completed_date = None;
        return Ok(TaskToggle {
            xp_awarded: 0,
            level_ups: Vec::new(),
        });
    }
    if was_completed {
        return Ok(TaskToggle {
            xp_awarded: 0,
            level_ups: Vec::new(),
        });
    }

    task.completed_date = Some(now);
    let xp = task.priority.xp_reward();
    let level_ups = progress::award_xp(user, xp);
    Ok(TaskToggle {
        xp_awarded: xp,
        level_ups,
    })
}

pub fn delete(tasks: &mut Vec<Task>, id: &str) -> Result<Task> {
    let idx = tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| CoreError::not_found("task", id))?;
    Ok(tasks.remove(idx))
}

/// Append a dated note. Blank notes are ignored.
pub fn add_note(tasks: &mut [Task], id: &str, text: &str, now: NaiveDateTime) -> Result<bool> {
    let task = find_mut(tasks, id)?;
    let Some(content) = non_blank(Some(text)) else {
        return Ok(false);
    };
    task.notes.push(Note { date: now, content });
    Ok(true)
}

/// Tasks that can still be associated with a timer session.
pub fn open_tasks(tasks: &[Task]) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(|t| !t.completed)
}

pub fn completed_on(tasks: &[Task], day: NaiveDate) -> usize {
    tasks
        .iter()
        .filter(|t| t.completed && t.completed_date.map(|d| d.date()) == Some(day))
        .count()
}
