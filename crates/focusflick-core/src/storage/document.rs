//! The persisted document: one `user` section and one `settings` section.
//!
//! Loading never trusts the shape of the file. The raw JSON is deep-merged
//! over the defaults, tasks and habits are parsed one by one (bad records are
//! dropped), and the result is repaired so the profile invariants hold.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Settings;
use crate::error::StorageError;
use crate::habit::Habit;
use crate::progress::{self, SessionRecord};
use crate::task::{new_id, Task};

const DEFAULT_NAME: &str = "Student";
const DEFAULT_DAILY_GOAL: u32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub streak: u32,
    pub total_seconds: u64,
    pub sessions: u64,
    pub last_session: Option<NaiveDateTime>,
    /// Minutes.
    pub daily_goal: u32,
    pub xp: u64,
    pub level: u32,
    pub tasks: Vec<Task>,
    pub habits: Vec<Habit>,
    /// Carried through untouched.
    pub achievements: Vec<Value>,
    pub last_reset: NaiveDateTime,
    pub history: Vec<SessionRecord>,
}

impl UserProfile {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            streak: 0,
            total_seconds: 0,
            sessions: 0,
            last_session: None,
            daily_goal: DEFAULT_DAILY_GOAL,
            xp: 0,
            level: 1,
            tasks: Vec::new(),
            habits: Vec::new(),
            achievements: Vec::new(),
            last_reset: now,
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub user: UserProfile,
    pub settings: Settings,
}

impl Document {
    /// Fresh defaults; `now` seeds `last_reset`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            user: UserProfile::new(now),
            settings: Settings::default(),
        }
    }

    /// Build a document from arbitrary JSON, filling gaps from the defaults.
    ///
    /// Fails only when the top-level shape cannot be interpreted at all.
    pub fn from_json(loaded: Value, now: NaiveDateTime) -> Result<Self, StorageError> {
        if !loaded.is_object() {
            return Err(StorageError::ParseFailed(
                "document root must be an object".into(),
            ));
        }
        let defaults = serde_json::to_value(Document::new(now))
            .map_err(|e| StorageError::ParseFailed(e.to_string()))?;
        let mut merged = deep_merge(defaults, loaded);

        let raw_tasks = take_array(&mut merged, "tasks");
        let raw_habits = take_array(&mut merged, "habits");

        let mut doc: Document = serde_json::from_value(merged)
            .map_err(|e| StorageError::ParseFailed(e.to_string()))?;
        doc.user.tasks = parse_records(raw_tasks, "task");
        doc.user.habits = parse_records(raw_habits, "habit");
        doc.repair();
        Ok(doc)
    }

    /// Restore invariants that a hand-edited or older file may violate.
    fn repair(&mut self) {
        let user = &mut self.user;
        if user.name.trim().is_empty() {
            tracing::warn!("empty user name, using default");
            user.name = DEFAULT_NAME.into();
        }
        if user.daily_goal == 0 {
            tracing::warn!("non-positive daily goal, using default");
            user.daily_goal = DEFAULT_DAILY_GOAL;
        }
        if user.level == 0 || user.xp >= progress::xp_needed(user.level) {
            tracing::warn!(level = user.level, xp = user.xp, "normalizing level");
            progress::award_xp(user, 0);
        }

        user.tasks.retain(|t| {
            let keep = !t.name.trim().is_empty();
            if !keep {
                tracing::warn!(id = %t.id, "dropping task with empty name");
            }
            keep
        });
        user.habits.retain(|h| {
            let keep = !h.name.trim().is_empty();
            if !keep {
                tracing::warn!(id = %h.id, "dropping habit with empty name");
            }
            keep
        });
        dedupe_ids(user.tasks.iter_mut().map(|t| &mut t.id));
        dedupe_ids(user.habits.iter_mut().map(|h| &mut h.id));

        for field in self.settings.repair() {
            tracing::warn!(field, "non-positive setting, using default");
        }
    }
}

/// Merge `loaded` over `defaults`. Objects merge key by key; any other
/// loaded value replaces the default, except `null`, which keeps it.
pub fn deep_merge(defaults: Value, loaded: Value) -> Value {
    match (defaults, loaded) {
        (Value::Object(mut base), Value::Object(over)) => {
            for (key, value) in over {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, over) => over,
    }
}

fn take_array(doc: &mut Value, key: &str) -> Vec<Value> {
    let Some(user) = doc.get_mut("user").and_then(Value::as_object_mut) else {
        return Vec::new();
    };
    match user.insert(key.to_string(), Value::Array(Vec::new())) {
        Some(Value::Array(items)) => items,
        Some(other) if !other.is_null() => {
            tracing::warn!(key, "expected an array, ignoring");
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn parse_records<T: serde::de::DeserializeOwned>(raw: Vec<Value>, kind: &str) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(kind, idx, error = %e, "dropping malformed record");
                None
            }
        })
        .collect()
}

fn dedupe_ids<'a>(ids: impl Iterator<Item = &'a mut String>) {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            *id = new_id();
            seen.insert(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn deep_merge_keeps_defaults_for_missing_keys() {
        let merged = deep_merge(
            json!({"a": 1, "nested": {"x": true, "y": 2}}),
            json!({"nested": {"y": 5}, "extra": "kept"}),
        );
        assert_eq!(merged, json!({"a": 1, "nested": {"x": true, "y": 5}, "extra": "kept"}));
    }

    #[test]
    fn deep_merge_null_keeps_default() {
        let merged = deep_merge(json!({"a": 1}), json!({"a": null}));
        assert_eq!(merged, json!({"a": 1}));
    }

    #[test]
    fn partial_document_is_filled_from_defaults() {
        let doc = Document::from_json(
            json!({"user": {"name": "Ada", "xp": 40}, "settings": {"long_break": 30}}),
            now(),
        )
        .unwrap();
        assert_eq!(doc.user.name, "Ada");
        assert_eq!(doc.user.xp, 40);
        assert_eq!(doc.user.level, 1);
        assert_eq!(doc.user.daily_goal, 120);
        assert_eq!(doc.user.last_reset, now());
        assert_eq!(doc.settings.long_break, 30);
        assert_eq!(doc.settings.focus_duration, 25);
    }

    #[test]
    fn legacy_document_loads() {
        let legacy = json!({
            "user": {
                "name": "Student",
                "streak": 2,
                "total_seconds": 3000,
                "sessions": 2,
                "last_session": "2024-05-05T18:00:00.000001",
                "daily_goal": 120,
                "xp": 500,
                "level": 1,
                "tasks": [
                    {"name": "Essay", "priority": 2, "created": "2024-05-01T10:00:00", "completed": false,
                     "notes": [{"date": "2024-05-02T10:00:00", "content": "outline"}]}
                ],
                "habits": [
                    {"name": "Run", "created": "2024-05-01T10:00:00", "active": true,
                     "completions": ["2024-05-05"]}
                ],
                "achievements": [],
                "last_reset": "2024-05-05T08:00:00"
            },
            "settings": {"theme": "system", "sounds": false}
        });
        let doc = Document::from_json(legacy, now()).unwrap();
        assert_eq!(doc.user.tasks.len(), 1);
        assert_eq!(doc.user.tasks[0].notes[0].content, "outline");
        assert_eq!(doc.user.habits.len(), 1);
        assert!(doc.user.history.is_empty());
        assert!(!doc.settings.sounds);
    }

    #[test]
    fn malformed_records_are_dropped_not_fatal() {
        let doc = Document::from_json(
            json!({"user": {"tasks": [
                {"name": "ok", "priority": 1, "created": "2024-05-01T10:00:00"},
                {"name": "bad priority", "priority": 9, "created": "2024-05-01T10:00:00"},
                {"name": "   ", "created": "2024-05-01T10:00:00"},
                "not even an object"
            ]}}),
            now(),
        )
        .unwrap();
        assert_eq!(doc.user.tasks.len(), 1);
        assert_eq!(doc.user.tasks[0].name, "ok");
    }

    #[test]
    fn repair_restores_invariants() {
        let doc = Document::from_json(
            json!({
                "user": {"level": 0, "xp": 2500, "daily_goal": 0, "name": ""},
                "settings": {"pomodoro_cycles": 0}
            }),
            now(),
        )
        .unwrap();
        assert_eq!(doc.user.level, 2);
        assert_eq!(doc.user.xp, 1500);
        assert!(doc.user.xp < progress::xp_needed(doc.user.level));
        assert_eq!(doc.user.daily_goal, 120);
        assert_eq!(doc.user.name, "Student");
        assert_eq!(doc.settings.pomodoro_cycles, 4);
    }

    #[test]
    fn duplicate_ids_are_regenerated() {
        let doc = Document::from_json(
            json!({"user": {"tasks": [
                {"id": "same", "name": "a", "created": "2024-05-01T10:00:00"},
                {"id": "same", "name": "b", "created": "2024-05-01T10:00:00"}
            ]}}),
            now(),
        )
        .unwrap();
        assert_ne!(doc.user.tasks[0].id, doc.user.tasks[1].id);
        assert_eq!(doc.user.tasks[0].id, "same");
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(Document::from_json(json!([1, 2, 3]), now()).is_err());
    }
}
