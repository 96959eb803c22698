//! User-facing settings stored in the `settings` section of the document.
//!
//! Covers:
//! - Theme
//! - Sound and notification toggles
//! - Focus / break durations and the Pomodoro cycle length
//! - Auto-start behavior between Pomodoro phases

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    System,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}

/// Application settings.
///
/// Durations are whole minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub sounds: bool,
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    #[serde(default = "default_pomodoro_cycles")]
    pub pomodoro_cycles: u32,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    #[serde(default = "default_true")]
    pub auto_start_pomodoros: bool,
}

// Default functions
fn default_focus_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_pomodoro_cycles() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            sounds: true,
            focus_duration: default_focus_duration(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            pomodoro_cycles: default_pomodoro_cycles(),
            notifications: true,
            auto_start_breaks: true,
            auto_start_pomodoros: true,
        }
    }
}

impl Settings {
    /// Every key accepted by [`Settings::get`] and [`Settings::set`].
    pub const KEYS: [&'static str; 9] = [
        "theme",
        "sounds",
        "notifications",
        "focus_duration",
        "short_break",
        "long_break",
        "pomodoro_cycles",
        "auto_start_breaks",
        "auto_start_pomodoros",
    ];

    /// Get a setting by its flat key, rendered as a string.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by key, parsed according to the current value's type.
    /// On any error `self` is left untouched.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let slot = json
            .as_object_mut()
            .and_then(|fields| fields.get_mut(key))
            .ok_or_else(|| invalid("unknown settings key".into()))?;
        *slot = match &*slot {
            Value::Bool(_) => Value::Bool(
                value
                    .parse()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            Value::Number(_) => Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                    .into(),
            ),
            _ => Value::String(value.into()),
        };
        let updated: Settings = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// All durations and the cycle count must be positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("focus_duration", self.focus_duration),
            ("short_break", self.short_break),
            ("long_break", self.long_break),
            ("pomodoro_cycles", self.pomodoro_cycles),
        ] {
            if value == 0 {
                return Err(ValidationError::NotPositive(field.into()));
            }
        }
        Ok(())
    }

    /// Replace any non-positive numeric field with its default.
    /// Returns the names of the fields that were repaired.
    pub(crate) fn repair(&mut self) -> Vec<&'static str> {
        let defaults = Settings::default();
        let mut repaired = Vec::new();
        let fields: [(&'static str, &mut u32, u32); 4] = [
            ("focus_duration", &mut self.focus_duration, defaults.focus_duration),
            ("short_break", &mut self.short_break, defaults.short_break),
            ("long_break", &mut self.long_break, defaults.long_break),
            ("pomodoro_cycles", &mut self.pomodoro_cycles, defaults.pomodoro_cycles),
        ];
        for (name, value, default) in fields {
            if *value == 0 {
                *value = default;
                repaired.push(name);
            }
        }
        repaired
    }

    pub fn focus_secs(&self) -> u64 {
        u64::from(self.focus_duration) * 60
    }

    pub fn short_break_secs(&self) -> u64 {
        u64::from(self.short_break) * 60
    }

    pub fn long_break_secs(&self) -> u64 {
        u64::from(self.long_break) * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip() {
        let settings = Settings::default();
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn settings_default_values() {
        let s = Settings::default();
        assert_eq!(s.theme, Theme::Dark);
        assert!(s.sounds);
        assert!(s.notifications);
        assert_eq!(s.focus_duration, 25);
        assert_eq!(s.short_break, 5);
        assert_eq!(s.long_break, 15);
        assert_eq!(s.pomodoro_cycles, 4);
        assert!(s.auto_start_breaks);
        assert!(s.auto_start_pomodoros);
    }

    #[test]
    fn get_returns_string_for_all_types() {
        let s = Settings::default();
        assert_eq!(s.get("sounds").as_deref(), Some("true"));
        assert_eq!(s.get("focus_duration").as_deref(), Some("25"));
        assert_eq!(s.get("theme").as_deref(), Some("dark"));
        assert!(s.get("missing_key").is_none());
        assert!(s.get("").is_none());
    }

    #[test]
    fn set_updates_bool_number_and_enum() {
        let mut s = Settings::default();
        s.set("auto_start_breaks", "false").unwrap();
        s.set("long_break", "20").unwrap();
        s.set("theme", "light").unwrap();
        assert!(!s.auto_start_breaks);
        assert_eq!(s.long_break, 20);
        assert_eq!(s.theme, Theme::Light);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut s = Settings::default();
        assert!(s.set("nonexistent_key", "1").is_err());
        assert!(s.set("", "1").is_err());
    }

    #[test]
    fn keys_are_flat_and_complete() {
        let mut s = Settings::default();
        for key in Settings::KEYS {
            assert!(s.get(key).is_some(), "{key}");
        }
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json.as_object().unwrap().len(), Settings::KEYS.len());

        // Dotted paths are not settings keys.
        assert!(s.get("theme.dark").is_none());
        assert!(s.set("sounds.enabled", "true").is_err());
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn set_rejects_invalid_type_and_keeps_prior_value() {
        let mut s = Settings::default();
        assert!(s.set("sounds", "not_a_bool").is_err());
        assert!(s.set("theme", "purple").is_err());
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn set_rejects_zero_duration() {
        let mut s = Settings::default();
        let err = s.set("pomodoro_cycles", "0").unwrap_err();
        assert_eq!(err, ValidationError::NotPositive("pomodoro_cycles".into()));
        assert_eq!(s.pomodoro_cycles, 4);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"focus_duration": 50}"#).unwrap();
        assert_eq!(s.focus_duration, 50);
        assert_eq!(s.short_break, 5);
        assert!(s.sounds);
    }

    #[test]
    fn repair_resets_zero_fields() {
        let mut s = Settings {
            short_break: 0,
            pomodoro_cycles: 0,
            ..Settings::default()
        };
        assert_eq!(s.repair(), vec!["short_break", "pomodoro_cycles"]);
        assert_eq!(s, Settings::default());
    }
}
