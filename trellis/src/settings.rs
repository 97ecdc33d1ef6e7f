//! Dispatcher settings and the JSON deep merge applied over defaults.

use serde::{Deserialize, Serialize};
use trellis_types::error::DispatchError;

/// When a dispatch pass actually starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchPolicy {
    /// Hold the first entry into the pass until the environment signals
    /// ready. On by default — this also waits out module registration that
    /// happens before the environment settles.
    pub await_ready: bool,
    /// Queue delay in milliseconds. `None` runs the pass synchronously;
    /// `Some(0)` still defers it past the current unit of work.
    pub queue: Option<u64>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            await_ready: true,
            queue: None,
        }
    }
}

/// How presence identifiers are rewritten before the oracle is asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresencePolicy {
    /// Prepended to every tested identifier.
    pub prepend: String,
    /// Appended to every tested identifier.
    pub append: String,
}

impl Default for PresencePolicy {
    fn default() -> Self {
        Self {
            prepend: "#module-".to_owned(),
            append: String::new(),
        }
    }
}

/// All dispatcher settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scheduling of the pass entry.
    pub dispatch: DispatchPolicy,
    /// Identifier rewriting for presence checks.
    pub presence: PresencePolicy,
}

impl Settings {
    /// Build settings by deep-merging a JSON patch over the defaults.
    ///
    /// Object-valued keys merge recursively, scalar keys overwrite:
    /// `{"dispatch": {"queue": 250}}` changes the queue delay and leaves
    /// every other field at its default.
    pub fn with_patch(patch: serde_json::Value) -> Result<Self, DispatchError> {
        let mut base = serde_json::to_value(Self::default())
            .map_err(|e| DispatchError::InvalidSettings(e.to_string()))?;
        deep_merge(&mut base, patch);
        serde_json::from_value(base).map_err(|e| DispatchError::InvalidSettings(e.to_string()))
    }
}

/// Deep-merge `patch` into `base`: objects merge key-wise, everything else
/// overwrites.
pub fn deep_merge(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_the_documented_policy() {
        let settings = Settings::default();
        assert!(settings.dispatch.await_ready);
        assert_eq!(settings.dispatch.queue, None);
        assert_eq!(settings.presence.prepend, "#module-");
        assert_eq!(settings.presence.append, "");
    }

    #[test]
    fn patch_overrides_one_leaf_and_keeps_siblings() {
        let settings = Settings::with_patch(json!({"dispatch": {"queue": 250}})).unwrap();
        assert_eq!(settings.dispatch.queue, Some(250));
        assert!(settings.dispatch.await_ready);
        assert_eq!(settings.presence.prepend, "#module-");
    }

    #[test]
    fn patch_can_touch_both_sections() {
        let settings = Settings::with_patch(json!({
            "dispatch": {"await_ready": false},
            "presence": {"prepend": ".mod-", "append": "[data-live]"},
        }))
        .unwrap();
        assert!(!settings.dispatch.await_ready);
        assert_eq!(settings.presence.prepend, ".mod-");
        assert_eq!(settings.presence.append, "[data-live]");
    }

    #[test]
    fn scalar_over_object_replaces_wholesale() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": 3});
        deep_merge(&mut base, json!({"a": 7}));
        assert_eq!(base, json!({"a": 7, "b": 3}));
    }

    #[test]
    fn malformed_patch_is_an_invalid_settings_error() {
        let err = Settings::with_patch(json!({"dispatch": {"queue": "soon"}})).unwrap_err();
        assert!(matches!(
            err,
            trellis_types::DispatchError::InvalidSettings(_)
        ));
    }
}
