//! The presence checker: identifier rewriting over the presence oracle.

use crate::settings::PresencePolicy;
use std::sync::Arc;
use trellis_types::presence::PresenceOracle;

/// Caller-supplied replacement for the default presence behavior.
///
/// Receives the identifiers and the `raw` flag and fully decides the
/// outcome; its return value is passed through verbatim.
pub type PresenceOverride = Box<dyn Fn(&[&str], bool) -> Option<String> + Send + Sync>;

/// Decides whether a module's identifiers are present in the environment.
///
/// Unless `raw` is requested, each identifier is rewritten by wrapping it
/// in the configured prepend/append pair before the oracle is asked.
/// Identifiers are tried in order; the first rewritten identifier the
/// oracle reports present wins.
pub struct PresenceChecker {
    policy: PresencePolicy,
    oracle: Arc<dyn PresenceOracle>,
    override_fn: Option<PresenceOverride>,
}

impl PresenceChecker {
    pub(crate) fn new(
        policy: PresencePolicy,
        oracle: Arc<dyn PresenceOracle>,
        override_fn: Option<PresenceOverride>,
    ) -> Self {
        Self {
            policy,
            oracle,
            override_fn,
        }
    }

    /// The first identifier found present, rewritten unless `raw`; `None`
    /// if none are. An override, when configured, replaces all of this.
    pub fn is_present(&self, ids: &[&str], raw: bool) -> Option<String> {
        if let Some(f) = &self.override_fn {
            return f(ids, raw);
        }
        for id in ids {
            let selector = if raw {
                (*id).to_owned()
            } else {
                format!("{}{}{}", self.policy.prepend, id, self.policy.append)
            };
            if self.oracle.exists(&selector) {
                return Some(selector);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_types::test_utils::StaticOracle;

    fn checker(present: &[&str], override_fn: Option<PresenceOverride>) -> PresenceChecker {
        PresenceChecker::new(
            PresencePolicy::default(),
            Arc::new(StaticOracle::new(present.iter().copied())),
            override_fn,
        )
    }

    #[test]
    fn identifiers_are_wrapped_before_the_oracle_is_asked() {
        let checker = checker(&["#module-cart"], None);
        assert_eq!(
            checker.is_present(&["cart"], false),
            Some("#module-cart".to_owned())
        );
        assert_eq!(checker.is_present(&["checkout"], false), None);
    }

    #[test]
    fn raw_skips_the_rewrite() {
        let checker = checker(&["cart"], None);
        assert_eq!(checker.is_present(&["cart"], true), Some("cart".to_owned()));
        assert_eq!(checker.is_present(&["cart"], false), None);
    }

    #[test]
    fn first_present_identifier_wins() {
        let checker = checker(&["#module-b", "#module-c"], None);
        assert_eq!(
            checker.is_present(&["a", "b", "c"], false),
            Some("#module-b".to_owned())
        );
    }

    #[test]
    fn append_is_applied_too() {
        let checker = PresenceChecker::new(
            PresencePolicy {
                prepend: ".mod-".to_owned(),
                append: "[data-live]".to_owned(),
            },
            Arc::new(StaticOracle::new([".mod-cart[data-live]"])),
            None,
        );
        assert_eq!(
            checker.is_present(&["cart"], false),
            Some(".mod-cart[data-live]".to_owned())
        );
    }

    #[test]
    fn override_replaces_everything() {
        let checker = checker(
            &["#module-cart"],
            Some(Box::new(|ids, raw| {
                assert!(!raw);
                Some(format!("override:{}", ids.join(",")))
            })),
        );
        // The oracle would have said yes to "cart", but the override decides.
        assert_eq!(
            checker.is_present(&["cart", "checkout"], false),
            Some("override:cart,checkout".to_owned())
        );
    }
}
