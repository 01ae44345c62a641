//! Usage policy types: per-recipe caps, windows, cooldowns and allow-lists.
//!
//! A recipe without a policy row is `Unrestricted`. Once any configuration
//! action touches it, a row exists and the recipe is `Restricted`. Caps use
//! `None` for "unlimited"; `Some(0)` disables the recipe outright.

use serde::{Deserialize, Serialize};

use crate::Principal;

/// Per-recipe restrictions, editable by the namespace authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePolicy {
    /// Global cap on invocations.
    pub max_uses: Option<u32>,
    /// Cap on invocations by a single caller.
    pub max_uses_per_caller: Option<u32>,
    /// Minimum seconds between two invocations by the same caller.
    pub cooldown_secs: Option<u32>,
    /// Unix seconds before which the recipe cannot be used.
    pub window_start: Option<i64>,
    /// Unix seconds after which the recipe cannot be used.
    pub window_end: Option<i64>,
    /// Principals allowed when `allow_list_enforced` is set. Editing the list
    /// does not change enforcement and vice versa.
    pub allow_list: Vec<Principal>,
    pub allow_list_enforced: bool,
}

impl UsagePolicy {
    /// Whether per-caller usage rows are maintained for this policy.
    #[must_use]
    pub fn tracks_callers(&self) -> bool {
        self.cooldown_secs.is_some()
    }
}

/// Whether a recipe has a policy row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState<'a> {
    Unrestricted,
    Restricted(&'a UsagePolicy),
}

impl PolicyState<'_> {
    /// Whether a policy row exists.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Restricted(_))
    }
}

/// Global counters for a recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_uses: u32,
}

/// Per-(recipe, caller) counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerUsage {
    pub uses: u32,
    /// Unix seconds of the last invocation.
    pub last_used: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_unlimited() {
        let p = UsagePolicy::default();
        assert_eq!(p.max_uses, None);
        assert_eq!(p.max_uses_per_caller, None);
        assert!(!p.allow_list_enforced);
        assert!(!p.tracks_callers());
    }

    #[test]
    fn cooldown_enables_caller_tracking() {
        let p = UsagePolicy {
            cooldown_secs: Some(60),
            ..UsagePolicy::default()
        };
        assert!(p.tracks_callers());
    }

    #[test]
    fn policy_state_restricted() {
        let p = UsagePolicy::default();
        assert!(PolicyState::Restricted(&p).is_restricted());
        assert!(!PolicyState::Unrestricted.is_restricted());
    }

    #[test]
    fn serde_roundtrip() {
        let p = UsagePolicy {
            max_uses: Some(10),
            window_start: Some(1_700_000_000),
            allow_list: vec![Principal::parse("alice").unwrap()],
            allow_list_enforced: true,
            ..UsagePolicy::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: UsagePolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
