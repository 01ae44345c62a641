//! Usage policy engine: hard gate for recipe invocations.
//!
//! Every invocation of a restricted recipe passes through [`PolicyEngine::check`]
//! before the matcher runs. Checks run in a fixed order and the first
//! failure rejects the call:
//!
//! 1. time window: `now >= start` and `now <= end` for the bounds that are set
//! 2. allow-list, when enforcement is on
//! 3. global cap: `total_uses < max_uses`
//! 4. per-caller cap and cooldown
//!
//! Usage is recorded separately with [`PolicyEngine::record_use`] once the
//! whole invocation has validated. Per-caller rows are only written when a
//! cooldown is configured.

use std::collections::HashMap;

use openblend_types::{
    BlendError, CallerUsage, Namespace, PolicyState, Principal, RecipeId, Result, UsagePolicy,
    UsageStats,
};

type RecipeKey = (Namespace, RecipeId);

/// Policies, counters and per-caller usage for every recipe.
#[derive(Debug, Default)]
pub struct PolicyEngine {
    policies: HashMap<RecipeKey, UsagePolicy>,
    stats: HashMap<RecipeKey, UsageStats>,
    callers: HashMap<(Namespace, RecipeId, Principal), CallerUsage>,
}

impl PolicyEngine {
    /// An engine with no policies: every recipe is unrestricted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(namespace: &Namespace, recipe: RecipeId) -> RecipeKey {
        (namespace.clone(), recipe)
    }

    /// Whether the recipe has a policy row.
    #[must_use]
    pub fn state(&self, namespace: &Namespace, recipe: RecipeId) -> PolicyState<'_> {
        self.policies
            .get(&Self::key(namespace, recipe))
            .map_or(PolicyState::Unrestricted, PolicyState::Restricted)
    }

    /// Usage counters of a recipe. Zero if it was never used.
    #[must_use]
    pub fn stats(&self, namespace: &Namespace, recipe: RecipeId) -> UsageStats {
        self.stats
            .get(&Self::key(namespace, recipe))
            .copied()
            .unwrap_or_default()
    }

    /// Per-caller counters, present only once a use was recorded under a cooldown.
    #[must_use]
    pub fn caller_usage(
        &self,
        namespace: &Namespace,
        recipe: RecipeId,
        caller: &Principal,
    ) -> Option<CallerUsage> {
        self.callers
            .get(&(namespace.clone(), recipe, caller.clone()))
            .copied()
    }

    // -----------------------------------------------------------------------
    // Gate
    // -----------------------------------------------------------------------

    /// Validate an invocation against the recipe's policy. Read-only.
    ///
    /// # Errors
    /// [`BlendError::PolicyViolation`] naming the first failing check.
    pub fn check(
        &self,
        namespace: &Namespace,
        recipe: RecipeId,
        caller: &Principal,
        now: i64,
    ) -> Result<()> {
        let PolicyState::Restricted(policy) = self.state(namespace, recipe) else {
            return Ok(());
        };

        // 1. Window
        if let Some(start) = policy.window_start {
            if now < start {
                return Err(BlendError::policy(format!(
                    "{recipe} opens at {start}, now {now}"
                )));
            }
        }
        if let Some(end) = policy.window_end {
            if now > end {
                return Err(BlendError::policy(format!("{recipe} closed at {end}")));
            }
        }

        // 2. Allow-list
        if policy.allow_list_enforced && !policy.allow_list.contains(caller) {
            return Err(BlendError::policy(format!(
                "{caller} is not on the allow-list of {recipe}"
            )));
        }

        // 3. Global cap
        if let Some(max) = policy.max_uses {
            let total = self.stats(namespace, recipe).total_uses;
            if total >= max {
                return Err(BlendError::policy(format!(
                    "{recipe} reached its use cap ({total}/{max})"
                )));
            }
        }

        // 4. Per-caller cap and cooldown
        let usage = self
            .caller_usage(namespace, recipe, caller)
            .unwrap_or_default();
        if let Some(max) = policy.max_uses_per_caller {
            if usage.uses >= max {
                return Err(BlendError::policy(format!(
                    "{caller} reached the per-caller cap of {recipe} ({}/{max})",
                    usage.uses
                )));
            }
        }
        if let Some(cooldown) = policy.cooldown_secs {
            if usage.uses > 0 {
                let elapsed = now.saturating_sub(usage.last_used);
                if elapsed < i64::from(cooldown) {
                    return Err(BlendError::policy(format!(
                        "{caller} must wait {}s more before using {recipe} again",
                        i64::from(cooldown) - elapsed
                    )));
                }
            }
        }

        tracing::debug!(recipe = %recipe, caller = %caller, "Policy checks passed");
        Ok(())
    }

    /// Count a successful invocation.
    pub fn record_use(
        &mut self,
        namespace: &Namespace,
        recipe: RecipeId,
        caller: &Principal,
        now: i64,
    ) {
        let key = Self::key(namespace, recipe);
        let stats = self.stats.entry(key.clone()).or_default();
        stats.total_uses = stats.total_uses.saturating_add(1);

        let tracks_callers = self
            .policies
            .get(&key)
            .is_some_and(UsagePolicy::tracks_callers);
        if tracks_callers {
            let usage = self
                .callers
                .entry((namespace.clone(), recipe, caller.clone()))
                .or_default();
            usage.uses = usage.uses.saturating_add(1);
            usage.last_used = now;
        }
    }

    // -----------------------------------------------------------------------
    // Configuration (upserts)
    // -----------------------------------------------------------------------

    fn policy_mut(&mut self, namespace: &Namespace, recipe: RecipeId) -> &mut UsagePolicy {
        self.policies
            .entry(Self::key(namespace, recipe))
            .or_default()
    }

    /// Set the time window. `None` clears a bound.
    ///
    /// # Errors
    /// `PolicyViolation` if both bounds are set and `end <= start`.
    pub fn set_window(
        &mut self,
        namespace: &Namespace,
        recipe: RecipeId,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<()> {
        if let (Some(s), Some(e)) = (start, end) {
            if e <= s {
                return Err(BlendError::policy(format!(
                    "window end {e} must be after start {s}"
                )));
            }
        }
        let policy = self.policy_mut(namespace, recipe);
        policy.window_start = start;
        policy.window_end = end;
        tracing::info!(recipe = %recipe, ?start, ?end, "Policy window set");
        Ok(())
    }

    /// Set global cap, per-caller cap and cooldown. `None` clears each.
    pub fn set_caps(
        &mut self,
        namespace: &Namespace,
        recipe: RecipeId,
        max_uses: Option<u32>,
        max_uses_per_caller: Option<u32>,
        cooldown_secs: Option<u32>,
    ) {
        let policy = self.policy_mut(namespace, recipe);
        policy.max_uses = max_uses;
        policy.max_uses_per_caller = max_uses_per_caller;
        policy.cooldown_secs = cooldown_secs;
        tracing::info!(
            recipe = %recipe,
            ?max_uses,
            ?max_uses_per_caller,
            ?cooldown_secs,
            "Policy caps set"
        );
    }

    /// Replace the allow-list. Enforcement is left as is.
    pub fn set_allow_list(
        &mut self,
        namespace: &Namespace,
        recipe: RecipeId,
        list: Vec<Principal>,
    ) {
        let policy = self.policy_mut(namespace, recipe);
        policy.allow_list = list;
        tracing::info!(recipe = %recipe, entries = policy.allow_list.len(), "Allow-list set");
    }

    /// Turn allow-list enforcement on or off.
    pub fn toggle_allow_list(&mut self, namespace: &Namespace, recipe: RecipeId, enforced: bool) {
        self.policy_mut(namespace, recipe).allow_list_enforced = enforced;
        tracing::info!(recipe = %recipe, enforced, "Allow-list enforcement toggled");
    }

    /// Delete the policy row. Counters are kept.
    ///
    /// # Errors
    /// `NotFound` if the recipe has no policy.
    pub fn remove_policy(&mut self, namespace: &Namespace, recipe: RecipeId) -> Result<()> {
        self.policies
            .remove(&Self::key(namespace, recipe))
            .map(|_| ())
            .ok_or_else(|| BlendError::not_found(format!("policy for {recipe}")))
    }

    /// Drop policy, counters and caller rows of a removed recipe. Absent rows
    /// are fine.
    pub fn purge_recipe(&mut self, namespace: &Namespace, recipe: RecipeId) {
        let key = Self::key(namespace, recipe);
        self.policies.remove(&key);
        self.stats.remove(&key);
        self.callers
            .retain(|(ns, id, _), _| !(ns == namespace && *id == recipe));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: RecipeId = RecipeId(100_000);

    fn ns() -> Namespace {
        Namespace::parse("gamecol").unwrap()
    }

    fn alice() -> Principal {
        Principal::parse("alice").unwrap()
    }

    fn bob() -> Principal {
        Principal::parse("bob").unwrap()
    }

    fn is_violation(r: Result<()>) -> bool {
        matches!(r, Err(BlendError::PolicyViolation { .. }))
    }

    #[test]
    fn unrestricted_recipe_always_passes() {
        let engine = PolicyEngine::new();
        assert!(!engine.state(&ns(), R).is_restricted());
        engine.check(&ns(), R, &alice(), 0).unwrap();
    }

    #[test]
    fn configuration_creates_row() {
        let mut engine = PolicyEngine::new();
        engine.toggle_allow_list(&ns(), R, false);
        assert!(engine.state(&ns(), R).is_restricted());
    }

    #[test]
    fn window_bounds() {
        let mut engine = PolicyEngine::new();
        engine.set_window(&ns(), R, Some(100), Some(200)).unwrap();
        assert!(is_violation(engine.check(&ns(), R, &alice(), 99)));
        engine.check(&ns(), R, &alice(), 100).unwrap();
        engine.check(&ns(), R, &alice(), 200).unwrap();
        assert!(is_violation(engine.check(&ns(), R, &alice(), 201)));
    }

    #[test]
    fn inverted_window_rejected() {
        let mut engine = PolicyEngine::new();
        assert!(is_violation(engine.set_window(&ns(), R, Some(200), Some(100))));
        assert!(!engine.state(&ns(), R).is_restricted());
        engine.set_window(&ns(), R, None, Some(100)).unwrap();
    }

    #[test]
    fn allow_list_only_when_enforced() {
        let mut engine = PolicyEngine::new();
        engine.set_allow_list(&ns(), R, vec![alice()]);
        engine.check(&ns(), R, &bob(), 0).unwrap();
        engine.toggle_allow_list(&ns(), R, true);
        engine.check(&ns(), R, &alice(), 0).unwrap();
        assert!(is_violation(engine.check(&ns(), R, &bob(), 0)));
    }

    #[test]
    fn global_cap() {
        let mut engine = PolicyEngine::new();
        engine.set_caps(&ns(), R, Some(2), None, None);
        for _ in 0..2 {
            engine.check(&ns(), R, &alice(), 0).unwrap();
            engine.record_use(&ns(), R, &alice(), 0);
        }
        assert!(is_violation(engine.check(&ns(), R, &bob(), 0)));
        assert_eq!(engine.stats(&ns(), R).total_uses, 2);
    }

    #[test]
    fn zero_cap_disables_recipe() {
        let mut engine = PolicyEngine::new();
        engine.set_caps(&ns(), R, Some(0), None, None);
        assert!(is_violation(engine.check(&ns(), R, &alice(), 0)));
    }

    #[test]
    fn cooldown_and_per_caller_cap() {
        let mut engine = PolicyEngine::new();
        engine.set_caps(&ns(), R, None, Some(2), Some(60));

        engine.check(&ns(), R, &alice(), 1_000).unwrap();
        engine.record_use(&ns(), R, &alice(), 1_000);
        assert!(is_violation(engine.check(&ns(), R, &alice(), 1_059)));
        engine.check(&ns(), R, &bob(), 1_059).unwrap();

        engine.check(&ns(), R, &alice(), 1_060).unwrap();
        engine.record_use(&ns(), R, &alice(), 1_060);
        assert!(is_violation(engine.check(&ns(), R, &alice(), 5_000)));
        assert_eq!(engine.caller_usage(&ns(), R, &alice()).unwrap().uses, 2);
    }

    #[test]
    fn caller_rows_only_with_cooldown() {
        let mut engine = PolicyEngine::new();
        engine.set_caps(&ns(), R, None, Some(1), None);
        engine.record_use(&ns(), R, &alice(), 0);
        assert!(engine.caller_usage(&ns(), R, &alice()).is_none());
    }

    #[test]
    fn check_order_window_before_cap() {
        let mut engine = PolicyEngine::new();
        engine.set_caps(&ns(), R, Some(0), None, None);
        engine.set_window(&ns(), R, Some(100), None).unwrap();
        let err = engine.check(&ns(), R, &alice(), 0).unwrap_err();
        assert!(err.to_string().contains("opens at"), "{err}");
    }

    #[test]
    fn remove_policy_keeps_stats() {
        let mut engine = PolicyEngine::new();
        engine.set_caps(&ns(), R, Some(5), None, None);
        engine.record_use(&ns(), R, &alice(), 0);
        engine.remove_policy(&ns(), R).unwrap();
        assert!(!engine.state(&ns(), R).is_restricted());
        assert_eq!(engine.stats(&ns(), R).total_uses, 1);
        assert!(matches!(
            engine.remove_policy(&ns(), R).unwrap_err(),
            BlendError::NotFound { .. }
        ));
    }

    #[test]
    fn purge_recipe_cascades() {
        let mut engine = PolicyEngine::new();
        engine.set_caps(&ns(), R, None, None, Some(10));
        engine.record_use(&ns(), R, &alice(), 0);
        engine.purge_recipe(&ns(), R);
        assert!(!engine.state(&ns(), R).is_restricted());
        assert_eq!(engine.stats(&ns(), R).total_uses, 0);
        assert!(engine.caller_usage(&ns(), R, &alice()).is_none());
        // Purging an unknown recipe is a no-op.
        engine.purge_recipe(&ns(), RecipeId(1));
    }
}
