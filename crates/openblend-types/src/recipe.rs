//! Recipe model: ingredient specs, outcome pools, and the stored recipe.
//!
//! ## Recipe kinds
//!
//! ```text
//!   Blend  { [T1, T2, ..] }   multiset of templates   → single target
//!   Swap   { T1 }             exactly one template     → single target
//!   Slot   { [spec, spec] }   positional, typed specs  → outcome pool
//! ```
//!
//! A slot recipe whose pool has one entry resolves immediately, like a
//! blend. A pool with more entries needs an external random value and is
//! resolved in two phases by the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BlendError, Namespace, Principal, RecipeId, Result, SchemaName, TemplateId};

// ---------------------------------------------------------------------------
// Ingredient specs
// ---------------------------------------------------------------------------

/// How an [`IngredientSpec::AttributeMatch`] combines its predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    /// Every predicate must hold.
    All,
    /// One satisfied predicate is enough.
    Any,
}

/// One attribute requirement: the item's value for `key` must be one of
/// `values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePredicate {
    pub key: String,
    pub values: Vec<String>,
}

impl AttributePredicate {
    /// Predicate accepting any of `values` for attribute `key`.
    #[must_use]
    pub fn new(key: impl Into<String>, values: &[&str]) -> Self {
        Self {
            key: key.into(),
            values: values.iter().map(|v| (*v).to_string()).collect(),
        }
    }

    /// Whether `value` satisfies this predicate.
    #[must_use]
    pub fn accepts(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| self.values.iter().any(|allowed| allowed == v))
    }
}

/// One positional clause of a slot recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngredientSpec {
    /// Any item of the schema.
    SchemaMatch { schema: SchemaName, count: u32 },
    /// Any item minted from one of the templates.
    TemplateSet { templates: Vec<TemplateId>, count: u32 },
    /// Items of the schema whose attributes satisfy the predicates.
    AttributeMatch {
        schema: SchemaName,
        predicates: Vec<AttributePredicate>,
        mode: MatchMode,
        count: u32,
    },
}

impl IngredientSpec {
    /// How many consecutive supplied items this clause consumes.
    #[must_use]
    pub fn count(&self) -> u32 {
        match self {
            Self::SchemaMatch { count, .. }
            | Self::TemplateSet { count, .. }
            | Self::AttributeMatch { count, .. } => *count,
        }
    }

    /// Short label for logs and error messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::SchemaMatch { .. } => "schema",
            Self::TemplateSet { .. } => "template-set",
            Self::AttributeMatch { .. } => "attribute",
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome pool
// ---------------------------------------------------------------------------

/// A weighted possible result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub weight: u32,
    pub template: TemplateId,
}

impl OutcomeEntry {
    /// One pool entry.
    #[must_use]
    pub fn new(weight: u32, template: TemplateId) -> Self {
        Self { weight, template }
    }
}

/// Weighted set of possible results, stored in non-increasing weight order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomePool {
    entries: Vec<OutcomeEntry>,
}

impl OutcomePool {
    /// Wrap entries without validation; see [`OutcomePool::check_weights`].
    #[must_use]
    pub fn new(entries: Vec<OutcomeEntry>) -> Self {
        Self { entries }
    }

    /// Entries in stored order.
    #[must_use]
    pub fn entries(&self) -> &[OutcomeEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pools with more than one entry need an external random value.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.entries.len() > 1
    }

    /// The only entry of a one-entry pool.
    #[must_use]
    pub fn sole_outcome(&self) -> Option<TemplateId> {
        match self.entries.as_slice() {
            [only] => Some(only.template),
            _ => None,
        }
    }

    /// Structural weight checks:
    ///
    /// 1. at least one entry
    /// 2. every weight > 0
    /// 3. weights non-increasing by position
    /// 4. cumulative sum fits in `u32`
    /// 5. multi-entry pools sum exactly to `total_odds`
    ///
    /// # Errors
    /// - `InvalidRecipe` for 1, 2, 3, 5
    /// - `CapacityExceeded` for 4
    pub fn check_weights(&self, total_odds: u32) -> Result<()> {
        if self.entries.is_empty() {
            return Err(BlendError::invalid_recipe("outcome pool is empty"));
        }

        let mut sum: u32 = 0;
        let mut previous = u32::MAX;
        for (pos, entry) in self.entries.iter().enumerate() {
            if entry.weight == 0 {
                return Err(BlendError::invalid_recipe(format!(
                    "outcome {pos} ({}) has zero weight",
                    entry.template
                )));
            }
            if entry.weight > previous {
                return Err(BlendError::invalid_recipe(format!(
                    "outcome weights must be non-increasing: position {pos} has {} after {previous}",
                    entry.weight
                )));
            }
            previous = entry.weight;
            sum = sum
                .checked_add(entry.weight)
                .ok_or_else(|| BlendError::capacity("outcome weight sum overflows"))?;
        }

        if self.is_deferred() && sum != total_odds {
            return Err(BlendError::invalid_recipe(format!(
                "outcome weights sum to {sum}, expected {total_odds}"
            )));
        }
        Ok(())
    }
}

/// What a recipe produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Single(TemplateId),
    Pool(OutcomePool),
}

impl Outcome {
    /// The template minted without randomness, if there is exactly one.
    #[must_use]
    pub fn immediate_target(&self) -> Option<TemplateId> {
        match self {
            Self::Single(t) => Some(*t),
            Self::Pool(pool) => pool.sole_outcome(),
        }
    }

    /// Whether invoking needs a randomness round trip.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Pool(pool) if pool.is_deferred())
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// The ingredient side of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipeKind {
    /// Order-independent multiset of templates.
    Blend { ingredients: Vec<TemplateId> },
    /// One item of one template.
    Swap { ingredient: TemplateId },
    /// Positional typed clauses.
    Slot { ingredients: Vec<IngredientSpec> },
}

impl std::fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blend { .. } => write!(f, "BLEND"),
            Self::Swap { .. } => write!(f, "SWAP"),
            Self::Slot { .. } => write!(f, "SLOT"),
        }
    }
}

/// A stored transformation. Ingredient and outcome fields never change
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub namespace: Namespace,
    pub author: Principal,
    pub kind: RecipeKind,
    pub outcome: Outcome,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(weights: &[u32]) -> OutcomePool {
        OutcomePool::new(
            weights
                .iter()
                .zip(1u32..)
                .map(|(w, t)| OutcomeEntry::new(*w, TemplateId(t)))
                .collect(),
        )
    }

    #[test]
    fn valid_pool_passes() {
        pool(&[60, 40]).check_weights(100).unwrap();
        pool(&[50, 25, 25]).check_weights(100).unwrap();
    }

    #[test]
    fn single_entry_pool_skips_sum_check() {
        pool(&[1]).check_weights(100).unwrap();
        assert!(!pool(&[1]).is_deferred());
        assert_eq!(pool(&[1]).sole_outcome(), Some(TemplateId(1)));
    }

    #[test]
    fn increasing_weights_rejected() {
        let err = pool(&[40, 60]).check_weights(100).unwrap_err();
        assert!(matches!(err, BlendError::InvalidRecipe { .. }));
    }

    #[test]
    fn wrong_sum_rejected() {
        let err = pool(&[60, 30]).check_weights(100).unwrap_err();
        assert!(matches!(err, BlendError::InvalidRecipe { .. }));
    }

    #[test]
    fn zero_weight_rejected() {
        let err = pool(&[100, 0]).check_weights(100).unwrap_err();
        assert!(matches!(err, BlendError::InvalidRecipe { .. }));
    }

    #[test]
    fn empty_pool_rejected() {
        let err = pool(&[]).check_weights(100).unwrap_err();
        assert!(matches!(err, BlendError::InvalidRecipe { .. }));
    }

    #[test]
    fn overflow_reported_as_capacity() {
        let err = pool(&[u32::MAX, u32::MAX]).check_weights(100).unwrap_err();
        assert!(matches!(err, BlendError::CapacityExceeded { .. }));
    }

    #[test]
    fn attribute_predicate_accepts_listed_values() {
        let p = AttributePredicate::new("rarity", &["rare", "epic"]);
        assert!(p.accepts(Some("epic")));
        assert!(!p.accepts(Some("common")));
        assert!(!p.accepts(None));
    }

    #[test]
    fn outcome_immediacy() {
        assert_eq!(Outcome::Single(TemplateId(9)).immediate_target(), Some(TemplateId(9)));
        let multi = Outcome::Pool(pool(&[60, 40]));
        assert!(multi.is_deferred());
        assert_eq!(multi.immediate_target(), None);
    }

    #[test]
    fn ingredient_spec_serde_is_tagged() {
        let spec = IngredientSpec::SchemaMatch {
            schema: SchemaName::new("heroes"),
            count: 2,
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"kind\":\"schema_match\""), "{json}");
        let back: IngredientSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        assert_eq!(back.count(), 2);
    }
}
