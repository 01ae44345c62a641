//! Pure ingredient matcher.
//!
//! Takes a recipe's ingredient side and the catalog snapshots of the
//! supplied items, and either accepts the batch or rejects it with a single
//! aggregate [`BlendError::IngredientMismatch`]. No side effects, no escrow
//! or policy logic.
//!
//! ```text
//! match_recipe(namespace, RecipeKind, [AssetInfo]) -> Result<[ItemId]>
//! ```
//!
//! ## Slot matching
//!
//! A cursor walks the supplied items. Each spec, in declaration order,
//! takes the next `count` items and checks every one of them:
//!
//! ```text
//!   specs:    [ schema:heroes x2 ][ template-set {7,8} x1 ]
//!   supplied: [  a  ][  b  ]      [  c  ][  d  ]
//!                                          ^ trailing: rejected
//! ```
//!
//! Running out of items, any failing item, or items left after the last
//! spec all reject the whole batch.

use std::collections::BTreeMap;

use openblend_types::{
    AssetInfo, BlendError, IngredientSpec, ItemId, MatchMode, Namespace, RecipeKind, Result,
    TemplateId,
};

/// Match supplied items against any recipe kind.
///
/// Every item must belong to `namespace`. On success returns the consumed
/// ids in supplied order.
///
/// # Errors
/// [`BlendError::IngredientMismatch`] describing every failing position.
pub fn match_recipe(
    namespace: &Namespace,
    kind: &RecipeKind,
    supplied: &[AssetInfo],
) -> Result<Vec<ItemId>> {
    check_namespace(namespace, supplied)?;
    match kind {
        RecipeKind::Blend { ingredients } => match_blend(ingredients, supplied),
        RecipeKind::Swap { ingredient } => match_swap(*ingredient, supplied),
        RecipeKind::Slot { ingredients } => match_ingredients(ingredients, supplied),
    }
}

fn check_namespace(namespace: &Namespace, supplied: &[AssetInfo]) -> Result<()> {
    let foreign: Vec<String> = supplied
        .iter()
        .filter(|a| &a.namespace != namespace)
        .map(|a| format!("{} belongs to {}", a.id, a.namespace))
        .collect();
    if foreign.is_empty() {
        Ok(())
    } else {
        Err(BlendError::mismatch(foreign.join("; ")))
    }
}

// ---------------------------------------------------------------------------
// Blend / Swap
// ---------------------------------------------------------------------------

/// Order-independent check: the multiset of supplied template ids must
/// equal the multiset of declared ingredients.
///
/// # Errors
/// [`BlendError::IngredientMismatch`] if the multisets differ.
pub fn match_blend(ingredients: &[TemplateId], supplied: &[AssetInfo]) -> Result<Vec<ItemId>> {
    let mut wanted: BTreeMap<TemplateId, i64> = BTreeMap::new();
    for t in ingredients {
        *wanted.entry(*t).or_default() += 1;
    }
    let mut untemplated = Vec::new();
    for asset in supplied {
        match asset.template {
            Some(t) => *wanted.entry(t).or_default() -= 1,
            None => untemplated.push(asset.id.to_string()),
        }
    }

    let mut problems: Vec<String> = wanted
        .iter()
        .filter(|(_, n)| **n != 0)
        .map(|(t, n)| {
            if *n > 0 {
                format!("missing {n} x {t}")
            } else {
                format!("unexpected {} x {t}", -n)
            }
        })
        .collect();
    if !untemplated.is_empty() {
        problems.push(format!("items without template: {}", untemplated.join(", ")));
    }

    if problems.is_empty() {
        Ok(supplied.iter().map(|a| a.id).collect())
    } else {
        tracing::debug!(problems = problems.len(), "Blend ingredients rejected");
        Err(BlendError::mismatch(problems.join("; ")))
    }
}

/// Exactly one item, minted from `ingredient`.
///
/// # Errors
/// [`BlendError::IngredientMismatch`] on a wrong count or template.
pub fn match_swap(ingredient: TemplateId, supplied: &[AssetInfo]) -> Result<Vec<ItemId>> {
    match supplied {
        [only] if only.template == Some(ingredient) => Ok(vec![only.id]),
        [only] => Err(BlendError::mismatch(format!(
            "{} is not minted from {ingredient}",
            only.id
        ))),
        _ => Err(BlendError::mismatch(format!(
            "swap takes exactly one item, got {}",
            supplied.len()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// Positional match of typed specs against the supplied items.
///
/// # Errors
/// [`BlendError::IngredientMismatch`] aggregating every failure.
pub fn match_ingredients(specs: &[IngredientSpec], supplied: &[AssetInfo]) -> Result<Vec<ItemId>> {
    let mut failures = Vec::new();
    let mut cursor = 0usize;

    'specs: for (index, spec) in specs.iter().enumerate() {
        for _ in 0..spec.count() {
            let Some(asset) = supplied.get(cursor) else {
                failures.push(format!(
                    "ran out of items at {} ingredient #{index}",
                    spec.label()
                ));
                break 'specs;
            };
            if let Err(reason) = check_spec(spec, asset) {
                failures.push(format!("{} at position {cursor}: {reason}", asset.id));
            }
            cursor += 1;
        }
    }

    if failures.is_empty() && cursor < supplied.len() {
        failures.push(format!(
            "{} unconsumed item(s) after the last ingredient",
            supplied.len() - cursor
        ));
    }

    if failures.is_empty() {
        tracing::debug!(items = cursor, specs = specs.len(), "Slot ingredients matched");
        Ok(supplied.iter().map(|a| a.id).collect())
    } else {
        tracing::debug!(failures = failures.len(), "Slot ingredients rejected");
        Err(BlendError::mismatch(failures.join("; ")))
    }
}

/// Check one item against one spec.
fn check_spec(spec: &IngredientSpec, asset: &AssetInfo) -> std::result::Result<(), String> {
    match spec {
        IngredientSpec::SchemaMatch { schema, .. } => {
            if &asset.schema == schema {
                Ok(())
            } else {
                Err(format!("schema {} is not {schema}", asset.schema))
            }
        }
        IngredientSpec::TemplateSet { templates, .. } => match asset.template {
            Some(t) if templates.contains(&t) => Ok(()),
            Some(t) => Err(format!("{t} is not in the template set")),
            None => Err("item has no template".to_string()),
        },
        IngredientSpec::AttributeMatch {
            schema,
            predicates,
            mode,
            ..
        } => {
            if &asset.schema != schema {
                return Err(format!("schema {} is not {schema}", asset.schema));
            }
            let mut results = predicates
                .iter()
                .map(|p| p.accepts(asset.attribute(&p.key)));
            let ok = match mode {
                MatchMode::All => results.all(|r| r),
                MatchMode::Any => results.any(|r| r),
            };
            if ok {
                Ok(())
            } else {
                Err(format!("attributes fail {mode:?} predicates"))
            }
        }
    }
}
