//! Recipe registry: validated recipe definitions and id allocation.
//!
//! Recipes are stored per namespace. Each namespace has its own monotonic
//! id counter starting at the configured base, so ids are never reused even
//! after a recipe is removed.
//!
//! ## Definition checks
//!
//! ```text
//!   ingredients   non-empty, count >= 1, schemas/templates/attribute keys
//!                 exist in the namespace, template ingredients are
//!                 transferable and burnable
//!   outcome       every template exists; pools pass the weight checks;
//!                 multi-entry pools use uncapped templates only
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use openblend_types::{
    BlendError, IngredientSpec, ItemCatalog, Namespace, Outcome, OutcomePool, Principal, Recipe,
    RecipeId, RecipeKind, Result, TemplateId, TemplateInfo,
};

/// Validate a recipe definition against the namespace's catalog.
///
/// # Errors
/// - `InvalidRecipe` for any structural or catalog violation
/// - `CapacityExceeded` if ingredient counts or pool weights overflow
pub fn validate_definition(
    catalog: &impl ItemCatalog,
    namespace: &Namespace,
    kind: &RecipeKind,
    outcome: &Outcome,
    total_odds: u32,
) -> Result<()> {
    match kind {
        RecipeKind::Blend { ingredients } => {
            if ingredients.is_empty() {
                return Err(BlendError::invalid_recipe("blend has no ingredients"));
            }
            for t in ingredients {
                check_ingredient_template(catalog, namespace, *t)?;
            }
        }
        RecipeKind::Swap { ingredient } => {
            check_ingredient_template(catalog, namespace, *ingredient)?;
        }
        RecipeKind::Slot { ingredients } => {
            if ingredients.is_empty() {
                return Err(BlendError::invalid_recipe("slot recipe has no ingredients"));
            }
            let mut total: u32 = 0;
            for (index, spec) in ingredients.iter().enumerate() {
                check_spec(catalog, namespace, index, spec)?;
                total = total
                    .checked_add(spec.count())
                    .ok_or_else(|| BlendError::capacity("ingredient counts overflow"))?;
            }
        }
    }

    match outcome {
        Outcome::Single(target) => {
            require_template(catalog, namespace, *target)?;
        }
        Outcome::Pool(pool) => check_pool(catalog, namespace, pool, total_odds)?,
    }
    Ok(())
}

fn require_template(
    catalog: &impl ItemCatalog,
    namespace: &Namespace,
    template: TemplateId,
) -> Result<TemplateInfo> {
    catalog.template(namespace, template).ok_or_else(|| {
        BlendError::invalid_recipe(format!("{template} does not exist in {namespace}"))
    })
}

fn check_ingredient_template(
    catalog: &impl ItemCatalog,
    namespace: &Namespace,
    template: TemplateId,
) -> Result<()> {
    let info = require_template(catalog, namespace, template)?;
    if !info.transferable || !info.burnable {
        return Err(BlendError::invalid_recipe(format!(
            "ingredient {template} must be transferable and burnable"
        )));
    }
    Ok(())
}

fn check_spec(
    catalog: &impl ItemCatalog,
    namespace: &Namespace,
    index: usize,
    spec: &IngredientSpec,
) -> Result<()> {
    if spec.count() == 0 {
        return Err(BlendError::invalid_recipe(format!(
            "{} ingredient #{index} has count 0",
            spec.label()
        )));
    }
    match spec {
        IngredientSpec::SchemaMatch { schema, .. } => {
            if catalog.schema(namespace, schema).is_none() {
                return Err(BlendError::invalid_recipe(format!(
                    "schema {schema} does not exist in {namespace}"
                )));
            }
        }
        IngredientSpec::TemplateSet { templates, .. } => {
            if templates.is_empty() {
                return Err(BlendError::invalid_recipe(format!(
                    "template-set ingredient #{index} is empty"
                )));
            }
            for t in templates {
                check_ingredient_template(catalog, namespace, *t)?;
            }
        }
        IngredientSpec::AttributeMatch {
            schema, predicates, ..
        } => {
            let info = catalog.schema(namespace, schema).ok_or_else(|| {
                BlendError::invalid_recipe(format!(
                    "schema {schema} does not exist in {namespace}"
                ))
            })?;
            if predicates.is_empty() {
                return Err(BlendError::invalid_recipe(format!(
                    "attribute ingredient #{index} has no predicates"
                )));
            }
            for p in predicates {
                if !info.has_attribute(&p.key) {
                    return Err(BlendError::invalid_recipe(format!(
                        "attribute '{}' is not in schema {schema}",
                        p.key
                    )));
                }
                if p.values.is_empty() {
                    return Err(BlendError::invalid_recipe(format!(
                        "attribute '{}' lists no values",
                        p.key
                    )));
                }
            }
        }
    }
    Ok(())
}

fn check_pool(
    catalog: &impl ItemCatalog,
    namespace: &Namespace,
    pool: &OutcomePool,
    total_odds: u32,
) -> Result<()> {
    pool.check_weights(total_odds)?;
    for entry in pool.entries() {
        let info = require_template(catalog, namespace, entry.template)?;
        if pool.is_deferred() && info.is_capped() {
            return Err(BlendError::invalid_recipe(format!(
                "pool outcome {} has a max supply; multi-outcome pools need uncapped templates",
                entry.template
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Stored recipes plus per-namespace id counters.
#[derive(Debug)]
pub struct RecipeRegistry {
    recipes: BTreeMap<(Namespace, RecipeId), Recipe>,
    next_ids: HashMap<Namespace, RecipeId>,
    id_start: u64,
}

impl RecipeRegistry {
    /// A registry whose namespaces allocate ids from `id_start`.
    #[must_use]
    pub fn new(id_start: u64) -> Self {
        Self {
            recipes: BTreeMap::new(),
            next_ids: HashMap::new(),
            id_start,
        }
    }

    /// The id the next recipe in `namespace` will receive.
    #[must_use]
    pub fn peek_next_id(&self, namespace: &Namespace) -> RecipeId {
        self.next_ids
            .get(namespace)
            .copied()
            .unwrap_or(RecipeId(self.id_start))
    }

    /// Store an already-validated recipe under a fresh id.
    ///
    /// # Errors
    /// `CapacityExceeded` if the namespace has run out of ids; nothing is
    /// stored in that case.
    pub fn insert(
        &mut self,
        namespace: &Namespace,
        author: &Principal,
        kind: RecipeKind,
        outcome: Outcome,
        title: String,
        created_at: DateTime<Utc>,
    ) -> Result<RecipeId> {
        let id = self.peek_next_id(namespace);
        let following = id.next()?;
        self.next_ids.insert(namespace.clone(), following);
        let recipe = Recipe {
            id,
            namespace: namespace.clone(),
            author: author.clone(),
            kind,
            outcome,
            title,
            created_at,
        };
        tracing::info!(
            recipe = %id,
            namespace = %namespace,
            kind = %recipe.kind,
            deferred = recipe.outcome.is_deferred(),
            "Recipe created"
        );
        self.recipes.insert((namespace.clone(), id), recipe);
        Ok(id)
    }

    /// # Errors
    /// `NotFound` if absent.
    pub fn get(&self, namespace: &Namespace, id: RecipeId) -> Result<&Recipe> {
        self.recipes
            .get(&(namespace.clone(), id))
            .ok_or_else(|| BlendError::not_found(format!("{id} in {namespace}")))
    }

    /// Whether `id` exists in `namespace`.
    #[must_use]
    pub fn contains(&self, namespace: &Namespace, id: RecipeId) -> bool {
        self.recipes.contains_key(&(namespace.clone(), id))
    }

    /// # Errors
    /// `NotFound` if absent.
    pub fn remove(&mut self, namespace: &Namespace, id: RecipeId) -> Result<Recipe> {
        let recipe = self
            .recipes
            .remove(&(namespace.clone(), id))
            .ok_or_else(|| BlendError::not_found(format!("{id} in {namespace}")))?;
        tracing::info!(recipe = %id, namespace = %namespace, "Recipe removed");
        Ok(recipe)
    }

    /// Recipes of one namespace in id order.
    pub fn recipes_in<'a>(&'a self, namespace: &'a Namespace) -> impl Iterator<Item = &'a Recipe> {
        self.recipes
            .range((namespace.clone(), RecipeId(0))..=(namespace.clone(), RecipeId(u64::MAX)))
            .map(|(_, r)| r)
    }

    /// Number of stored recipes across all namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether no recipe is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
