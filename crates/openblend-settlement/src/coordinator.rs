//! Resolution coordinator: the action surface of the service.
//!
//! The coordinator owns all service state and composes the entry plane
//! (escrow, registry, policies, access lists) with MatchCore. Every public
//! action is one atomic unit of work: it validates everything first, then
//! mutates, then returns a [`Receipt`] whose effects the host dispatches.
//! A failed action returns an error and leaves no trace.
//!
//! ## Invocation State Machine
//!
//! ```text
//!                      ┌──────────┐
//!              ┌──────▶│ RESOLVED │  one outcome: Mint + Burn now
//!   invoke ────┤       └──────────┘
//!              │       ┌─────────┐ receive_random ┌───────────┐ redeem ┌──────────┐
//!              └──────▶│ PENDING ├───────────────▶│ FINALIZED ├───────▶│ REDEEMED │
//!                      └─────────┘                └───────────┘        └──────────┘
//!                   RequestRandom                  (no effects)        Mint + Burn
//! ```
//!
//! Between PENDING and FINALIZED the only link is the stored [`ClaimJob`],
//! which snapshots the outcome pool and holds the consumed escrow entries.

use openblend_ingress::{
    EscrowLedger, NamespaceAccess, PolicyEngine, RecipeRegistry, find_duplicate, parse_note,
    validate_definition,
};
use openblend_matchcore::{derive_nonce, match_recipe, resolve_pool};
use openblend_types::{
    AssetInfo, AuthorityOracle, BlendError, CallContext, ClaimJob, ClaimState, Collaborators,
    Effect, Hold, IngredientSpec, ItemCatalog, ItemId, JobId, Namespace, Outcome, OutcomePool,
    PolicyState, Principal, Receipt, ReceiptKind, Recipe, RecipeId, RecipeKind, Result,
    ServiceConfig, TemplateId, TicketId, constants,
};

use crate::{ClaimBook, CustodyAudit, NonceGuard};

/// All service state plus the actions that change it.
#[derive(Debug)]
pub struct Coordinator {
    config: ServiceConfig,
    registry: RecipeRegistry,
    ledger: EscrowLedger,
    policies: PolicyEngine,
    access: NamespaceAccess,
    claims: ClaimBook,
    nonces: NonceGuard,
    custody: CustodyAudit,
}

impl Coordinator {
    /// # Errors
    /// [`BlendError::Configuration`] if the config fails validation.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            service = %config.service_account,
            version = constants::VERSION,
            "{} coordinator started",
            constants::SERVICE_NAME
        );
        Ok(Self {
            registry: RecipeRegistry::new(config.recipe_id_start),
            ledger: EscrowLedger::new(),
            policies: PolicyEngine::new(),
            access: NamespaceAccess::new(),
            claims: ClaimBook::new(config.claim_id_start),
            nonces: NonceGuard::new(config.nonce_guard_capacity),
            custody: CustodyAudit::new(),
            config,
        })
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    fn guard_reentrancy(&self, ctx: &CallContext) -> Result<()> {
        if ctx.caller == self.config.service_account {
            return Err(BlendError::ReentrancyGuard);
        }
        Ok(())
    }

    fn guard_admin(&self, ctx: &CallContext) -> Result<()> {
        if ctx.caller != self.config.admin_account {
            return Err(BlendError::unauthorized(format!(
                "{} is not the service admin",
                ctx.caller
            )));
        }
        Ok(())
    }

    fn require_namespace(env: &impl ItemCatalog, namespace: &Namespace) -> Result<()> {
        if env.namespace_exists(namespace) {
            Ok(())
        } else {
            Err(BlendError::not_found(format!("namespace {namespace}")))
        }
    }

    /// Namespace exists and `caller` may act for it.
    fn require_authority(
        env: &(impl ItemCatalog + AuthorityOracle),
        namespace: &Namespace,
        caller: &Principal,
    ) -> Result<()> {
        Self::require_namespace(env, namespace)?;
        if !env.is_authorized(namespace, caller) {
            return Err(BlendError::unauthorized(format!(
                "{caller} is not authorized in {namespace}"
            )));
        }
        Ok(())
    }

    fn require_service_authorized(
        &self,
        env: &impl AuthorityOracle,
        namespace: &Namespace,
    ) -> Result<()> {
        if !env.is_authorized(namespace, &self.config.service_account) {
            return Err(BlendError::unauthorized(format!(
                "service is not authorized in {namespace}"
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Recipe registry actions
    // -----------------------------------------------------------------------

    /// Create a blend: the multiset `ingredients` becomes `target`.
    ///
    /// # Errors
    /// `ReentrancyGuard`, `NotFound`, `Unauthorized`, `InvalidRecipe`,
    /// `CapacityExceeded`.
    pub fn create_blend(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        ingredients: Vec<TemplateId>,
        target: TemplateId,
    ) -> Result<Receipt> {
        self.create_recipe(
            ctx,
            env,
            namespace,
            RecipeKind::Blend { ingredients },
            Outcome::Single(target),
            String::new(),
        )
    }

    /// Create a swap: one item of `ingredient` becomes `target`.
    ///
    /// # Errors
    /// Same as [`Coordinator::create_blend`].
    pub fn create_swap(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        ingredient: TemplateId,
        target: TemplateId,
    ) -> Result<Receipt> {
        self.create_recipe(
            ctx,
            env,
            namespace,
            RecipeKind::Swap { ingredient },
            Outcome::Single(target),
            String::new(),
        )
    }

    /// Create a slot recipe with positional ingredients and an outcome pool.
    ///
    /// # Errors
    /// Same as [`Coordinator::create_blend`].
    pub fn create_slot(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        ingredients: Vec<IngredientSpec>,
        pool: OutcomePool,
        title: impl Into<String>,
    ) -> Result<Receipt> {
        self.create_recipe(
            ctx,
            env,
            namespace,
            RecipeKind::Slot { ingredients },
            Outcome::Pool(pool),
            title.into(),
        )
    }

    fn create_recipe(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        kind: RecipeKind,
        outcome: Outcome,
        title: String,
    ) -> Result<Receipt> {
        self.guard_reentrancy(ctx)?;
        Self::require_authority(env, namespace, &ctx.caller)?;
        self.access
            .check(namespace, self.config.require_allowed_namespace)?;
        self.require_service_authorized(env, namespace)?;
        validate_definition(env, namespace, &kind, &outcome, self.config.total_odds)?;

        let id = self
            .registry
            .insert(namespace, &ctx.caller, kind, outcome, title, ctx.now)?;
        Ok(Receipt::new(ReceiptKind::RecipeCreated { recipe: id }, ctx.now))
    }

    /// Remove a recipe with its policy, counters and caller rows. Open jobs
    /// keep their pool snapshot and still finalize.
    ///
    /// # Errors
    /// `ReentrancyGuard`, `NotFound`, `Unauthorized`.
    pub fn remove_recipe(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        id: RecipeId,
    ) -> Result<Receipt> {
        self.guard_reentrancy(ctx)?;
        self.registry.get(namespace, id)?;
        Self::require_authority(env, namespace, &ctx.caller)?;

        self.registry.remove(namespace, id)?;
        self.policies.purge_recipe(namespace, id);
        Ok(Receipt::new(ReceiptKind::RecipeRemoved { recipe: id }, ctx.now))
    }

    // -----------------------------------------------------------------------
    // Escrow actions
    // -----------------------------------------------------------------------

    /// Deposit notification from the item registry: `from` moved `items`
    /// into the service's custody with `note` naming the namespace.
    ///
    /// # Errors
    /// `Malformed` if the note does not name a namespace;
    /// `DuplicateEscrow` if an item is already escrowed.
    pub fn on_deposit(
        &mut self,
        ctx: &CallContext,
        from: &Principal,
        items: &[ItemId],
        note: &str,
    ) -> Result<Receipt> {
        if from == &self.config.service_account {
            tracing::debug!(items = items.len(), "Outgoing transfer from service ignored");
            return Ok(Receipt::new(ReceiptKind::DepositIgnored, ctx.now));
        }
        let namespace = parse_note(note, self.config.max_note_len)?;
        self.ledger.deposit(from, &namespace, items, ctx.now)?;
        self.custody.record_deposit(items.len());
        Ok(Receipt::new(
            ReceiptKind::Deposited {
                items: items.to_vec(),
            },
            ctx.now,
        ))
    }

    /// Return free escrowed items to their depositor.
    ///
    /// # Errors
    /// `ReentrancyGuard`, `Malformed` (empty or repeated ids), `NotFound`,
    /// `Unauthorized`, `EscrowLocked`.
    pub fn refund_items(
        &mut self,
        ctx: &CallContext,
        namespace: &Namespace,
        items: &[ItemId],
    ) -> Result<Receipt> {
        self.guard_reentrancy(ctx)?;
        if items.is_empty() {
            return Err(BlendError::Malformed {
                reason: "no items to refund".to_string(),
            });
        }
        if let Some(dup) = find_duplicate(items) {
            return Err(BlendError::Malformed {
                reason: format!("{dup} listed twice"),
            });
        }
        self.ledger.check_owned(&ctx.caller, namespace, items)?;

        self.ledger.release(items);
        self.custody.record_refund(items.len());
        tracing::info!(caller = %ctx.caller, items = items.len(), "Items refunded");
        Ok(Receipt::new(
            ReceiptKind::Refunded {
                items: items.to_vec(),
            },
            ctx.now,
        )
        .with_effects(vec![Effect::Transfer {
            recipient: ctx.caller.clone(),
            items: items.to_vec(),
            note: constants::REFUND_NOTE.to_string(),
        }]))
    }

    /// Drop every unheld entry of `depositor` without returning the items.
    ///
    /// # Errors
    /// `Unauthorized` unless called by the service admin.
    pub fn purge_escrow(&mut self, ctx: &CallContext, depositor: &Principal) -> Result<Receipt> {
        self.guard_admin(ctx)?;
        let items = self.ledger.purge(depositor);
        self.custody.record_purge(items.len());
        Ok(Receipt::new(ReceiptKind::Purged { items }, ctx.now))
    }

    // -----------------------------------------------------------------------
    // Invocation
    // -----------------------------------------------------------------------

    /// Invoke a recipe with escrowed items.
    ///
    /// ## Steps
    ///
    /// 1. Caller is not the service; namespace passes the access lists
    /// 2. Recipe exists; ids are distinct; every item is escrowed by the
    ///    caller for this namespace and free
    /// 3. Policy checks, then the matcher
    /// 4. One outcome: supply check, `Mint` + `Burn`, entries released
    /// 5. Pool: fresh nonce and job id, entries held, `RequestRandom`
    ///
    /// Usage is recorded in both cases.
    ///
    /// # Errors
    /// `ReentrancyGuard`, `Unauthorized`, `NotFound`, `EscrowLocked`,
    /// `IngredientMismatch`, `PolicyViolation`, `CapacityExceeded`.
    pub fn invoke_recipe(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe_id: RecipeId,
        items: &[ItemId],
    ) -> Result<Receipt> {
        self.guard_reentrancy(ctx)?;
        self.access
            .check(namespace, self.config.require_allowed_namespace)?;
        let recipe = self.registry.get(namespace, recipe_id)?;

        if let Some(dup) = find_duplicate(items) {
            return Err(BlendError::mismatch(format!("{dup} supplied twice")));
        }
        self.ledger.check_owned(&ctx.caller, namespace, items)?;
        let assets = items
            .iter()
            .map(|id| {
                env.asset(*id)
                    .ok_or_else(|| BlendError::not_found(format!("asset {id}")))
            })
            .collect::<Result<Vec<AssetInfo>>>()?;

        self.policies
            .check(namespace, recipe_id, &ctx.caller, ctx.unix_now())?;
        let consumed = match_recipe(namespace, &recipe.kind, &assets)?;
        self.require_service_authorized(env, namespace)?;

        match recipe.outcome.immediate_target() {
            Some(target) => self.resolve_now(ctx, env, namespace, recipe_id, target, consumed),
            None => {
                let Outcome::Pool(pool) = &recipe.outcome else {
                    return Err(BlendError::Internal(format!(
                        "{recipe_id} has no immediate target and no pool"
                    )));
                };
                let pool = pool.clone();
                self.defer(ctx, env, namespace, recipe_id, pool, consumed)
            }
        }
    }

    fn resolve_now(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe_id: RecipeId,
        target: TemplateId,
        consumed: Vec<ItemId>,
    ) -> Result<Receipt> {
        let template = env
            .template(namespace, target)
            .ok_or_else(|| BlendError::not_found(format!("{target} in {namespace}")))?;
        if !template.can_mint() {
            return Err(BlendError::capacity(format!(
                "{target} has issued {}/{}",
                template.issued_supply, template.max_supply
            )));
        }

        self.ledger.release(&consumed);
        self.custody.record_burn(consumed.len());
        self.policies
            .record_use(namespace, recipe_id, &ctx.caller, ctx.unix_now());

        let mut effects = Vec::with_capacity(consumed.len() + 1);
        effects.push(Effect::Mint {
            namespace: namespace.clone(),
            schema: template.schema,
            template: target,
            recipient: ctx.caller.clone(),
        });
        effects.extend(consumed.iter().map(|item| Effect::Burn { item: *item }));

        tracing::info!(
            recipe = %recipe_id,
            caller = %ctx.caller,
            outcome = %target,
            burned = consumed.len(),
            "Recipe resolved"
        );
        Ok(Receipt::new(
            ReceiptKind::Resolved {
                recipe: recipe_id,
                outcome: target,
            },
            ctx.now,
        )
        .with_effects(effects))
    }

    fn defer(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe_id: RecipeId,
        pool: OutcomePool,
        consumed: Vec<ItemId>,
    ) -> Result<Receipt> {
        let nonce = self.nonces.first_free(derive_nonce(&ctx.tx_id), env)?;
        let job_id = self.claims.peek_next_id();
        // Nothing is held unless the job can be opened afterwards.
        job_id.next()?;

        self.ledger.hold(&consumed, Hold::Job(job_id))?;
        self.nonces.mark_issued(nonce)?;
        self.claims.open(ClaimJob {
            id: job_id,
            recipe_id,
            requester: ctx.caller.clone(),
            namespace: namespace.clone(),
            consumed,
            pool,
            nonce,
            opened_at: ctx.now,
        })?;
        self.policies
            .record_use(namespace, recipe_id, &ctx.caller, ctx.unix_now());

        tracing::info!(
            recipe = %recipe_id,
            caller = %ctx.caller,
            job = %job_id,
            nonce = %nonce,
            "Recipe pending randomness"
        );
        Ok(Receipt::new(
            ReceiptKind::Pending {
                recipe: recipe_id,
                job: job_id,
            },
            ctx.now,
        )
        .with_effects(vec![Effect::RequestRandom { job: job_id, nonce }]))
    }

    /// Randomness callback: select the outcome of an open job and turn it
    /// into a ticket. Nothing is minted or burned here.
    ///
    /// # Errors
    /// `Unauthorized` unless called by the randomness account; `NotFound`
    /// for an unknown or already finalized job.
    pub fn receive_random(
        &mut self,
        ctx: &CallContext,
        job_id: JobId,
        random: [u8; 32],
    ) -> Result<Receipt> {
        if ctx.caller != self.config.randomness_account {
            tracing::warn!(caller = %ctx.caller, job = %job_id, "Randomness from untrusted caller");
            return Err(BlendError::unauthorized(format!(
                "{} may not deliver randomness",
                ctx.caller
            )));
        }
        let job = self.claims.job(job_id).inspect_err(|_| {
            tracing::warn!(job = %job_id, "Randomness for unknown job");
        })?;

        let outcome = resolve_pool(&job.pool, random, self.config.total_odds).ok_or_else(|| {
            BlendError::Internal(format!("{job_id} pool does not cover the draw"))
        })?;
        let consumed = job.consumed.clone();
        let ticket_id = TicketId::from(job_id);

        self.ledger
            .transfer_hold(&consumed, Hold::Job(job_id), Hold::Ticket(ticket_id))?;
        self.claims.finalize(job_id, outcome, ctx.now)?;

        tracing::info!(job = %job_id, ticket = %ticket_id, outcome = %outcome, "Claim finalized");
        Ok(Receipt::new(
            ReceiptKind::Finalized {
                ticket: ticket_id,
                outcome,
            },
            ctx.now,
        ))
    }

    /// Redeem a finalized ticket: mint its outcome, burn its items.
    ///
    /// # Errors
    /// `ReentrancyGuard`, `NotFound`, `Unauthorized` (not the requester).
    pub fn redeem_ticket(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        ticket_id: TicketId,
    ) -> Result<Receipt> {
        self.guard_reentrancy(ctx)?;
        let ticket = self.claims.ticket(ticket_id)?;
        if ticket.requester != ctx.caller {
            return Err(BlendError::unauthorized(format!(
                "{ticket_id} belongs to {}",
                ticket.requester
            )));
        }
        let template = env
            .template(&ticket.namespace, ticket.outcome)
            .ok_or_else(|| {
                BlendError::not_found(format!("{} in {}", ticket.outcome, ticket.namespace))
            })?;

        let ticket = self.claims.redeem(ticket_id)?;
        self.ledger.release(&ticket.consumed);
        self.custody.record_burn(ticket.consumed.len());

        let mut effects = Vec::with_capacity(ticket.consumed.len() + 1);
        effects.push(Effect::Mint {
            namespace: ticket.namespace.clone(),
            schema: template.schema,
            template: ticket.outcome,
            recipient: ticket.requester.clone(),
        });
        effects.extend(ticket.consumed.iter().map(|item| Effect::Burn { item: *item }));

        tracing::info!(
            ticket = %ticket_id,
            caller = %ctx.caller,
            outcome = %ticket.outcome,
            "Ticket redeemed"
        );
        Ok(Receipt::new(
            ReceiptKind::Redeemed {
                ticket: ticket_id,
                outcome: ticket.outcome,
            },
            ctx.now,
        )
        .with_effects(effects))
    }

    // -----------------------------------------------------------------------
    // Usage policy actions
    // -----------------------------------------------------------------------

    /// Recipe exists and the caller is its namespace authority.
    fn guard_policy_edit(
        &self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe: RecipeId,
    ) -> Result<()> {
        self.guard_reentrancy(ctx)?;
        self.registry.get(namespace, recipe)?;
        Self::require_authority(env, namespace, &ctx.caller)
    }

    /// # Errors
    /// Policy-edit guards, or `PolicyViolation` for `end <= start`.
    pub fn set_policy_window(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe: RecipeId,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Receipt> {
        self.guard_policy_edit(ctx, env, namespace, recipe)?;
        self.policies.set_window(namespace, recipe, start, end)?;
        Ok(Receipt::new(ReceiptKind::PolicyUpdated { recipe }, ctx.now))
    }

    /// # Errors
    /// Policy-edit guards.
    #[allow(clippy::too_many_arguments)]
    pub fn set_policy_caps(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe: RecipeId,
        max_uses: Option<u32>,
        max_uses_per_caller: Option<u32>,
        cooldown_secs: Option<u32>,
    ) -> Result<Receipt> {
        self.guard_policy_edit(ctx, env, namespace, recipe)?;
        self.policies
            .set_caps(namespace, recipe, max_uses, max_uses_per_caller, cooldown_secs);
        Ok(Receipt::new(ReceiptKind::PolicyUpdated { recipe }, ctx.now))
    }

    /// # Errors
    /// Policy-edit guards.
    pub fn set_policy_allow_list(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe: RecipeId,
        allow_list: Vec<Principal>,
    ) -> Result<Receipt> {
        self.guard_policy_edit(ctx, env, namespace, recipe)?;
        self.policies.set_allow_list(namespace, recipe, allow_list);
        Ok(Receipt::new(ReceiptKind::PolicyUpdated { recipe }, ctx.now))
    }

    /// # Errors
    /// Policy-edit guards.
    pub fn toggle_allow_list(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe: RecipeId,
        enforced: bool,
    ) -> Result<Receipt> {
        self.guard_policy_edit(ctx, env, namespace, recipe)?;
        self.policies.toggle_allow_list(namespace, recipe, enforced);
        Ok(Receipt::new(ReceiptKind::PolicyUpdated { recipe }, ctx.now))
    }

    /// Delete the policy row; counters survive.
    ///
    /// # Errors
    /// Policy-edit guards, or `NotFound` if the recipe has no policy.
    pub fn remove_policy(
        &mut self,
        ctx: &CallContext,
        env: &impl Collaborators,
        namespace: &Namespace,
        recipe: RecipeId,
    ) -> Result<Receipt> {
        self.guard_policy_edit(ctx, env, namespace, recipe)?;
        self.policies.remove_policy(namespace, recipe)?;
        tracing::info!(recipe = %recipe, "Policy removed");
        Ok(Receipt::new(ReceiptKind::PolicyRemoved { recipe }, ctx.now))
    }

    // -----------------------------------------------------------------------
    // Admin: namespace access lists
    // -----------------------------------------------------------------------

    /// # Errors
    /// `Unauthorized` unless called by the service admin; `NotFound` if the
    /// catalog has no such namespace.
    pub fn allow_namespace(
        &mut self,
        ctx: &CallContext,
        env: &impl ItemCatalog,
        namespace: &Namespace,
    ) -> Result<Receipt> {
        self.guard_admin(ctx)?;
        Self::require_namespace(env, namespace)?;
        self.access.allow(namespace);
        Ok(Self::access_receipt(ctx, namespace))
    }

    /// # Errors
    /// `Unauthorized` unless called by the service admin; `NotFound` if the
    /// catalog has no such namespace.
    pub fn deny_namespace(
        &mut self,
        ctx: &CallContext,
        env: &impl ItemCatalog,
        namespace: &Namespace,
    ) -> Result<Receipt> {
        self.guard_admin(ctx)?;
        Self::require_namespace(env, namespace)?;
        self.access.deny(namespace);
        Ok(Self::access_receipt(ctx, namespace))
    }

    /// Drop `namespace` from both lists. Works for namespaces the catalog no
    /// longer knows, so stale entries can be cleared.
    ///
    /// # Errors
    /// `Unauthorized` unless called by the service admin.
    pub fn unlist_namespace(
        &mut self,
        ctx: &CallContext,
        namespace: &Namespace,
    ) -> Result<Receipt> {
        self.guard_admin(ctx)?;
        self.access.unlist(namespace);
        Ok(Self::access_receipt(ctx, namespace))
    }

    fn access_receipt(ctx: &CallContext, namespace: &Namespace) -> Receipt {
        Receipt::new(
            ReceiptKind::AccessUpdated {
                namespace: namespace.clone(),
            },
            ctx.now,
        )
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// # Errors
    /// `NotFound` if absent.
    pub fn get_recipe(&self, namespace: &Namespace, id: RecipeId) -> Result<&Recipe> {
        self.registry.get(namespace, id)
    }

    /// Recipes of `namespace` in id order.
    pub fn recipes_in<'a>(&'a self, namespace: &'a Namespace) -> impl Iterator<Item = &'a Recipe> {
        self.registry.recipes_in(namespace)
    }

    /// Usage policy of a recipe; `Unrestricted` for unknown ids.
    #[must_use]
    pub fn policy_state(&self, namespace: &Namespace, id: RecipeId) -> PolicyState<'_> {
        self.policies.state(namespace, id)
    }

    /// Lifecycle state of the claim opened as `id`.
    #[must_use]
    pub fn claim_state(&self, id: JobId) -> Option<ClaimState> {
        self.claims.state(id)
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Read access to the escrow ledger.
    #[must_use]
    pub fn escrow(&self) -> &EscrowLedger {
        &self.ledger
    }

    /// Read access to open jobs and tickets.
    #[must_use]
    pub fn claims(&self) -> &ClaimBook {
        &self.claims
    }

    /// Read access to policies and usage counters.
    #[must_use]
    pub fn policies(&self) -> &PolicyEngine {
        &self.policies
    }

    /// Read access to the namespace access lists.
    #[must_use]
    pub fn access(&self) -> &NamespaceAccess {
        &self.access
    }

    /// Cross-check escrow, claims and custody totals.
    ///
    /// # Errors
    /// [`BlendError::Internal`] on any inconsistency.
    pub fn audit(&self) -> Result<()> {
        self.custody.verify(&self.ledger, &self.claims)
    }
}
