//! Receipts and outbound effects.
//!
//! Every successful action returns a [`Receipt`]. Calls to collaborators
//! (mint, burn, transfer, request randomness) are never made directly; they
//! are listed as [`Effect`]s in the receipt and the host dispatches them
//! after the call commits. A failed action returns an error and no effects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ItemId, JobId, Namespace, Nonce, Principal, RecipeId, SchemaName, TemplateId, TicketId,
};

/// A one-way send to a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Mint one item from `template` to `recipient`.
    Mint {
        namespace: Namespace,
        schema: SchemaName,
        template: TemplateId,
        recipient: Principal,
    },
    /// Burn an item held by the service.
    Burn { item: ItemId },
    /// Transfer items from the service back to `recipient`.
    Transfer {
        recipient: Principal,
        items: Vec<ItemId>,
        note: String,
    },
    /// Ask the randomness provider for a value keyed by `nonce`, to be
    /// delivered back for `job`.
    RequestRandom { job: JobId, nonce: Nonce },
}

/// What an action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReceiptKind {
    Deposited { items: Vec<ItemId> },
    /// A deposit from the service itself, which is not escrowed.
    DepositIgnored,
    Refunded { items: Vec<ItemId> },
    Purged { items: Vec<ItemId> },
    RecipeCreated { recipe: RecipeId },
    RecipeRemoved { recipe: RecipeId },
    /// Resolved in the same call.
    Resolved { recipe: RecipeId, outcome: TemplateId },
    /// Waiting for randomness.
    Pending { recipe: RecipeId, job: JobId },
    Finalized { ticket: TicketId, outcome: TemplateId },
    Redeemed { ticket: TicketId, outcome: TemplateId },
    PolicyUpdated { recipe: RecipeId },
    PolicyRemoved { recipe: RecipeId },
    AccessUpdated { namespace: Namespace },
}

impl std::fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Deposited { .. } => "DEPOSITED",
            Self::DepositIgnored => "DEPOSIT_IGNORED",
            Self::Refunded { .. } => "REFUNDED",
            Self::Purged { .. } => "PURGED",
            Self::RecipeCreated { .. } => "RECIPE_CREATED",
            Self::RecipeRemoved { .. } => "RECIPE_REMOVED",
            Self::Resolved { .. } => "RESOLVED",
            Self::Pending { .. } => "PENDING",
            Self::Finalized { .. } => "FINALIZED",
            Self::Redeemed { .. } => "REDEEMED",
            Self::PolicyUpdated { .. } => "POLICY_UPDATED",
            Self::PolicyRemoved { .. } => "POLICY_REMOVED",
            Self::AccessUpdated { .. } => "ACCESS_UPDATED",
        };
        f.write_str(label)
    }
}

/// Result of one committed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub kind: ReceiptKind,
    /// Sends to dispatch, in order.
    pub effects: Vec<Effect>,
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    /// A receipt with no effects.
    #[must_use]
    pub fn new(kind: ReceiptKind, issued_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            effects: Vec::new(),
            issued_at,
        }
    }

    /// Attach the effects the host must dispatch, in order.
    #[must_use]
    pub fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }

    /// Number of `Mint` effects.
    #[must_use]
    pub fn mints(&self) -> usize {
        self.effects
            .iter()
            .filter(|e| matches!(e, Effect::Mint { .. }))
            .count()
    }

    /// Items burned by this receipt, in order.
    #[must_use]
    pub fn burned(&self) -> Vec<ItemId> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::Burn { item } => Some(*item),
                _ => None,
            })
            .collect()
    }
}
