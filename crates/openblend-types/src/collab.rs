//! Collaborator seams.
//!
//! OpenBlend reads from three external services and writes to them only by
//! returning [`crate::Effect`]s. Each trait is the read half of one
//! collaborator:
//!
//! - [`ItemCatalog`]: the item registry (items, templates, schemas)
//! - [`AuthorityOracle`]: "may this principal act for this namespace?"
//! - [`NonceOracle`]: the randomness provider's shared nonce-dedup set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AssetInfo, ItemId, Namespace, Nonce, Principal, SchemaInfo, SchemaName, TemplateId,
    TemplateInfo, TxId,
};

/// Read access to the item registry.
pub trait ItemCatalog {
    fn namespace_exists(&self, namespace: &Namespace) -> bool;
    fn asset(&self, item: ItemId) -> Option<AssetInfo>;
    fn template(&self, namespace: &Namespace, template: TemplateId) -> Option<TemplateInfo>;
    fn schema(&self, namespace: &Namespace, schema: &SchemaName) -> Option<SchemaInfo>;
}

/// Answers whether a principal is authorized to act for a namespace.
pub trait AuthorityOracle {
    fn is_authorized(&self, namespace: &Namespace, principal: &Principal) -> bool;
}

/// The randomness provider's view of nonces already in flight.
pub trait NonceOracle {
    fn is_nonce_used(&self, nonce: Nonce) -> bool;
}

/// Every read-side collaborator at once, as the coordinator sees them.
pub trait Collaborators: ItemCatalog + AuthorityOracle + NonceOracle {}

impl<T: ItemCatalog + AuthorityOracle + NonceOracle> Collaborators for T {}

/// Authenticated facts about the current call, supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The authenticated caller.
    pub caller: Principal,
    /// Id of the enclosing transaction; unique per call.
    pub tx_id: TxId,
    /// Block time of the call.
    pub now: DateTime<Utc>,
}

impl CallContext {
    /// A context with explicit transaction id and block time.
    #[must_use]
    pub fn new(caller: Principal, tx_id: TxId, now: DateTime<Utc>) -> Self {
        Self { caller, tx_id, now }
    }

    /// A context for `caller` with a fresh transaction id at the current time.
    #[must_use]
    pub fn now(caller: Principal) -> Self {
        Self::new(caller, TxId::new(), Utc::now())
    }

    /// Block time in unix seconds.
    #[must_use]
    pub fn unix_now(&self) -> i64 {
        self.now.timestamp()
    }
}
