//! # Claims: the two halves of a deferred resolution
//!
//! A multi-outcome invocation opens a [`ClaimJob`]. The randomness callback
//! turns it into a [`ClaimTicket`]. The requester redeems the ticket.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  receive_random  ┌───────────┐  redeem  ┌──────────┐
//!   │ PENDING ├─────────────────▶│ FINALIZED ├─────────▶│ REDEEMED │
//!   └─────────┘                  └───────────┘          └──────────┘
//! ```
//!
//! Transitions are monotonic. A job row is erased exactly once, so a
//! repeated callback for the same id finds nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ItemId, JobId, Namespace, Nonce, OutcomePool, Principal, RecipeId, TemplateId, TicketId,
};

/// Lifecycle state of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimState {
    /// Waiting for the randomness callback.
    Pending,
    /// Outcome chosen; waiting for the requester to redeem.
    Finalized,
    /// Minted and burned. Terminal.
    Redeemed,
}

impl ClaimState {
    /// Can this claim move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Finalized) | (Self::Finalized, Self::Redeemed)
        )
    }
}

impl std::fmt::Display for ClaimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Finalized => write!(f, "FINALIZED"),
            Self::Redeemed => write!(f, "REDEEMED"),
        }
    }
}

/// An outcome pending an external random value.
///
/// The pool is snapshotted at invocation so that removing the recipe while
/// the job is open cannot strand the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimJob {
    pub id: JobId,
    pub recipe_id: RecipeId,
    pub requester: Principal,
    pub namespace: Namespace,
    pub consumed: Vec<ItemId>,
    pub pool: OutcomePool,
    pub nonce: Nonce,
    pub opened_at: DateTime<Utc>,
}

/// A resolved, unredeemed outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTicket {
    pub id: TicketId,
    pub recipe_id: RecipeId,
    pub requester: Principal,
    pub namespace: Namespace,
    pub outcome: TemplateId,
    pub consumed: Vec<ItemId>,
    pub finalized_at: DateTime<Utc>,
}

impl ClaimTicket {
    /// Finalize `job` with the selected `outcome`.
    #[must_use]
    pub fn from_job(job: ClaimJob, outcome: TemplateId, finalized_at: DateTime<Utc>) -> Self {
        Self {
            id: TicketId::from(job.id),
            recipe_id: job.recipe_id,
            requester: job.requester,
            namespace: job.namespace,
            outcome,
            consumed: job.consumed,
            finalized_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutcomeEntry;

    #[test]
    fn state_transitions_valid() {
        assert!(ClaimState::Pending.can_transition_to(ClaimState::Finalized));
        assert!(ClaimState::Finalized.can_transition_to(ClaimState::Redeemed));
    }

    #[test]
    fn state_transitions_invalid() {
        assert!(!ClaimState::Pending.can_transition_to(ClaimState::Redeemed));
        assert!(!ClaimState::Finalized.can_transition_to(ClaimState::Pending));
        assert!(!ClaimState::Redeemed.can_transition_to(ClaimState::Pending));
        assert!(!ClaimState::Redeemed.can_transition_to(ClaimState::Finalized));
    }

    #[test]
    fn ticket_inherits_job_fields() {
        let job = ClaimJob {
            id: JobId(100_003),
            recipe_id: RecipeId(100_000),
            requester: Principal::parse("alice").unwrap(),
            namespace: Namespace::parse("gamecol").unwrap(),
            consumed: vec![ItemId(1), ItemId(2)],
            pool: OutcomePool::new(vec![
                OutcomeEntry::new(60, TemplateId(10)),
                OutcomeEntry::new(40, TemplateId(11)),
            ]),
            nonce: Nonce(42),
            opened_at: Utc::now(),
        };
        let ticket = ClaimTicket::from_job(job.clone(), TemplateId(11), Utc::now());
        assert_eq!(ticket.id, TicketId(100_003));
        assert_eq!(ticket.requester, job.requester);
        assert_eq!(ticket.consumed, job.consumed);
        assert_eq!(ticket.outcome, TemplateId(11));
    }

    #[test]
    fn state_display() {
        assert_eq!(ClaimState::Pending.to_string(), "PENDING");
        assert_eq!(ClaimState::Redeemed.to_string(), "REDEEMED");
    }
}
