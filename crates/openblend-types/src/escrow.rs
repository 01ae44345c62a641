//! Escrow entries: items held in custody pending consumption or refund.
//!
//! An entry is created when the registry moves an item into the service's
//! custody with a namespace note, and deleted when the item is burned by a
//! resolution or transferred back by a refund.
//!
//! ## Holds
//!
//! ```text
//!   ┌────────┐ deferred invoke ┌───────────┐  callback  ┌──────────────┐
//!   │  FREE  ├────────────────▶│ Job(id)   ├───────────▶│ Ticket(id)   │
//!   └───┬────┘                 └───────────┘            └──────┬───────┘
//!       │ refund / immediate invoke                            │ redeem
//!       ▼                                                      ▼
//!    (entry deleted)                                     (entry deleted)
//! ```
//!
//! A held entry cannot be refunded or used by another invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ItemId, JobId, Namespace, Principal, TicketId};

/// What currently owns an escrowed item besides its depositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hold {
    /// Consumed by a claim job waiting on randomness.
    Job(JobId),
    /// Consumed by a finalized, unredeemed ticket.
    Ticket(TicketId),
}

impl std::fmt::Display for Hold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Job(id) => write!(f, "{id}"),
            Self::Ticket(id) => write!(f, "{id}"),
        }
    }
}

/// One item in custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEntry {
    pub item: ItemId,
    pub depositor: Principal,
    /// Namespace named by the deposit note.
    pub namespace: Namespace,
    pub hold: Option<Hold>,
    pub deposited_at: DateTime<Utc>,
}

impl EscrowEntry {
    /// A free entry.
    #[must_use]
    pub fn new(
        item: ItemId,
        depositor: Principal,
        namespace: Namespace,
        deposited_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item,
            depositor,
            namespace,
            hold: None,
            deposited_at,
        }
    }

    /// Whether the entry is free to refund or consume.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.hold.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_free() {
        let entry = EscrowEntry::new(
            ItemId(1),
            Principal::parse("alice").unwrap(),
            Namespace::parse("gamecol").unwrap(),
            Utc::now(),
        );
        assert!(entry.is_free());
    }

    #[test]
    fn hold_display() {
        assert_eq!(Hold::Job(JobId(5)).to_string(), "job:5");
        assert_eq!(Hold::Ticket(TicketId(5)).to_string(), "ticket:5");
    }

    #[test]
    fn serde_roundtrip() {
        let mut entry = EscrowEntry::new(
            ItemId(77),
            Principal::parse("bob").unwrap(),
            Namespace::parse("gamecol").unwrap(),
            Utc::now(),
        );
        entry.hold = Some(Hold::Job(JobId(100_000)));
        let json = serde_json::to_string(&entry).unwrap();
        let back: EscrowEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
