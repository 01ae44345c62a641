//! Custody conservation checker.
//!
//! Invariants checked by [`CustodyAudit::verify`]:
//! ```text
//! |escrow| == deposited - refunded - purged - burned
//! every held entry  → an open job or unredeemed ticket with that item
//! every job/ticket  → all of its items in escrow, held by it
//! ```
//!
//! Together these say a deposited item is never lost, never consumed twice
//! and never held by a claim that no longer exists. A violation is a bug in
//! the coordinator, not a user error.

use openblend_ingress::EscrowLedger;
use openblend_types::{BlendError, Hold, Result};

use crate::ClaimBook;

/// Running totals of items entering and leaving custody.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CustodyAudit {
    deposited: u64,
    refunded: u64,
    purged: u64,
    burned: u64,
}

impl CustodyAudit {
    /// All counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items entered custody.
    pub fn record_deposit(&mut self, items: usize) {
        self.deposited += items as u64;
    }

    /// Items returned to their depositor.
    pub fn record_refund(&mut self, items: usize) {
        self.refunded += items as u64;
    }

    /// Items dropped by an admin purge.
    pub fn record_purge(&mut self, items: usize) {
        self.purged += items as u64;
    }

    /// Items consumed by a resolution or redemption.
    pub fn record_burn(&mut self, items: usize) {
        self.burned += items as u64;
    }

    /// Items that should currently be in escrow.
    #[must_use]
    pub fn expected_in_custody(&self) -> u64 {
        self.deposited
            .saturating_sub(self.refunded)
            .saturating_sub(self.purged)
            .saturating_sub(self.burned)
    }

    /// Check the ledger and claim book against each other and the totals.
    ///
    /// # Errors
    /// [`BlendError::Internal`] describing the first violation.
    pub fn verify(&self, ledger: &EscrowLedger, claims: &ClaimBook) -> Result<()> {
        let actual = ledger.len() as u64;
        let expected = self.expected_in_custody();
        if actual != expected {
            return Err(BlendError::Internal(format!(
                "custody holds {actual} items, expected {expected} \
                 (deposited={}, refunded={}, purged={}, burned={})",
                self.deposited, self.refunded, self.purged, self.burned
            )));
        }

        for entry in ledger.iter() {
            let claimed = match entry.hold {
                None => continue,
                Some(Hold::Job(id)) => claims
                    .job(id)
                    .is_ok_and(|job| job.consumed.contains(&entry.item)),
                Some(Hold::Ticket(id)) => claims
                    .ticket(id)
                    .is_ok_and(|ticket| ticket.consumed.contains(&entry.item)),
            };
            if !claimed {
                return Err(BlendError::Internal(format!(
                    "{} is held by a missing claim",
                    entry.item
                )));
            }
        }

        let expectations = claims
            .jobs()
            .map(|job| (Hold::Job(job.id), &job.consumed))
            .chain(
                claims
                    .tickets()
                    .map(|ticket| (Hold::Ticket(ticket.id), &ticket.consumed)),
            );
        for (hold, items) in expectations {
            for item in items {
                let held = ledger.get(*item).and_then(|e| e.hold);
                if held != Some(hold) {
                    return Err(BlendError::Internal(format!(
                        "{hold} consumes {item}, but escrow shows {held:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use openblend_types::{
        ClaimJob, ItemId, JobId, Namespace, Nonce, OutcomeEntry, OutcomePool, Principal,
        RecipeId, TemplateId,
    };

    use super::*;

    fn alice() -> Principal {
        Principal::parse("alice").unwrap()
    }

    fn ns() -> Namespace {
        Namespace::parse("gamecol").unwrap()
    }

    #[test]
    fn balanced_after_deposit_and_refund() {
        let mut ledger = EscrowLedger::new();
        let mut audit = CustodyAudit::new();
        let claims = ClaimBook::new(1);
        ledger
            .deposit(&alice(), &ns(), &[ItemId(1), ItemId(2)], Utc::now())
            .unwrap();
        audit.record_deposit(2);
        audit.verify(&ledger, &claims).unwrap();

        ledger.release(&[ItemId(1)]);
        audit.record_refund(1);
        audit.verify(&ledger, &claims).unwrap();
        assert_eq!(audit.expected_in_custody(), 1);
    }

    #[test]
    fn lost_item_detected() {
        let mut ledger = EscrowLedger::new();
        let mut audit = CustodyAudit::new();
        ledger
            .deposit(&alice(), &ns(), &[ItemId(1)], Utc::now())
            .unwrap();
        audit.record_deposit(1);
        ledger.release(&[ItemId(1)]);
        let err = audit.verify(&ledger, &ClaimBook::new(1)).unwrap_err();
        assert!(matches!(err, BlendError::Internal(_)));
    }

    #[test]
    fn orphaned_hold_detected() {
        let mut ledger = EscrowLedger::new();
        let mut audit = CustodyAudit::new();
        ledger
            .deposit(&alice(), &ns(), &[ItemId(1)], Utc::now())
            .unwrap();
        audit.record_deposit(1);
        ledger.hold(&[ItemId(1)], Hold::Job(JobId(1))).unwrap();
        assert!(audit.verify(&ledger, &ClaimBook::new(1)).is_err());

        let mut claims = ClaimBook::new(1);
        claims
            .open(ClaimJob {
                id: JobId(1),
                recipe_id: RecipeId(1),
                requester: alice(),
                namespace: ns(),
                consumed: vec![ItemId(1)],
                pool: OutcomePool::new(vec![
                    OutcomeEntry::new(50, TemplateId(1)),
                    OutcomeEntry::new(50, TemplateId(2)),
                ]),
                nonce: Nonce(0),
                opened_at: Utc::now(),
            })
            .unwrap();
        audit.verify(&ledger, &claims).unwrap();
    }
}
