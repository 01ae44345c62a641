//! Escrow ledger: custody of deposited items.
//!
//! The ledger is the single source of truth for "who may use this item
//! right now". An item appears in at most one entry. Entries are created by
//! deposit notifications, locked by claim jobs and tickets, and removed by
//! refunds, resolutions and purges.
//!
//! Every mutating method validates its whole input before touching the map,
//! so a rejected call leaves the ledger unchanged.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use openblend_types::{
    BlendError, EscrowEntry, Hold, ItemId, Namespace, Principal, Result, constants,
};

/// Parse a deposit note into the namespace it names.
///
/// # Errors
/// [`BlendError::Malformed`] if the note is longer than `max_len` or breaks
/// the name grammar. Padding is not stripped.
pub fn parse_note(note: &str, max_len: usize) -> Result<Namespace> {
    if note.len() > max_len.min(constants::MAX_NAME_LEN) {
        return Err(BlendError::Malformed {
            reason: format!("deposit note '{note}' is longer than {max_len} chars"),
        });
    }
    Namespace::parse(note)
}

/// First id that occurs twice in `items`, if any.
#[must_use]
pub fn find_duplicate(items: &[ItemId]) -> Option<ItemId> {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().copied().find(|id| !seen.insert(*id))
}

/// Items in custody, keyed by item id.
#[derive(Debug, Default)]
pub struct EscrowLedger {
    entries: BTreeMap<ItemId, EscrowEntry>,
}

impl EscrowLedger {
    /// An empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch of deposited items.
    ///
    /// # Errors
    /// [`BlendError::DuplicateEscrow`] if any id is already escrowed or
    /// repeated within the batch. Nothing is recorded in that case.
    pub fn deposit(
        &mut self,
        depositor: &Principal,
        namespace: &Namespace,
        items: &[ItemId],
        now: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(dup) = find_duplicate(items) {
            return Err(BlendError::DuplicateEscrow(dup));
        }
        if let Some(existing) = items.iter().find(|id| self.entries.contains_key(id)) {
            return Err(BlendError::DuplicateEscrow(*existing));
        }

        for id in items {
            self.entries.insert(
                *id,
                EscrowEntry::new(*id, depositor.clone(), namespace.clone(), now),
            );
        }
        tracing::info!(
            depositor = %depositor,
            namespace = %namespace,
            items = items.len(),
            "Items escrowed"
        );
        Ok(())
    }

    /// Check that every item is escrowed by `caller` under `namespace` and
    /// not held by a job or ticket.
    ///
    /// # Errors
    /// - `NotFound` if an item has no entry
    /// - `Unauthorized` if the depositor or namespace differs
    /// - `EscrowLocked` if the entry is held
    pub fn check_owned(
        &self,
        caller: &Principal,
        namespace: &Namespace,
        items: &[ItemId],
    ) -> Result<()> {
        for id in items {
            let entry = self
                .entries
                .get(id)
                .ok_or_else(|| BlendError::not_found(format!("escrow entry for {id}")))?;
            if &entry.depositor != caller {
                return Err(BlendError::unauthorized(format!(
                    "{id} was not deposited by {caller}"
                )));
            }
            if &entry.namespace != namespace {
                return Err(BlendError::unauthorized(format!(
                    "{id} is escrowed for {}, not {namespace}",
                    entry.namespace
                )));
            }
            if let Some(hold) = entry.hold {
                return Err(BlendError::EscrowLocked {
                    item: *id,
                    holder: hold.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Lock free items for a job or ticket.
    ///
    /// # Errors
    /// `NotFound` or `EscrowLocked` if any item is missing or already held;
    /// nothing is locked in that case.
    pub fn hold(&mut self, items: &[ItemId], hold: Hold) -> Result<()> {
        for id in items {
            match self.entries.get(id) {
                None => return Err(BlendError::not_found(format!("escrow entry for {id}"))),
                Some(EscrowEntry {
                    hold: Some(current),
                    ..
                }) => {
                    return Err(BlendError::EscrowLocked {
                        item: *id,
                        holder: current.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        for id in items {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.hold = Some(hold);
            }
        }
        tracing::debug!(holder = %hold, items = items.len(), "Escrow entries held");
        Ok(())
    }

    /// Move items held by `from` to `to`.
    ///
    /// # Errors
    /// [`BlendError::Internal`] if an item is missing or held by someone
    /// else; the ledger is unchanged in that case.
    pub fn transfer_hold(&mut self, items: &[ItemId], from: Hold, to: Hold) -> Result<()> {
        for id in items {
            let current = self.entries.get(id).and_then(|e| e.hold);
            if current != Some(from) {
                return Err(BlendError::Internal(format!(
                    "{id} expected to be held by {from}, found {current:?}"
                )));
            }
        }
        for id in items {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.hold = Some(to);
            }
        }
        Ok(())
    }

    /// Remove entries, returning what was removed. Missing ids are skipped.
    pub fn release(&mut self, items: &[ItemId]) -> Vec<EscrowEntry> {
        items
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .collect()
    }

    /// Drop every unheld entry of `depositor` without returning the items.
    pub fn purge(&mut self, depositor: &Principal) -> Vec<ItemId> {
        let doomed: Vec<ItemId> = self
            .entries
            .values()
            .filter(|e| &e.depositor == depositor && e.is_free())
            .map(|e| e.item)
            .collect();
        for id in &doomed {
            self.entries.remove(id);
        }
        tracing::warn!(depositor = %depositor, items = doomed.len(), "Escrow purged");
        doomed
    }

    /// Entry for `item`, if escrowed.
    #[must_use]
    pub fn get(&self, item: ItemId) -> Option<&EscrowEntry> {
        self.entries.get(&item)
    }

    /// Whether `item` is escrowed.
    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        self.entries.contains_key(&item)
    }

    /// Entries deposited by `depositor`, in item-id order.
    pub fn entries_of<'a>(
        &'a self,
        depositor: &'a Principal,
    ) -> impl Iterator<Item = &'a EscrowEntry> + 'a {
        self.entries.values().filter(move |e| &e.depositor == depositor)
    }

    /// Items currently held by `hold`.
    #[must_use]
    pub fn held_by(&self, hold: Hold) -> Vec<ItemId> {
        self.entries
            .values()
            .filter(|e| e.hold == Some(hold))
            .map(|e| e.item)
            .collect()
    }

    /// All entries in item-id order.
    pub fn iter(&self) -> impl Iterator<Item = &EscrowEntry> {
        self.entries.values()
    }

    /// Number of escrowed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is in custody.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use openblend_types::{JobId, TicketId};

    use super::*;

    fn alice() -> Principal {
        Principal::parse("alice").unwrap()
    }

    fn ns() -> Namespace {
        Namespace::parse("gamecol").unwrap()
    }

    fn ledger_with(items: &[u64]) -> EscrowLedger {
        let mut ledger = EscrowLedger::new();
        let ids: Vec<ItemId> = items.iter().map(|i| ItemId(*i)).collect();
        ledger.deposit(&alice(), &ns(), &ids, Utc::now()).unwrap();
        ledger
    }

    #[test]
    fn note_parsing() {
        assert_eq!(parse_note("gamecol", 12).unwrap(), ns());
        assert!(matches!(
            parse_note("waytoolongname", 12).unwrap_err(),
            BlendError::Malformed { .. }
        ));
        assert!(matches!(
            parse_note("Bad!", 12).unwrap_err(),
            BlendError::Malformed { .. }
        ));
        assert!(parse_note("gamecol", 4).is_err());
    }

    #[test]
    fn padded_note_rejected() {
        for note in ["  gamecol \n", " gamecol", "gamecol\t", ""] {
            assert!(
                matches!(parse_note(note, 12), Err(BlendError::Malformed { .. })),
                "{note:?} should be malformed"
            );
        }
    }

    #[test]
    fn deposit_then_lookup() {
        let ledger = ledger_with(&[1, 2]);
        assert_eq!(ledger.len(), 2);
        let entry = ledger.get(ItemId(1)).unwrap();
        assert_eq!(entry.depositor, alice());
        assert!(entry.is_free());
    }

    #[test]
    fn duplicate_deposit_rejected_atomically() {
        let mut ledger = ledger_with(&[1]);
        let err = ledger
            .deposit(&alice(), &ns(), &[ItemId(2), ItemId(1)], Utc::now())
            .unwrap_err();
        assert!(matches!(err, BlendError::DuplicateEscrow(ItemId(1))));
        assert!(!ledger.contains(ItemId(2)));
    }

    #[test]
    fn repeated_id_in_batch_rejected() {
        let mut ledger = EscrowLedger::new();
        let err = ledger
            .deposit(&alice(), &ns(), &[ItemId(3), ItemId(3)], Utc::now())
            .unwrap_err();
        assert!(matches!(err, BlendError::DuplicateEscrow(ItemId(3))));
        assert!(ledger.is_empty());
    }

    #[test]
    fn check_owned_errors() {
        let ledger = ledger_with(&[1]);
        let bob = Principal::parse("bob").unwrap();
        assert!(matches!(
            ledger.check_owned(&alice(), &ns(), &[ItemId(9)]).unwrap_err(),
            BlendError::NotFound { .. }
        ));
        assert!(matches!(
            ledger.check_owned(&bob, &ns(), &[ItemId(1)]).unwrap_err(),
            BlendError::Unauthorized { .. }
        ));
        let other = Namespace::parse("othercol").unwrap();
        assert!(matches!(
            ledger.check_owned(&alice(), &other, &[ItemId(1)]).unwrap_err(),
            BlendError::Unauthorized { .. }
        ));
        ledger.check_owned(&alice(), &ns(), &[ItemId(1)]).unwrap();
    }

    #[test]
    fn held_entries_are_locked() {
        let mut ledger = ledger_with(&[1, 2]);
        ledger.hold(&[ItemId(1)], Hold::Job(JobId(7))).unwrap();
        assert!(matches!(
            ledger.check_owned(&alice(), &ns(), &[ItemId(1)]).unwrap_err(),
            BlendError::EscrowLocked { .. }
        ));
        // Second hold on a batch containing a held item changes nothing.
        assert!(ledger.hold(&[ItemId(2), ItemId(1)], Hold::Job(JobId(8))).is_err());
        assert!(ledger.get(ItemId(2)).unwrap().is_free());
    }

    #[test]
    fn transfer_hold_moves_job_to_ticket() {
        let mut ledger = ledger_with(&[1, 2]);
        let items = [ItemId(1), ItemId(2)];
        ledger.hold(&items, Hold::Job(JobId(7))).unwrap();
        ledger
            .transfer_hold(&items, Hold::Job(JobId(7)), Hold::Ticket(TicketId(7)))
            .unwrap();
        assert_eq!(ledger.held_by(Hold::Ticket(TicketId(7))), items.to_vec());
        assert!(
            ledger
                .transfer_hold(&items, Hold::Job(JobId(7)), Hold::Ticket(TicketId(8)))
                .is_err()
        );
    }

    #[test]
    fn purge_skips_held_entries() {
        let mut ledger = ledger_with(&[1, 2, 3]);
        ledger.hold(&[ItemId(2)], Hold::Job(JobId(1))).unwrap();
        let purged = ledger.purge(&alice());
        assert_eq!(purged, vec![ItemId(1), ItemId(3)]);
        assert!(ledger.contains(ItemId(2)));
    }

    #[test]
    fn release_removes_entries() {
        let mut ledger = ledger_with(&[1, 2]);
        let released = ledger.release(&[ItemId(1)]);
        assert_eq!(released.len(), 1);
        assert!(!ledger.contains(ItemId(1)));
        assert_eq!(ledger.entries_of(&alice()).count(), 1);
    }

    #[test]
    fn find_duplicate_detects_repeat() {
        assert_eq!(find_duplicate(&[ItemId(1), ItemId(2)]), None);
        assert_eq!(
            find_duplicate(&[ItemId(1), ItemId(2), ItemId(1)]),
            Some(ItemId(1))
        );
    }
}
