//! Claim book: open jobs, finalized tickets and redeemed ticket ids.
//!
//! ```text
//!   open(job) ──▶ jobs[id]
//!   finalize(id) ──▶ jobs[id] erased, tickets[id] inserted
//!   redeem(id)   ──▶ tickets[id] erased, redeemed += id
//! ```
//!
//! Job ids come from a monotonic counter and are never reused. Every move
//! goes through [`ClaimState::can_transition_to`]; a job or ticket that is
//! not in the source state is reported as `NotFound`, so a repeated
//! callback or a second redemption fails the same way as an unknown id.
//!
//! Redeemed ids only answer [`ClaimBook::state`] queries. The history is
//! bounded; once full, the lowest id is forgotten and reports `None`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use openblend_types::{
    BlendError, ClaimJob, ClaimState, ClaimTicket, JobId, Result, TemplateId, TicketId,
    constants,
};

#[derive(Debug)]
pub struct ClaimBook {
    jobs: BTreeMap<JobId, ClaimJob>,
    tickets: BTreeMap<TicketId, ClaimTicket>,
    redeemed: BTreeSet<TicketId>,
    redeemed_cap: usize,
    next_job: JobId,
}

impl ClaimBook {
    /// An empty book whose first job gets `id_start`.
    #[must_use]
    pub fn new(id_start: u64) -> Self {
        Self::with_history(id_start, constants::REDEEMED_HISTORY)
    }

    /// Like [`ClaimBook::new`], remembering at most `redeemed_cap` redeemed
    /// ids.
    ///
    /// # Panics
    /// Panics if `redeemed_cap` is zero.
    #[must_use]
    pub fn with_history(id_start: u64, redeemed_cap: usize) -> Self {
        assert!(redeemed_cap > 0, "ClaimBook redeemed_cap must be > 0");
        Self {
            jobs: BTreeMap::new(),
            tickets: BTreeMap::new(),
            redeemed: BTreeSet::new(),
            redeemed_cap,
            next_job: JobId(id_start),
        }
    }

    /// The id the next opened job will receive.
    #[must_use]
    pub fn peek_next_id(&self) -> JobId {
        self.next_job
    }

    /// Store a job under the next id.
    ///
    /// # Errors
    /// - [`BlendError::Internal`] if `job.id` is not the next id
    /// - [`BlendError::CapacityExceeded`] if the id counter is exhausted
    pub fn open(&mut self, job: ClaimJob) -> Result<JobId> {
        if job.id != self.next_job {
            return Err(BlendError::Internal(format!(
                "job opened as {}, expected {}",
                job.id, self.next_job
            )));
        }
        let id = job.id;
        self.next_job = id.next()?;
        self.jobs.insert(id, job);
        Ok(id)
    }

    /// # Errors
    /// `NotFound` if no job is open under `id`.
    pub fn job(&self, id: JobId) -> Result<&ClaimJob> {
        self.jobs
            .get(&id)
            .ok_or_else(|| BlendError::not_found(format!("claim {id}")))
    }

    /// Fail unless the claim opened as `id` may move to `target`.
    fn check_transition(&self, id: JobId, target: ClaimState) -> Result<()> {
        match self.state(id) {
            Some(from) if from.can_transition_to(target) => Ok(()),
            Some(from) => Err(BlendError::not_found(format!(
                "claim {id} is {from}, cannot become {target}"
            ))),
            None => Err(BlendError::not_found(format!("claim {id}"))),
        }
    }

    /// Turn an open job into a ticket for `outcome`.
    ///
    /// # Errors
    /// `NotFound` if no job is open under `id`.
    pub fn finalize(
        &mut self,
        id: JobId,
        outcome: TemplateId,
        now: DateTime<Utc>,
    ) -> Result<&ClaimTicket> {
        self.check_transition(id, ClaimState::Finalized)?;
        let job = self
            .jobs
            .remove(&id)
            .ok_or_else(|| BlendError::not_found(format!("claim {id}")))?;
        let ticket = ClaimTicket::from_job(job, outcome, now);
        let ticket_id = ticket.id;
        Ok(self.tickets.entry(ticket_id).or_insert(ticket))
    }

    /// # Errors
    /// `NotFound` if there is no unredeemed ticket under `id`.
    pub fn ticket(&self, id: TicketId) -> Result<&ClaimTicket> {
        self.tickets
            .get(&id)
            .ok_or_else(|| BlendError::not_found(format!("{id}")))
    }

    /// Erase a ticket after its outcome is minted.
    ///
    /// # Errors
    /// `NotFound` if there is no unredeemed ticket under `id`.
    pub fn redeem(&mut self, id: TicketId) -> Result<ClaimTicket> {
        self.check_transition(JobId(id.0), ClaimState::Redeemed)?;
        let ticket = self
            .tickets
            .remove(&id)
            .ok_or_else(|| BlendError::not_found(format!("{id}")))?;
        if self.redeemed.len() >= self.redeemed_cap {
            self.redeemed.pop_first();
        }
        self.redeemed.insert(id);
        Ok(ticket)
    }

    /// Lifecycle state of the claim opened as `id`. `None` for unknown ids
    /// and for redeemed ids that fell out of the history.
    #[must_use]
    pub fn state(&self, id: JobId) -> Option<ClaimState> {
        let ticket = TicketId::from(id);
        if self.jobs.contains_key(&id) {
            Some(ClaimState::Pending)
        } else if self.tickets.contains_key(&ticket) {
            Some(ClaimState::Finalized)
        } else if self.redeemed.contains(&ticket) {
            Some(ClaimState::Redeemed)
        } else {
            None
        }
    }

    /// Open jobs in id order.
    pub fn jobs(&self) -> impl Iterator<Item = &ClaimJob> {
        self.jobs.values()
    }

    /// Unredeemed tickets in id order.
    pub fn tickets(&self) -> impl Iterator<Item = &ClaimTicket> {
        self.tickets.values()
    }

    /// Number of jobs waiting on randomness.
    #[must_use]
    pub fn open_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Number of finalized, unredeemed tickets.
    #[must_use]
    pub fn open_tickets(&self) -> usize {
        self.tickets.len()
    }
}

#[cfg(test)]
mod tests {
    use openblend_types::{ItemId, Namespace, Nonce, OutcomeEntry, OutcomePool, Principal, RecipeId};

    use super::*;

    fn job(id: u64) -> ClaimJob {
        ClaimJob {
            id: JobId(id),
            recipe_id: RecipeId(100_000),
            requester: Principal::parse("alice").unwrap(),
            namespace: Namespace::parse("gamecol").unwrap(),
            consumed: vec![ItemId(1)],
            pool: OutcomePool::new(vec![
                OutcomeEntry::new(60, TemplateId(1)),
                OutcomeEntry::new(40, TemplateId(2)),
            ]),
            nonce: Nonce(id),
            opened_at: Utc::now(),
        }
    }

    #[test]
    fn lifecycle() {
        let mut book = ClaimBook::new(100_000);
        let id = book.open(job(100_000)).unwrap();
        assert_eq!(book.state(id), Some(ClaimState::Pending));
        assert_eq!(book.peek_next_id(), JobId(100_001));

        let ticket = book.finalize(id, TemplateId(2), Utc::now()).unwrap().id;
        assert_eq!(ticket, TicketId(100_000));
        assert_eq!(book.state(id), Some(ClaimState::Finalized));
        assert_eq!(book.open_jobs(), 0);

        book.redeem(ticket).unwrap();
        assert_eq!(book.state(id), Some(ClaimState::Redeemed));
        assert_eq!(book.open_tickets(), 0);
    }

    #[test]
    fn second_finalize_is_not_found() {
        let mut book = ClaimBook::new(100_000);
        let id = book.open(job(100_000)).unwrap();
        book.finalize(id, TemplateId(1), Utc::now()).unwrap();
        assert!(matches!(
            book.finalize(id, TemplateId(1), Utc::now()).unwrap_err(),
            BlendError::NotFound { .. }
        ));
    }

    #[test]
    fn out_of_sequence_open_rejected() {
        let mut book = ClaimBook::new(100_000);
        assert!(book.open(job(7)).is_err());
        assert_eq!(book.open_jobs(), 0);
    }

    #[test]
    fn redeem_unknown_ticket() {
        let mut book = ClaimBook::new(1);
        assert!(matches!(
            book.redeem(TicketId(1)).unwrap_err(),
            BlendError::NotFound { .. }
        ));
        assert_eq!(book.state(JobId(1)), None);
    }

    #[test]
    fn redeem_before_finalize_rejected() {
        let mut book = ClaimBook::new(100_000);
        let id = book.open(job(100_000)).unwrap();
        assert!(matches!(
            book.redeem(TicketId::from(id)).unwrap_err(),
            BlendError::NotFound { .. }
        ));
        assert_eq!(book.state(id), Some(ClaimState::Pending));
    }

    #[test]
    fn finalize_after_redeem_rejected() {
        let mut book = ClaimBook::new(100_000);
        let id = book.open(job(100_000)).unwrap();
        book.finalize(id, TemplateId(1), Utc::now()).unwrap();
        book.redeem(TicketId::from(id)).unwrap();
        let err = book.finalize(id, TemplateId(2), Utc::now()).unwrap_err();
        assert!(err.to_string().contains("REDEEMED"), "{err}");
        assert_eq!(book.state(id), Some(ClaimState::Redeemed));
    }

    #[test]
    fn redeemed_history_is_bounded() {
        let mut book = ClaimBook::with_history(1, 2);
        for n in 1..=3 {
            let id = book.open(job(n)).unwrap();
            book.finalize(id, TemplateId(1), Utc::now()).unwrap();
            book.redeem(TicketId::from(id)).unwrap();
        }
        assert_eq!(book.state(JobId(1)), None);
        assert_eq!(book.state(JobId(2)), Some(ClaimState::Redeemed));
        assert_eq!(book.state(JobId(3)), Some(ClaimState::Redeemed));
    }

    #[test]
    fn exhausted_job_counter() {
        let mut book = ClaimBook::new(u64::MAX);
        let err = book.open(job(u64::MAX)).unwrap_err();
        assert!(matches!(err, BlendError::CapacityExceeded { .. }));
        assert_eq!(book.open_jobs(), 0);
        assert_eq!(book.peek_next_id(), JobId(u64::MAX));
    }
}
