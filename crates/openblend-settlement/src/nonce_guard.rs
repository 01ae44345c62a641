//! Nonce guard: remembers nonces this coordinator has already issued.
//!
//! The randomness provider keeps its own set of in-flight nonces, but two
//! requests issued by this service before the provider records either one
//! would collide. The guard closes that gap. Each nonce can be issued once;
//! a second attempt returns an error.
//!
//! The guard is an insertion-ordered bounded set so memory stays
//! predictable; once full, the oldest nonce is evicted.

use std::collections::{HashSet, VecDeque};

use openblend_types::{BlendError, Nonce, NonceOracle, Result, constants};

/// Bounded set of issued nonces with oldest-first eviction.
#[derive(Debug)]
pub struct NonceGuard {
    issued: HashSet<Nonce>,
    /// Insertion order for eviction (front = oldest).
    order: VecDeque<Nonce>,
    max_size: usize,
}

impl NonceGuard {
    /// Create a guard holding at most `max_size` nonces.
    ///
    /// # Panics
    /// Panics if `max_size` is zero.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "NonceGuard max_size must be > 0");
        Self {
            issued: HashSet::with_capacity(max_size.min(4_096)),
            order: VecDeque::with_capacity(max_size.min(4_096)),
            max_size,
        }
    }

    /// Record `nonce` as issued.
    ///
    /// # Errors
    /// [`BlendError::Internal`] if the nonce was already issued.
    pub fn mark_issued(&mut self, nonce: Nonce) -> Result<()> {
        if self.issued.contains(&nonce) {
            return Err(BlendError::Internal(format!("{nonce} issued twice")));
        }

        if self.issued.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.issued.remove(&oldest);
            }
        }

        self.issued.insert(nonce);
        self.order.push_back(nonce);
        Ok(())
    }

    /// Whether `nonce` was issued and not yet evicted.
    #[must_use]
    pub fn is_issued(&self, nonce: Nonce) -> bool {
        self.issued.contains(&nonce)
    }

    /// Walk upward from `start` to the first nonce neither this guard nor
    /// the provider has seen. Read-only.
    ///
    /// # Errors
    /// [`BlendError::CapacityExceeded`] after
    /// [`constants::MAX_NONCE_ATTEMPTS`] collisions in a row.
    pub fn first_free(&self, start: Nonce, oracle: &impl NonceOracle) -> Result<Nonce> {
        let mut candidate = start;
        for _ in 0..constants::MAX_NONCE_ATTEMPTS {
            if !self.is_issued(candidate) && !oracle.is_nonce_used(candidate) {
                return Ok(candidate);
            }
            tracing::warn!(nonce = %candidate, "Nonce collision, trying next");
            candidate = candidate.next();
        }
        Err(BlendError::capacity(format!(
            "no free nonce within {} attempts of {start}",
            constants::MAX_NONCE_ATTEMPTS
        )))
    }

    /// Number of remembered nonces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    /// Whether no nonce is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use openblend_types::testkit::MemoryRegistry;

    use super::*;

    #[test]
    fn first_issue_ok() {
        let mut guard = NonceGuard::new(100);
        guard.mark_issued(Nonce(1)).unwrap();
        assert!(guard.is_issued(Nonce(1)));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn double_issue_blocked() {
        let mut guard = NonceGuard::new(100);
        guard.mark_issued(Nonce(1)).unwrap();
        let err = guard.mark_issued(Nonce(1)).unwrap_err();
        assert!(matches!(err, BlendError::Internal(_)), "got: {err:?}");
    }

    #[test]
    fn evicts_oldest() {
        let mut guard = NonceGuard::new(3);
        for n in 1..=4 {
            guard.mark_issued(Nonce(n)).unwrap();
        }
        assert_eq!(guard.len(), 3);
        assert!(!guard.is_issued(Nonce(1)), "oldest should have been evicted");
        assert!(guard.is_issued(Nonce(4)));
    }

    #[test]
    fn first_free_skips_local_and_provider_nonces() {
        let mut guard = NonceGuard::new(10);
        let mut provider = MemoryRegistry::new();
        guard.mark_issued(Nonce(5)).unwrap();
        provider.mark_nonce_used(Nonce(6));
        assert_eq!(guard.first_free(Nonce(5), &provider).unwrap(), Nonce(7));
        assert_eq!(guard.first_free(Nonce(9), &provider).unwrap(), Nonce(9));
    }

    #[test]
    fn first_free_wraps_at_max() {
        let guard = NonceGuard::new(10);
        let mut provider = MemoryRegistry::new();
        provider.mark_nonce_used(Nonce(u64::MAX));
        assert_eq!(guard.first_free(Nonce(u64::MAX), &provider).unwrap(), Nonce(0));
    }

    #[test]
    fn first_free_gives_up() {
        let guard = NonceGuard::new(10);
        let mut provider = MemoryRegistry::new();
        for n in 0..u64::from(constants::MAX_NONCE_ATTEMPTS) {
            provider.mark_nonce_used(Nonce(n));
        }
        let err = guard.first_free(Nonce(0), &provider).unwrap_err();
        assert!(matches!(err, BlendError::CapacityExceeded { .. }));
    }

    #[test]
    #[should_panic(expected = "max_size must be > 0")]
    fn zero_max_size_panics() {
        let _ = NonceGuard::new(0);
    }
}
