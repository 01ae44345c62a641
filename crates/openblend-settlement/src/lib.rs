//! # openblend-settlement
//!
//! **Finality plane**: the coordinator that runs every service action,
//! the claim book for randomness-deferred invocations, the nonce guard,
//! and the custody audit.
//!
//! ## Architecture
//!
//! The [`Coordinator`] receives an action from the host and:
//! 1. Validates it against the entry plane (escrow, registry, policies)
//! 2. Runs MatchCore to pick the consumed items
//! 3. Resolves immediately, or opens a claim job and requests randomness
//! 4. Returns a [`Receipt`](openblend_types::Receipt) listing the effects
//!    the host must dispatch
//!
//! ## Two-Phase Resolution
//!
//! - **Phase 1**: `invoke_recipe` holds the items and emits `RequestRandom`
//! - **Phase 2**: `receive_random` selects the outcome and issues a ticket;
//!   `redeem_ticket` mints it and burns the held items

pub mod claims;
pub mod coordinator;
pub mod custody;
pub mod nonce_guard;

pub use claims::ClaimBook;
pub use coordinator::Coordinator;
pub use custody::CustodyAudit;
pub use nonce_guard::NonceGuard;
