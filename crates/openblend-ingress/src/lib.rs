//! # openblend-ingress
//!
//! **Entry plane**: custody of deposited items, recipe definitions, usage
//! policies and namespace access lists.
//!
//! ## Architecture
//!
//! The entry plane holds every piece of state an invocation must validate
//! against before MatchCore runs:
//! 1. **EscrowLedger**: which deposited item belongs to whom, and whether a
//!    claim currently holds it
//! 2. **RecipeRegistry**: validated recipes with per-namespace id counters
//! 3. **PolicyEngine**: hard gate for windows, caps, cooldowns, allow-lists
//! 4. **NamespaceAccess**: admin allow/deny lists
//!
//! ## Invocation Flow
//!
//! ```text
//! deposit → EscrowLedger.deposit()
//! invoke  → NamespaceAccess.check() → EscrowLedger.check_owned()
//!         → PolicyEngine.check() → MatchCore → Settlement
//! ```
//!
//! None of these components emit effects; the settlement coordinator does.

pub mod access;
pub mod escrow;
pub mod policy_engine;
pub mod registry;

pub use access::{AccessStatus, NamespaceAccess};
pub use escrow::{EscrowLedger, find_duplicate, parse_note};
pub use policy_engine::PolicyEngine;
pub use registry::{RecipeRegistry, validate_definition};
