//! # openblend-matchcore
//!
//! **Pure compute plane for OpenBlend.**
//!
//! MatchCore decides whether a batch of supplied items satisfies a recipe
//! and, for multi-outcome recipes, which outcome a delivered random value
//! selects. It has:
//!
//! - **Zero side effects**: no escrow writes, no policy state, no effects
//! - **Deterministic output**: same items and same random bytes give the
//!   same answer every time
//! - **One aggregate error**: a rejected batch reports every failing
//!   position at once and consumes nothing

pub mod matcher;
pub mod randomness;
pub mod selection;

pub use matcher::{match_blend, match_ingredients, match_recipe, match_swap};
pub use randomness::{RandomnessProvider, derive_nonce};
pub use selection::{resolve_pool, select_outcome};
