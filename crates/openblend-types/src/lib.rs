//! # openblend-types
//!
//! Shared types, errors, and configuration for the **OpenBlend** crafting
//! service.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Principal`], [`Namespace`], [`ItemId`], [`TemplateId`], [`RecipeId`], [`JobId`], [`TicketId`], [`Nonce`], [`TxId`]
//! - **Recipe model**: [`Recipe`], [`RecipeKind`], [`IngredientSpec`], [`OutcomePool`], [`Outcome`]
//! - **Escrow model**: [`EscrowEntry`], [`Hold`]
//! - **Claim model**: [`ClaimJob`], [`ClaimTicket`], [`ClaimState`]
//! - **Usage policy**: [`UsagePolicy`], [`UsageStats`], [`CallerUsage`], [`PolicyState`]
//! - **Catalog snapshots**: [`AssetInfo`], [`TemplateInfo`], [`SchemaInfo`]
//! - **Collaborators**: [`ItemCatalog`], [`AuthorityOracle`], [`NonceOracle`], [`CallContext`]
//! - **Receipts**: [`Receipt`], [`ReceiptKind`], [`Effect`]
//! - **Configuration**: [`ServiceConfig`]
//! - **Errors**: [`BlendError`] with `OB_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod catalog;
pub mod claim;
pub mod collab;
pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod ids;
pub mod policy;
pub mod receipt;
pub mod recipe;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testkit;

// Re-export all primary types at crate root for ergonomic imports:
//   use openblend_types::{Recipe, EscrowEntry, ClaimJob, Effect, ...};

pub use catalog::*;
pub use claim::*;
pub use collab::*;
pub use config::*;
pub use error::*;
pub use escrow::*;
pub use ids::*;
pub use policy::*;
pub use receipt::*;
pub use recipe::*;

// Constants are accessed via `openblend_types::constants::FOO`
// (not re-exported to avoid name collisions).
