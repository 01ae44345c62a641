//! Error types for the OpenBlend service.
//!
//! All errors use the `OB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Recipe errors
//! - 2xx: Ingredient errors
//! - 3xx: Escrow errors
//! - 4xx: Claim / capacity errors
//! - 5xx: Usage policy errors
//! - 8xx: Security errors
//! - 9xx: General / internal errors
//!
//! Every error aborts the whole call. Nothing is retried internally.

use thiserror::Error;

use crate::ItemId;

/// Central error enum for all OpenBlend operations.
#[derive(Debug, Error)]
pub enum BlendError {
    // =================================================================
    // Recipe Errors (1xx)
    // =================================================================
    /// A recipe, job, ticket, escrow entry or catalog object is absent.
    #[error("OB_ERR_100: Not found: {what}")]
    NotFound { what: String },

    /// The recipe definition failed validation.
    #[error("OB_ERR_101: Invalid recipe: {reason}")]
    InvalidRecipe { reason: String },

    // =================================================================
    // Ingredient Errors (2xx)
    // =================================================================
    /// The supplied items do not satisfy the recipe's ingredients.
    #[error("OB_ERR_200: Ingredient mismatch: {reason}")]
    IngredientMismatch { reason: String },

    // =================================================================
    // Escrow Errors (3xx)
    // =================================================================
    /// The item is already held in escrow.
    #[error("OB_ERR_300: Item already escrowed: {0}")]
    DuplicateEscrow(ItemId),

    /// The item is held by an open claim job or unredeemed ticket.
    #[error("OB_ERR_301: Item {item} is held by {holder}")]
    EscrowLocked { item: ItemId, holder: String },

    // =================================================================
    // Claim / Capacity Errors (4xx)
    // =================================================================
    /// Outcome template production exhausted, or odds accumulation overflow.
    #[error("OB_ERR_400: Capacity exceeded: {reason}")]
    CapacityExceeded { reason: String },

    // =================================================================
    // Usage Policy Errors (5xx)
    // =================================================================
    /// Time window, cap, cooldown or allow-list failure.
    #[error("OB_ERR_500: Policy violation: {reason}")]
    PolicyViolation { reason: String },

    // =================================================================
    // Security Errors (8xx)
    // =================================================================
    /// Caller lacks namespace authority or is not the party of record.
    #[error("OB_ERR_800: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The service attempted to act on itself.
    #[error("OB_ERR_801: Reentrancy blocked: the service must not invoke its own actions")]
    ReentrancyGuard,

    /// Unparseable input such as a deposit note.
    #[error("OB_ERR_802: Malformed input: {reason}")]
    Malformed { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OB_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("OB_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl BlendError {
    /// Shorthand for [`BlendError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Shorthand for [`BlendError::Unauthorized`].
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`BlendError::InvalidRecipe`].
    pub fn invalid_recipe(reason: impl Into<String>) -> Self {
        Self::InvalidRecipe {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`BlendError::IngredientMismatch`].
    pub fn mismatch(reason: impl Into<String>) -> Self {
        Self::IngredientMismatch {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`BlendError::PolicyViolation`].
    pub fn policy(reason: impl Into<String>) -> Self {
        Self::PolicyViolation {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`BlendError::CapacityExceeded`].
    pub fn capacity(reason: impl Into<String>) -> Self {
        Self::CapacityExceeded {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BlendError>;

impl From<serde_json::Error> for BlendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
