//! System-wide constants for the OpenBlend service.

/// Denominator that multi-outcome pool weights must sum to.
pub const TOTAL_ODDS: u32 = 100;

/// Maximum length of a registry name (accounts, namespaces, deposit notes).
pub const MAX_NAME_LEN: usize = 12;

/// First recipe id handed out in a namespace.
pub const DEFAULT_RECIPE_ID_START: u64 = 100_000;

/// First claim job id handed out by the coordinator.
pub const DEFAULT_CLAIM_ID_START: u64 = 100_000;

/// Issued nonces remembered by the coordinator before the oldest is evicted.
pub const DEFAULT_NONCE_GUARD_CAPACITY: usize = 100_000;

/// Redeemed ticket ids kept for state queries before the lowest is evicted.
pub const REDEEMED_HISTORY: usize = 100_000;

/// Upper bound on nonce attempts per invocation before giving up.
pub const MAX_NONCE_ATTEMPTS: u32 = 1_024;

/// Note attached to refund transfers.
pub const REFUND_NOTE: &str = "nft refund from openblend";

/// Domain separator for nonce derivation.
pub const NONCE_DOMAIN: &[u8] = b"openblend:nonce:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name.
pub const SERVICE_NAME: &str = "OpenBlend";
