//! Configuration for an OpenBlend service instance.

use serde::{Deserialize, Serialize};

use crate::{BlendError, Principal, Result, constants};

/// Configuration for a single OpenBlend deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// The account the service runs as. Items in escrow are owned by it,
    /// and it must never be the caller of its own user-facing actions.
    pub service_account: Principal,
    /// Account allowed to run administrative actions (access lists, escrow
    /// purges). Usually the service account itself.
    pub admin_account: Principal,
    /// The only identity allowed to deliver randomness callbacks.
    pub randomness_account: Principal,
    /// First recipe id allocated in each namespace.
    pub recipe_id_start: u64,
    /// First claim job id allocated by the coordinator.
    pub claim_id_start: u64,
    /// Denominator multi-outcome pools must sum to.
    pub total_odds: u32,
    /// Maximum length of the namespace carried in a deposit note.
    pub max_note_len: usize,
    /// How many issued nonces the coordinator remembers.
    pub nonce_guard_capacity: usize,
    /// If set, a namespace must be on the allow list to create or invoke
    /// recipes. The deny list applies either way.
    pub require_allowed_namespace: bool,
}

impl ServiceConfig {
    /// Parse a config from JSON. Missing fields fall back to defaults.
    ///
    /// # Errors
    /// Returns [`BlendError::Configuration`] if the JSON is invalid or the
    /// resulting config fails [`ServiceConfig::validate`].
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the config for internal consistency.
    ///
    /// # Errors
    /// Returns [`BlendError::Configuration`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.total_odds == 0 {
            return Err(BlendError::Configuration(
                "total_odds must be > 0".to_string(),
            ));
        }
        if self.max_note_len == 0 || self.max_note_len > constants::MAX_NAME_LEN {
            return Err(BlendError::Configuration(format!(
                "max_note_len must be in 1..={}",
                constants::MAX_NAME_LEN
            )));
        }
        if self.nonce_guard_capacity == 0 {
            return Err(BlendError::Configuration(
                "nonce_guard_capacity must be > 0".to_string(),
            ));
        }
        if self.randomness_account == self.service_account {
            return Err(BlendError::Configuration(
                "randomness_account must differ from service_account".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let service = Principal::from_static("openblend");
        Self {
            admin_account: service.clone(),
            service_account: service,
            randomness_account: Principal::from_static("orng.wax"),
            recipe_id_start: constants::DEFAULT_RECIPE_ID_START,
            claim_id_start: constants::DEFAULT_CLAIM_ID_START,
            total_odds: constants::TOTAL_ODDS,
            max_note_len: constants::MAX_NAME_LEN,
            nonce_guard_capacity: constants::DEFAULT_NONCE_GUARD_CAPACITY,
            require_allowed_namespace: false,
        }
    }
}
