//! Identifiers used throughout OpenBlend.
//!
//! Account-like identities ([`Principal`], [`Namespace`]) follow the
//! registry's 12-character name grammar: `[a-z1-5.]`, non-empty, never
//! ending in a dot. Numeric ids are plain newtypes; the ones this service
//! allocates ([`RecipeId`], [`JobId`]) are handed out by monotonic counters.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BlendError, constants};

// ---------------------------------------------------------------------------
// Name grammar
// ---------------------------------------------------------------------------

/// Validate a registry name against the account-name grammar.
///
/// # Errors
/// Returns [`BlendError::Malformed`] describing the first violation.
pub fn validate_name(raw: &str) -> crate::Result<()> {
    if raw.is_empty() {
        return Err(BlendError::Malformed {
            reason: "name is empty".to_string(),
        });
    }
    if raw.len() > constants::MAX_NAME_LEN {
        return Err(BlendError::Malformed {
            reason: format!(
                "name '{raw}' is {} chars, max {}",
                raw.len(),
                constants::MAX_NAME_LEN
            ),
        });
    }
    if let Some(bad) = raw
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '1'..='5' | '.'))
    {
        return Err(BlendError::Malformed {
            reason: format!("name '{raw}' contains invalid character {bad:?}"),
        });
    }
    if raw.ends_with('.') {
        return Err(BlendError::Malformed {
            reason: format!("name '{raw}' must not end with '.'"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// An authenticated account acting on the service (author, depositor,
/// requester, or the service itself).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Parse and validate an account name.
    ///
    /// # Errors
    /// Returns [`BlendError::Malformed`] if the name breaks the grammar.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        validate_name(raw)?;
        Ok(Self(raw.to_string()))
    }

    /// Built-in names known to satisfy the grammar.
    pub(crate) fn from_static(raw: &'static str) -> Self {
        debug_assert!(validate_name(raw).is_ok(), "bad built-in name {raw}");
        Self(raw.to_string())
    }

    /// The validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Principal {
    type Err = BlendError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = BlendError;

    fn try_from(value: String) -> crate::Result<Self> {
        validate_name(&value)?;
        Ok(Self(value))
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// The collection / issuer scope that recipes and items belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Parse and validate a namespace name.
    ///
    /// # Errors
    /// Returns [`BlendError::Malformed`] if the name breaks the grammar.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        validate_name(raw)?;
        Ok(Self(raw.to_string()))
    }

    /// The validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Namespace {
    type Err = BlendError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = BlendError;

    fn try_from(value: String) -> crate::Result<Self> {
        validate_name(&value)?;
        Ok(Self(value))
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SchemaName
// ---------------------------------------------------------------------------

/// Name of a schema inside a namespace's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SchemaName(pub String);

impl SchemaName {
    /// Wrap a schema name as given; schemas are not validated here.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Registry-issued numeric ids
// ---------------------------------------------------------------------------

/// Id of an individual item in the external registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item:{}", self.0)
    }
}

/// Id of an item template in the external registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmpl:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Service-allocated ids
// ---------------------------------------------------------------------------

/// Recipe identifier, unique within its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RecipeId(pub u64);

impl RecipeId {
    /// The id after this one.
    ///
    /// # Errors
    /// [`BlendError::CapacityExceeded`] once the recipe counter is exhausted.
    pub fn next(self) -> crate::Result<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| BlendError::capacity("recipe ids exhausted"))
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recipe:{}", self.0)
    }
}

/// Identifier of a pending claim job awaiting randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl JobId {
    /// The id after this one.
    ///
    /// # Errors
    /// [`BlendError::CapacityExceeded`] once the claim job counter is exhausted.
    pub fn next(self) -> crate::Result<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| BlendError::capacity("claim job ids exhausted"))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job:{}", self.0)
    }
}

/// Identifier of a resolved, unredeemed claim.
///
/// A ticket carries the numeric id of the job it was finalized from, so a
/// requester who knows their job id knows which ticket to redeem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TicketId(pub u64);

impl From<JobId> for TicketId {
    fn from(job: JobId) -> Self {
        Self(job.0)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket:{}", self.0)
    }
}

/// Per-request nonce sent to the randomness collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Nonce(pub u64);

impl Nonce {
    /// The next candidate when searching for an unused nonce. Wraps at `u64::MAX`.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nonce:{:016x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TxId
// ---------------------------------------------------------------------------

/// Identifier of the enclosing transaction. Unique per call; UUIDv7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxId(pub Uuid);

impl TxId {
    /// A fresh UUIDv7 transaction id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Rebuild a transaction id from its raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Raw bytes, as hashed into the request nonce.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_parse() {
        for raw in ["alice", "shomai.blend", "a", "abcde12345.z"] {
            assert!(Namespace::parse(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn invalid_names_rejected() {
        for raw in ["", "Alice", "thirteenchars", "has space", "six6", "trail."] {
            let err = Namespace::parse(raw).unwrap_err();
            assert!(
                matches!(err, BlendError::Malformed { .. }),
                "{raw} should be malformed, got {err:?}"
            );
        }
    }

    #[test]
    fn principal_from_str() {
        let p: Principal = "bob".parse().unwrap();
        assert_eq!(p.as_str(), "bob");
        assert_eq!(p.to_string(), "bob");
    }

    #[test]
    fn name_serde_rejects_bad_input() {
        let ok: Namespace = serde_json::from_str("\"gamecol\"").unwrap();
        assert_eq!(ok.as_str(), "gamecol");
        assert!(serde_json::from_str::<Namespace>("\"NOPE\"").is_err());
    }

    #[test]
    fn counters_advance() {
        assert_eq!(RecipeId(100_000).next().unwrap(), RecipeId(100_001));
        assert_eq!(JobId(7).next().unwrap(), JobId(8));
        assert_eq!(TicketId::from(JobId(9)), TicketId(9));
    }

    #[test]
    fn counters_do_not_wrap() {
        assert!(matches!(
            RecipeId(u64::MAX).next().unwrap_err(),
            BlendError::CapacityExceeded { .. }
        ));
        assert!(matches!(
            JobId(u64::MAX).next().unwrap_err(),
            BlendError::CapacityExceeded { .. }
        ));
    }

    #[test]
    fn nonce_wraps() {
        assert_eq!(Nonce(u64::MAX).next(), Nonce(0));
    }

    #[test]
    fn tx_ids_unique() {
        assert_ne!(TxId::new(), TxId::new());
    }
}
