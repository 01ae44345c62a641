//! Namespace access lists, maintained by the service admin.
//!
//! A denied namespace can neither create nor invoke recipes. When the
//! service runs with `require_allowed_namespace`, a namespace must also be
//! on the allow list. A namespace is on at most one list at a time.

use std::collections::BTreeSet;

use openblend_types::{BlendError, Namespace, Result};

/// Where a namespace stands on the access lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    Allowed,
    Denied,
    Unlisted,
}

#[derive(Debug, Default)]
pub struct NamespaceAccess {
    allowed: BTreeSet<Namespace>,
    denied: BTreeSet<Namespace>,
}

impl NamespaceAccess {
    /// Empty lists: every namespace is unlisted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `namespace` on the allow list, taking it off the deny list.
    pub fn allow(&mut self, namespace: &Namespace) {
        self.denied.remove(namespace);
        self.allowed.insert(namespace.clone());
        tracing::info!(namespace = %namespace, "Namespace allowed");
    }

    /// Put `namespace` on the deny list, taking it off the allow list.
    pub fn deny(&mut self, namespace: &Namespace) {
        self.allowed.remove(namespace);
        self.denied.insert(namespace.clone());
        tracing::warn!(namespace = %namespace, "Namespace denied");
    }

    /// Remove from both lists. Returns whether it was on either.
    pub fn unlist(&mut self, namespace: &Namespace) -> bool {
        let was_allowed = self.allowed.remove(namespace);
        let was_denied = self.denied.remove(namespace);
        tracing::info!(namespace = %namespace, "Namespace unlisted");
        was_allowed || was_denied
    }

    /// Which list, if any, `namespace` is on.
    #[must_use]
    pub fn status(&self, namespace: &Namespace) -> AccessStatus {
        if self.denied.contains(namespace) {
            AccessStatus::Denied
        } else if self.allowed.contains(namespace) {
            AccessStatus::Allowed
        } else {
            AccessStatus::Unlisted
        }
    }

    /// # Errors
    /// `Unauthorized` if the namespace is denied, or unlisted while
    /// `require_allowed` is set.
    pub fn check(&self, namespace: &Namespace, require_allowed: bool) -> Result<()> {
        match self.status(namespace) {
            AccessStatus::Denied => Err(BlendError::unauthorized(format!(
                "namespace {namespace} is denied"
            ))),
            AccessStatus::Unlisted if require_allowed => Err(BlendError::unauthorized(format!(
                "namespace {namespace} is not on the allow list"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> Namespace {
        Namespace::parse("gamecol").unwrap()
    }

    #[test]
    fn unlisted_passes_unless_required() {
        let access = NamespaceAccess::new();
        access.check(&ns(), false).unwrap();
        assert!(matches!(
            access.check(&ns(), true).unwrap_err(),
            BlendError::Unauthorized { .. }
        ));
    }

    #[test]
    fn deny_overrides_allow() {
        let mut access = NamespaceAccess::new();
        access.allow(&ns());
        access.check(&ns(), true).unwrap();
        access.deny(&ns());
        assert_eq!(access.status(&ns()), AccessStatus::Denied);
        assert!(access.check(&ns(), false).is_err());
    }

    #[test]
    fn unlist_clears_both() {
        let mut access = NamespaceAccess::new();
        access.deny(&ns());
        assert!(access.unlist(&ns()));
        assert_eq!(access.status(&ns()), AccessStatus::Unlisted);
        assert!(!access.unlist(&ns()));
    }
}
