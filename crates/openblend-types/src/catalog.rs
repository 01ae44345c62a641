//! Read-side view of the external item registry.
//!
//! The registry owns items, templates and schemas. OpenBlend never writes to
//! it directly; it reads these snapshots through [`crate::ItemCatalog`] and
//! sends [`crate::Effect`]s for mint, burn and transfer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ItemId, Namespace, Principal, SchemaName, TemplateId};

/// A single item as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub id: ItemId,
    pub namespace: Namespace,
    pub schema: SchemaName,
    /// Items minted without a template carry `None`.
    pub template: Option<TemplateId>,
    pub owner: Principal,
    /// Immutable attributes, template data merged with item data.
    pub attributes: BTreeMap<String, String>,
}

impl AssetInfo {
    /// Look up an immutable attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A template and its supply counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub namespace: Namespace,
    pub schema: SchemaName,
    pub transferable: bool,
    pub burnable: bool,
    /// Hard production cap. `0` means uncapped.
    pub max_supply: u32,
    pub issued_supply: u32,
}

impl TemplateInfo {
    /// Whether the template carries a hard production cap.
    #[must_use]
    pub fn is_capped(&self) -> bool {
        self.max_supply != 0
    }

    /// Whether one more item can be minted from this template.
    #[must_use]
    pub fn can_mint(&self) -> bool {
        !self.is_capped() || self.issued_supply < self.max_supply
    }
}

/// A schema and the attribute keys its format declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub namespace: Namespace,
    pub name: SchemaName,
    pub format: Vec<String>,
}

impl SchemaInfo {
    /// Whether the schema format declares `key`.
    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.format.iter().any(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(max: u32, issued: u32) -> TemplateInfo {
        TemplateInfo {
            id: TemplateId(1),
            namespace: Namespace::parse("gamecol").unwrap(),
            schema: SchemaName::new("heroes"),
            transferable: true,
            burnable: true,
            max_supply: max,
            issued_supply: issued,
        }
    }

    #[test]
    fn uncapped_template_always_mints() {
        let t = template(0, 1_000_000);
        assert!(!t.is_capped());
        assert!(t.can_mint());
    }

    #[test]
    fn capped_template_exhausts() {
        assert!(template(10, 9).can_mint());
        assert!(!template(10, 10).can_mint());
    }

    #[test]
    fn schema_attribute_lookup() {
        let s = SchemaInfo {
            namespace: Namespace::parse("gamecol").unwrap(),
            name: SchemaName::new("heroes"),
            format: vec!["name".into(), "rarity".into()],
        };
        assert!(s.has_attribute("rarity"));
        assert!(!s.has_attribute("power"));
    }
}
