//! In-memory collaborators for tests. **Never use in production.**
//!
//! [`MemoryRegistry`] stands in for the item registry, the authority oracle
//! and the randomness provider's nonce set at once. [`MemoryRegistry::apply`]
//! plays back the effects of a receipt so tests can observe supply, burns
//! and transfers the way the real collaborators would perform them.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::{
    AssetInfo, AuthorityOracle, Effect, ItemCatalog, ItemId, Namespace, Nonce, NonceOracle,
    Principal, SchemaInfo, SchemaName, TemplateId, TemplateInfo,
};

/// Item registry, authority oracle and nonce set in one struct.
#[derive(Debug, Default, Clone)]
pub struct MemoryRegistry {
    namespaces: HashMap<Namespace, BTreeSet<Principal>>,
    schemas: HashMap<(Namespace, SchemaName), SchemaInfo>,
    templates: HashMap<(Namespace, TemplateId), TemplateInfo>,
    assets: BTreeMap<ItemId, AssetInfo>,
    used_nonces: HashSet<Nonce>,
    burned: Vec<ItemId>,
    next_item: u64,
}

impl MemoryRegistry {
    /// An empty registry; item ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_item: 1,
            ..Self::default()
        }
    }

    /// Register a namespace with the given authorized principals.
    pub fn add_namespace(&mut self, namespace: &Namespace, authorized: &[&Principal]) {
        self.namespaces
            .entry(namespace.clone())
            .or_default()
            .extend(authorized.iter().map(|p| (*p).clone()));
    }

    /// Register a schema with its attribute keys.
    pub fn add_schema(&mut self, namespace: &Namespace, name: &str, format: &[&str]) {
        let schema = SchemaName::new(name);
        self.schemas.insert(
            (namespace.clone(), schema.clone()),
            SchemaInfo {
                namespace: namespace.clone(),
                name: schema,
                format: format.iter().map(|k| (*k).to_string()).collect(),
            },
        );
    }

    /// Add a transferable, burnable template. `max_supply == 0` is uncapped.
    pub fn add_template(&mut self, namespace: &Namespace, id: u32, schema: &str, max_supply: u32) {
        self.templates.insert(
            (namespace.clone(), TemplateId(id)),
            TemplateInfo {
                id: TemplateId(id),
                namespace: namespace.clone(),
                schema: SchemaName::new(schema),
                transferable: true,
                burnable: true,
                max_supply,
                issued_supply: 0,
            },
        );
    }

    /// Mutable access to a template for flag tweaks.
    pub fn template_mut(&mut self, namespace: &Namespace, id: u32) -> Option<&mut TemplateInfo> {
        self.templates.get_mut(&(namespace.clone(), TemplateId(id)))
    }

    /// Mint an item directly to `owner`, bypassing effects.
    pub fn mint_to(
        &mut self,
        owner: &Principal,
        namespace: &Namespace,
        schema: &str,
        template: Option<u32>,
        attributes: &[(&str, &str)],
    ) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        if let Some(t) = template {
            if let Some(info) = self.templates.get_mut(&(namespace.clone(), TemplateId(t))) {
                info.issued_supply += 1;
            }
        }
        self.assets.insert(
            id,
            AssetInfo {
                id,
                namespace: namespace.clone(),
                schema: SchemaName::new(schema),
                template: template.map(TemplateId),
                owner: owner.clone(),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            },
        );
        id
    }

    /// Move an item to a new owner.
    pub fn transfer(&mut self, item: ItemId, to: &Principal) {
        if let Some(asset) = self.assets.get_mut(&item) {
            asset.owner = to.clone();
        }
    }

    /// Record a nonce as in flight on the provider side.
    pub fn mark_nonce_used(&mut self, nonce: Nonce) {
        self.used_nonces.insert(nonce);
    }

    /// Play back effects as the collaborators would.
    pub fn apply(&mut self, effects: &[Effect]) -> Vec<ItemId> {
        let mut minted = Vec::new();
        for effect in effects {
            match effect {
                Effect::Mint {
                    namespace,
                    schema,
                    template,
                    recipient,
                } => {
                    minted.push(self.mint_to(
                        recipient,
                        namespace,
                        &schema.0,
                        Some(template.0),
                        &[],
                    ));
                }
                Effect::Burn { item } => {
                    self.assets.remove(item);
                    self.burned.push(*item);
                }
                Effect::Transfer {
                    recipient, items, ..
                } => {
                    for item in items {
                        self.transfer(*item, recipient);
                    }
                }
                Effect::RequestRandom { nonce, .. } => {
                    self.used_nonces.insert(*nonce);
                }
            }
        }
        minted
    }

    /// Current owner, `None` once burned or never minted.
    #[must_use]
    pub fn owner_of(&self, item: ItemId) -> Option<&Principal> {
        self.assets.get(&item).map(|a| &a.owner)
    }

    /// Whether `item` was burned.
    #[must_use]
    pub fn is_burned(&self, item: ItemId) -> bool {
        self.burned.contains(&item)
    }

    /// Items minted so far from `template`.
    #[must_use]
    pub fn issued(&self, namespace: &Namespace, template: u32) -> u32 {
        self.templates
            .get(&(namespace.clone(), TemplateId(template)))
            .map_or(0, |t| t.issued_supply)
    }
}

impl ItemCatalog for MemoryRegistry {
    fn namespace_exists(&self, namespace: &Namespace) -> bool {
        self.namespaces.contains_key(namespace)
    }

    fn asset(&self, item: ItemId) -> Option<AssetInfo> {
        self.assets.get(&item).cloned()
    }

    fn template(&self, namespace: &Namespace, template: TemplateId) -> Option<TemplateInfo> {
        self.templates.get(&(namespace.clone(), template)).cloned()
    }

    fn schema(&self, namespace: &Namespace, schema: &SchemaName) -> Option<SchemaInfo> {
        self.schemas.get(&(namespace.clone(), schema.clone())).cloned()
    }
}

impl AuthorityOracle for MemoryRegistry {
    fn is_authorized(&self, namespace: &Namespace, principal: &Principal) -> bool {
        self.namespaces
            .get(namespace)
            .is_some_and(|set| set.contains(principal))
    }
}

impl NonceOracle for MemoryRegistry {
    fn is_nonce_used(&self, nonce: Nonce) -> bool {
        self.used_nonces.contains(&nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> Namespace {
        Namespace::parse("gamecol").unwrap()
    }

    #[test]
    fn apply_mint_bumps_supply() {
        let mut reg = MemoryRegistry::new();
        let alice = Principal::parse("alice").unwrap();
        reg.add_namespace(&ns(), &[&alice]);
        reg.add_template(&ns(), 3, "heroes", 0);
        let minted = reg.apply(&[Effect::Mint {
            namespace: ns(),
            schema: SchemaName::new("heroes"),
            template: TemplateId(3),
            recipient: alice.clone(),
        }]);
        assert_eq!(minted.len(), 1);
        assert_eq!(reg.issued(&ns(), 3), 1);
        assert_eq!(reg.owner_of(minted[0]), Some(&alice));
    }

    #[test]
    fn apply_burn_removes_asset() {
        let mut reg = MemoryRegistry::new();
        let alice = Principal::parse("alice").unwrap();
        let item = reg.mint_to(&alice, &ns(), "heroes", None, &[]);
        reg.apply(&[Effect::Burn { item }]);
        assert!(reg.asset(item).is_none());
        assert!(reg.is_burned(item));
    }

    #[test]
    fn authority_is_per_namespace() {
        let mut reg = MemoryRegistry::new();
        let alice = Principal::parse("alice").unwrap();
        let bob = Principal::parse("bob").unwrap();
        reg.add_namespace(&ns(), &[&alice]);
        assert!(reg.is_authorized(&ns(), &alice));
        assert!(!reg.is_authorized(&ns(), &bob));
    }
}
