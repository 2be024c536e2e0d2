//! Item catalog
//!
//! Inventories never own item metadata. They resolve an [`ItemId`] through an
//! injected [`ItemCatalog`] whenever weight, value or stackability matters.
//! Lookups are synchronous; an implementation backed by streamed assets is
//! expected to bound its wait and report `None` on timeout.

use crate::error::CatalogError;
use crate::item::{ItemDefinition, ItemId, ItemStack, Tag};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Resolves item ids to their static definitions
pub trait ItemCatalog: Send + Sync {
    /// Look up a definition. Repeat calls are idempotent.
    fn resolve(&self, id: &ItemId) -> Option<Arc<ItemDefinition>>;

    /// Release a loaded definition
    fn unload(&self, _id: &ItemId) {}

    /// Release every loaded definition
    fn unload_all(&self) {}
}

/// Shared handle to a catalog
pub type SharedCatalog = Arc<dyn ItemCatalog>;

/// Field matched by [`MemoryCatalog::search`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    /// Display name
    Name,
    /// Item id
    Id,
    /// Item type name
    Type,
}

/// In-memory catalog.
///
/// Definitions are registered up front; a definition counts as loaded from its
/// first resolution until it is unloaded.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    definitions: HashMap<ItemId, Arc<ItemDefinition>>,
    loaded: RwLock<HashSet<ItemId>>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration; later definitions replace earlier ones
    pub fn with_definition(mut self, definition: ItemDefinition) -> Self {
        self.definitions
            .insert(definition.id.clone(), Arc::new(definition));
        self
    }

    /// Register a definition
    pub fn register(&mut self, definition: ItemDefinition) -> Result<(), CatalogError> {
        if !definition.id.is_valid() {
            return Err(CatalogError::InvalidId);
        }
        if self.definitions.contains_key(&definition.id) {
            return Err(CatalogError::Duplicate(definition.id));
        }
        self.definitions
            .insert(definition.id.clone(), Arc::new(definition));
        Ok(())
    }

    /// Build a catalog from a JSON array of definitions
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<ItemDefinition> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.register(definition)?;
        }
        log::debug!("Loaded {} item definitions", catalog.len());
        Ok(catalog)
    }

    /// Load a catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedCatalog {
        Arc::new(self)
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All registered ids, sorted
    pub fn all_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.definitions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether a definition is currently loaded
    pub fn is_loaded(&self, id: &ItemId) -> bool {
        self.loaded.read().contains(id)
    }

    /// Number of loaded definitions
    pub fn loaded_count(&self) -> usize {
        self.loaded.read().len()
    }

    /// Case-insensitive substring search over every registered definition.
    /// Results are ordered by id.
    pub fn search(&self, search_type: SearchType, needle: &str) -> Vec<Arc<ItemDefinition>> {
        let needle = needle.to_lowercase();
        self.all_ids()
            .iter()
            .filter_map(|id| self.resolve(id))
            .filter(|definition| {
                let haystack = match search_type {
                    SearchType::Name => definition.name.to_lowercase(),
                    SearchType::Id => definition.id.as_str().to_lowercase(),
                    SearchType::Type => definition.item_type.as_str().to_lowercase(),
                };
                haystack.contains(&needle)
            })
            .collect()
    }
}

impl ItemCatalog for MemoryCatalog {
    fn resolve(&self, id: &ItemId) -> Option<Arc<ItemDefinition>> {
        let definition = self.definitions.get(id)?;
        self.loaded.write().insert(id.clone());
        Some(Arc::clone(definition))
    }

    fn unload(&self, id: &ItemId) {
        self.loaded.write().remove(id);
    }

    fn unload_all(&self) {
        self.loaded.write().clear();
    }
}

/// Metadata of the stack's definition (empty if unresolved)
pub fn item_metadata(catalog: &dyn ItemCatalog, stack: &ItemStack) -> HashMap<Tag, String> {
    catalog
        .resolve(&stack.item_id)
        .map(|definition| definition.metadata.clone())
        .unwrap_or_default()
}

/// Relations of the stack's definition (empty if unresolved)
pub fn item_relations(catalog: &dyn ItemCatalog, stack: &ItemStack) -> HashMap<Tag, Vec<ItemId>> {
    catalog
        .resolve(&stack.item_id)
        .map(|definition| definition.relations.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_definition(
                ItemDefinition::new("iron_sword", "Iron Sword")
                    .with_type(ItemType::Weapon)
                    .non_stackable()
                    .with_relation("Craft.Requires", vec![ItemId::new("iron_ingot")]),
            )
            .with_definition(
                ItemDefinition::new("iron_ingot", "Iron Ingot")
                    .with_type(ItemType::Material)
                    .with_weight(2.0)
                    .with_metadata("Origin", "Forge"),
            )
            .with_definition(ItemDefinition::new("apple", "Red Apple").with_type(ItemType::Consumable))
    }

    #[test]
    fn test_resolve_marks_loaded() {
        let catalog = catalog();
        let id = ItemId::new("iron_ingot");
        assert!(!catalog.is_loaded(&id));

        let definition = catalog.resolve(&id).unwrap();
        assert_eq!(definition.weight, 2.0);
        assert!(catalog.is_loaded(&id));

        catalog.unload(&id);
        assert!(!catalog.is_loaded(&id));

        assert!(catalog.resolve(&ItemId::new("missing")).is_none());
    }

    #[test]
    fn test_unload_all() {
        let catalog = catalog();
        for id in catalog.all_ids() {
            catalog.resolve(&id);
        }
        assert_eq!(catalog.loaded_count(), 3);

        catalog.unload_all();
        assert_eq!(catalog.loaded_count(), 0);
    }

    #[test]
    fn test_search() {
        let catalog = catalog();

        let by_name = catalog.search(SearchType::Name, "IRON");
        assert_eq!(by_name.len(), 2);
        assert_eq!(by_name[0].id, ItemId::new("iron_ingot"));

        let by_type = catalog.search(SearchType::Type, "consum");
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].name, "Red Apple");

        assert!(catalog.search(SearchType::Id, "gold").is_empty());
    }

    #[test]
    fn test_register_duplicate() {
        let mut catalog = catalog();
        let result = catalog.register(ItemDefinition::new("apple", "Green Apple"));
        assert!(matches!(result, Err(CatalogError::Duplicate(_))));

        let result = catalog.register(ItemDefinition::new("", "Nothing"));
        assert!(matches!(result, Err(CatalogError::InvalidId)));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            { "id": "arrow", "name": "Arrow", "item_type": "Weapon", "weight": 0.1 },
            { "id": "shield", "name": "Shield", "stackable": false, "weight": 6.0 }
        ]"#;

        let catalog = MemoryCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let arrow = catalog.resolve(&ItemId::new("arrow")).unwrap();
        assert!(arrow.is_stackable());
        assert_eq!(arrow.item_type, ItemType::Weapon);

        let shield = catalog.resolve(&ItemId::new("shield")).unwrap();
        assert!(!shield.is_stackable());
    }

    #[test]
    fn test_metadata_and_relations() {
        let catalog = catalog();

        let metadata = item_metadata(&catalog, &ItemStack::single("iron_ingot"));
        assert_eq!(metadata.get(&Tag::new("Origin")).map(String::as_str), Some("Forge"));

        let relations = item_relations(&catalog, &ItemStack::single("iron_sword"));
        assert_eq!(
            relations.get(&Tag::new("Craft.Requires")),
            Some(&vec![ItemId::new("iron_ingot")])
        );

        assert!(item_metadata(&catalog, &ItemStack::single("missing")).is_empty());
    }
}
