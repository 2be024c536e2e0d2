//! Void Stash - Replicated Inventory System
//!
//! This crate tracks item stacks owned by actors, enforces weight and slot
//! limits, replicates inventories from an authority to observers, and trades
//! items between inventories.
//!
//! # Features
//!
//! - Item stacks with levels and hierarchical tags
//! - Pluggable item catalog for weights, values and stackability
//! - Authority-gated batch add/remove with stack merging
//! - Snapshot replication with observer-side reconciliation
//! - Weight and slot aware partial trades
//! - Containers that destroy themselves once emptied
//!
//! # Example
//!
//! ```ignore
//! use void_stash::prelude::*;
//!
//! let catalog = MemoryCatalog::new()
//!     .with_definition(ItemDefinition::new("iron_ore", "Iron Ore").with_weight(2.0))
//!     .into_shared();
//!
//! let settings = InventorySettings::default().with_max_weight(20.0);
//! let mut player = Inventory::authority("player", catalog.clone(), &settings);
//! let mut chest = Inventory::authority("chest", catalog, &InventorySettings::default());
//!
//! chest.add_items(&[ItemStack::new("iron_ore", 12)]);
//! let moved = player.get_items_from(&mut chest, &[ItemStack::new("iron_ore", 5)]);
//!
//! if let Some(snapshot) = player.take_snapshot() {
//!     let bytes = snapshot.to_bytes()?;
//!     // send to observers
//! }
//! ```

pub mod catalog;
pub mod container;
pub mod error;
pub mod item;
pub mod replication;
pub mod settings;
pub mod signal;
pub mod store;
pub mod trade;

pub mod prelude {
    pub use crate::catalog::{item_metadata, item_relations, ItemCatalog, MemoryCatalog, SearchType, SharedCatalog};
    pub use crate::container::InventoryContainer;
    pub use crate::error::{CatalogError, SettingsError, SnapshotError};
    pub use crate::item::{ItemDefinition, ItemId, ItemStack, ItemType, Tag, TagSet};
    pub use crate::replication::{AuthorityId, Inventory, InventorySnapshot, ItemModifier, NetRole, UpdateOperation};
    pub use crate::settings::InventorySettings;
    pub use crate::signal::{InventoryListener, InventorySignal, ListenerId, SignalHub};
    pub use crate::store::{InventoryStore, SortDirection, SortMode};
    pub use crate::trade::{filter_tradeable, trade, trade_within};
}

pub use prelude::*;
