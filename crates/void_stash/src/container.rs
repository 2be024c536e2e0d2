//! World containers
//!
//! A container wraps an authoritative [`Inventory`] (a chest, a loot bag, a
//! dropped package) and can destroy itself once its inventory empties.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::catalog::SharedCatalog;
use crate::item::ItemStack;
use crate::replication::Inventory;
use crate::settings::InventorySettings;
use crate::signal::{InventorySignal, ListenerId};
use crate::trade::trade;

/// Inventory-owning world object
#[derive(Debug)]
pub struct InventoryContainer {
    /// Container contents
    inventory: Inventory,
    /// Destroy once the inventory empties
    destroy_when_empty: bool,
    /// Set by the `Empty` listener, consumed by `process_pending`
    destroy_requested: Arc<AtomicBool>,
    /// Listener bound while destroy-on-empty is enabled
    binding: Option<ListenerId>,
    /// Whether the container has been destroyed
    destroyed: bool,
}

impl InventoryContainer {
    /// Create a container with an empty authoritative inventory
    pub fn new(name: impl Into<String>, catalog: SharedCatalog, settings: &InventorySettings) -> Self {
        let mut container = Self {
            inventory: Inventory::authority(name, catalog, settings),
            destroy_when_empty: false,
            destroy_requested: Arc::new(AtomicBool::new(false)),
            binding: None,
            destroyed: false,
        };
        container.set_destroy_on_empty(settings.destroy_when_empty);
        container
    }

    /// Create a container already holding `stacks`
    pub fn with_items(mut self, stacks: &[ItemStack]) -> Self {
        self.inventory.add_items(stacks);
        self.destroy_requested.store(false, Ordering::SeqCst);
        self
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn name(&self) -> &str {
        self.inventory.owner()
    }

    pub fn destroy_on_empty(&self) -> bool {
        self.destroy_when_empty
    }

    /// Bind or unbind destruction to the inventory's `Empty` signal
    pub fn set_destroy_on_empty(&mut self, enabled: bool) {
        self.destroy_when_empty = enabled;

        match (enabled, self.binding) {
            (true, None) => {
                let requested = Arc::clone(&self.destroy_requested);
                let id = self.inventory.subscribe(move |signal: InventorySignal| {
                    if signal == InventorySignal::Empty {
                        requested.store(true, Ordering::SeqCst);
                    }
                });
                self.binding = Some(id);
            }
            (false, Some(id)) => {
                self.inventory.unsubscribe(id);
                self.binding = None;
            }
            _ => {}
        }
    }

    /// Spawn hook: an empty container configured to self-destruct goes away immediately
    pub fn begin_play(&mut self) {
        if self.destroy_when_empty && self.inventory.is_empty() {
            self.destroy();
        }
    }

    /// Move stacks from `from` into the container
    pub fn put_items(&mut self, from: &mut Inventory, stacks: &[ItemStack]) -> Vec<ItemStack> {
        if self.destroyed {
            log::debug!("{}: container destroyed, ignoring put", self.name());
            return Vec::new();
        }
        trade(stacks, from, &mut self.inventory)
    }

    /// Move stacks out of the container into `to`
    pub fn take_items(&mut self, to: &mut Inventory, stacks: &[ItemStack]) -> Vec<ItemStack> {
        if self.destroyed {
            log::debug!("{}: container destroyed, ignoring take", self.name());
            return Vec::new();
        }
        trade(stacks, &mut self.inventory, to)
    }

    /// Whether an `Empty` signal is waiting to be processed
    pub fn has_pending_destroy(&self) -> bool {
        self.destroy_requested.load(Ordering::SeqCst)
    }

    /// Apply a destruction requested by the `Empty` signal.
    /// Returns true if the container was destroyed.
    pub fn process_pending(&mut self) -> bool {
        if !self.destroy_requested.swap(false, Ordering::SeqCst) || self.destroyed {
            return false;
        }

        if !self.destroy_when_empty {
            log::warn!(
                "{}: destroy requested but destroy on empty is disabled",
                self.name()
            );
            return false;
        }

        self.destroy();
        true
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        log::info!("{}: destroying empty container", self.name());
        if let Some(id) = self.binding.take() {
            self.inventory.unsubscribe(id);
        }
        self.destroyed = true;
    }
}
