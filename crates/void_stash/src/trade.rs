//! Transfers between inventories
//!
//! A trade is a best-effort batch: [`filter_tradeable`] drops every stack the
//! source cannot give or the destination cannot take, and [`trade`] commits
//! whatever remains as one removal on the source followed by one addition on
//! the destination.

use std::collections::HashMap;

use crate::item::ItemStack;
use crate::replication::{Inventory, UpdateOperation};
use crate::store::InventoryStore;

/// Stacks from `requested` that `from` can give and `to` can take, in order.
///
/// The destination's weight is projected forward over accepted stacks only,
/// so a later stack can still pass after an earlier one was rejected. Source
/// quantities already promised to earlier stacks are not offered twice.
pub fn filter_tradeable(from: &InventoryStore, to: &InventoryStore, requested: &[ItemStack]) -> Vec<ItemStack> {
    let max_weight = to.max_weight();
    let mut virtual_weight = to.current_weight();
    let mut promised: HashMap<&ItemStack, i64> = HashMap::new();
    let mut accepted = Vec::with_capacity(requested.len());

    for stack in requested {
        if virtual_weight >= max_weight {
            log::warn!(
                "{}: weight limit reached, rejecting {} item(s) with id '{}'",
                to.owner(),
                stack.quantity,
                stack.item_id
            );
            continue;
        }

        if !stack.is_valid() {
            log::warn!("{}: rejecting invalid stack '{}'", from.owner(), stack.item_id);
            continue;
        }

        let already = promised.get(stack).copied().unwrap_or(0);
        let wanted = already + stack.quantity as i64;
        if from.quantity_of(stack) < wanted {
            log::warn!(
                "{}: cannot give {} more item(s) with id '{}'",
                from.owner(),
                stack.quantity,
                stack.item_id
            );
            continue;
        }

        if !to.fits_slot_limit(stack) {
            log::warn!(
                "{}: slot limit reached, rejecting item with id '{}'",
                to.owner(),
                stack.item_id
            );
            continue;
        }

        let projected = virtual_weight + to.stack_weight(stack);
        if projected > max_weight {
            log::warn!(
                "{}: {} item(s) with id '{}' would exceed max weight ({} > {})",
                to.owner(),
                stack.quantity,
                stack.item_id,
                projected,
                max_weight
            );
            continue;
        }

        virtual_weight = projected;
        promised.insert(stack, wanted);
        accepted.push(stack.clone());
    }

    accepted
}

/// Move `requested` from `from` to `to`. Returns the stacks actually moved.
///
/// Both sides must be authoritative; otherwise nothing happens. This is
/// stricter than checking only the caller's side: an observer copy is never
/// written to, even as the receiving end of a trade.
pub fn trade(requested: &[ItemStack], from: &mut Inventory, to: &mut Inventory) -> Vec<ItemStack> {
    if !from.is_authority() || !to.is_authority() {
        log::debug!(
            "Ignoring trade between '{}' and '{}': both sides need authority",
            from.owner(),
            to.owner()
        );
        return Vec::new();
    }

    let accepted = filter_tradeable(from.store(), to.store(), requested);
    if accepted.is_empty() {
        return accepted;
    }

    from.update_items(&accepted, UpdateOperation::Remove);
    to.update_items(&accepted, UpdateOperation::Add);
    accepted
}

/// Trade an inventory with itself. Removal happens first, so the source
/// weight is never counted twice.
pub fn trade_within(inventory: &mut Inventory, requested: &[ItemStack]) -> Vec<ItemStack> {
    if !inventory.is_authority() {
        log::debug!("{}: ignoring trade on observer inventory", inventory.owner());
        return Vec::new();
    }

    let accepted = filter_tradeable(inventory.store(), inventory.store(), requested);
    if accepted.is_empty() {
        return accepted;
    }

    inventory.update_items(&accepted, UpdateOperation::Remove);
    inventory.update_items(&accepted, UpdateOperation::Add);
    accepted
}

impl Inventory {
    /// Give stacks to another inventory
    pub fn give_items_to(&mut self, other: &mut Inventory, stacks: &[ItemStack]) -> Vec<ItemStack> {
        trade(stacks, self, other)
    }

    /// Take stacks from another inventory
    pub fn get_items_from(&mut self, other: &mut Inventory, stacks: &[ItemStack]) -> Vec<ItemStack> {
        trade(stacks, other, self)
    }

    /// Give whole slots of this inventory to another one
    pub fn give_item_indexes_to(&mut self, other: &mut Inventory, indexes: &[usize]) -> Vec<ItemStack> {
        let stacks = self.stacks_at(indexes);
        trade(&stacks, self, other)
    }

    /// Take whole slots of another inventory
    pub fn get_item_indexes_from(&mut self, other: &mut Inventory, indexes: &[usize]) -> Vec<ItemStack> {
        let stacks = other.stacks_at(indexes);
        trade(&stacks, other, self)
    }
}
