//! Inventory store: the ordered slot list, its limits and weight accounting

use crate::catalog::SharedCatalog;
use crate::item::{ItemDefinition, ItemId, ItemStack, TagSet};
use crate::settings::InventorySettings;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Sort key for [`InventoryStore::sort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Item id
    Id,
    /// Catalog display name
    Name,
    /// Catalog item type
    Type,
    /// Value of one unit
    UnitValue,
    /// Unit value times quantity
    StackValue,
    /// Weight of one unit
    UnitWeight,
    /// Unit weight times quantity
    StackWeight,
    /// Quantity
    Quantity,
    /// Level
    Level,
    /// Number of tags
    TagCount,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Ascending
    }
}

/// Ordered collection of item stacks owned by one inventory.
///
/// Slot order is insertion order; it drives first-match searches and what
/// observers see after replication.
pub struct InventoryStore {
    /// Owner name, used as logging context
    owner: String,
    /// Item metadata source
    catalog: SharedCatalog,
    /// Slots
    items: Vec<ItemStack>,
    /// Cached weight of all valid stacks
    current_weight: f32,
    /// Maximum weight (<= 0 = unlimited)
    max_weight: f32,
    /// Maximum slot count (<= 0 = unlimited)
    max_item_slots: i32,
    /// Tombstone vacated slots instead of compacting
    allow_empty_slots: bool,
    internal_logs: bool,
    unload_after_lookup: bool,
}

impl InventoryStore {
    /// Create an empty store with limits taken from `settings`
    pub fn new(owner: impl Into<String>, catalog: SharedCatalog, settings: &InventorySettings) -> Self {
        Self {
            owner: owner.into(),
            catalog,
            items: Vec::new(),
            current_weight: 0.0,
            max_weight: settings.max_weight,
            max_item_slots: settings.max_item_slots,
            allow_empty_slots: settings.allow_empty_slots,
            internal_logs: settings.internal_logs,
            unload_after_lookup: settings.unload_after_lookup,
        }
    }

    /// Owner name
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Catalog used for item lookups
    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    /// All slots, tombstones included
    pub fn items(&self) -> &[ItemStack] {
        &self.items
    }

    /// Get slot contents
    pub fn item_at(&self, index: usize) -> Option<&ItemStack> {
        self.items.get(index)
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<ItemStack> {
        &mut self.items
    }

    pub(crate) fn replace_items(&mut self, items: Vec<ItemStack>) {
        self.items = items;
    }

    /// Cached weight
    pub fn current_weight(&self) -> f32 {
        self.current_weight
    }

    pub(crate) fn set_current_weight(&mut self, weight: f32) {
        self.current_weight = weight;
    }

    /// Maximum weight; `f32::MAX` when unlimited
    pub fn max_weight(&self) -> f32 {
        if self.max_weight <= 0.0 {
            f32::MAX
        } else {
            self.max_weight
        }
    }

    /// Set maximum weight (<= 0 = unlimited)
    pub fn set_max_weight(&mut self, weight: f32) {
        self.max_weight = weight;
    }

    /// Number of slots, tombstones included
    pub fn current_count(&self) -> usize {
        self.items.len()
    }

    /// Maximum slot count; `i32::MAX` when unlimited
    pub fn max_item_slots(&self) -> i32 {
        if self.max_item_slots <= 0 {
            i32::MAX
        } else {
            self.max_item_slots
        }
    }

    /// Set maximum slot count (<= 0 = unlimited)
    pub fn set_max_item_slots(&mut self, slots: i32) {
        self.max_item_slots = slots;
    }

    pub fn allow_empty_slots(&self) -> bool {
        self.allow_empty_slots
    }

    pub fn set_allow_empty_slots(&mut self, allow: bool) {
        self.allow_empty_slots = allow;
    }

    pub(crate) fn internal_logs(&self) -> bool {
        self.internal_logs
    }

    /// Resolve an item through the catalog, logging ids it cannot resolve
    pub fn lookup(&self, id: &ItemId) -> Option<Arc<ItemDefinition>> {
        if !id.is_valid() {
            return None;
        }

        let definition = self.catalog.resolve(id);
        if definition.is_none() {
            log::error!("{}: item '{}' could not be resolved", self.owner, id);
        }
        if self.unload_after_lookup {
            self.catalog.unload(id);
        }
        definition
    }

    /// Stackability of a stack's item; unresolved items are not stackable
    pub fn is_stackable(&self, stack: &ItemStack) -> bool {
        if !stack.item_id.is_valid() || stack.is_empty_slot() {
            return false;
        }
        self.lookup(&stack.item_id)
            .map(|definition| definition.is_stackable())
            .unwrap_or(false)
    }

    /// Weight of one unit; unresolved items weigh nothing
    pub fn unit_weight(&self, stack: &ItemStack) -> f32 {
        self.lookup(&stack.item_id)
            .map(|definition| definition.weight)
            .unwrap_or(0.0)
    }

    /// Weight of a whole stack
    pub fn stack_weight(&self, stack: &ItemStack) -> f32 {
        self.unit_weight(stack) * stack.quantity.max(0) as f32
    }

    /// Sum of `quantity * weight` over valid stacks
    pub fn compute_weight(&self) -> f32 {
        let weight: f32 = self
            .items
            .iter()
            .filter(|stack| stack.is_valid())
            .map(|stack| self.stack_weight(stack))
            .sum();
        weight.max(0.0)
    }

    /// Recompute and cache the current weight
    pub fn update_weight(&mut self) -> f32 {
        self.current_weight = self.compute_weight();
        self.current_weight
    }

    /// First slot at or after `offset` equal to `stack`, comparing both sides
    /// with `ignore_tags` stripped
    pub fn find_first_with_stack(&self, stack: &ItemStack, ignore_tags: &TagSet, offset: usize) -> Option<usize> {
        let wanted = stack.without_tags(ignore_tags);
        self.items
            .iter()
            .enumerate()
            .skip(offset)
            .find(|(_, existing)| existing.without_tags(ignore_tags) == wanted)
            .map(|(index, _)| index)
    }

    /// First slot at or after `offset` carrying all of `with_tags` exactly
    pub fn find_first_with_tags(&self, with_tags: &TagSet, ignore_tags: &TagSet, offset: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .skip(offset)
            .find(|(_, existing)| {
                let mut tags = existing.tags.clone();
                tags.remove_tags(ignore_tags);
                tags.has_all_exact(with_tags)
            })
            .map(|(index, _)| index)
    }

    /// First slot at or after `offset` holding `id` and none of `ignore_tags`
    pub fn find_first_with_id(&self, id: &ItemId, ignore_tags: &TagSet, offset: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .skip(offset)
            .find(|(_, existing)| existing.item_id == *id && !existing.tags.has_any(ignore_tags))
            .map(|(index, _)| index)
    }

    /// Every slot equal to `stack`, in ascending order
    pub fn find_all_with_stack(&self, stack: &ItemStack, ignore_tags: &TagSet) -> Vec<usize> {
        let wanted = stack.without_tags(ignore_tags);
        self.items
            .iter()
            .enumerate()
            .filter(|(_, existing)| existing.without_tags(ignore_tags) == wanted)
            .map(|(index, _)| index)
            .collect()
    }

    /// Every slot carrying all of `with_tags` (parents match children)
    pub fn find_all_with_tags(&self, with_tags: &TagSet, ignore_tags: &TagSet) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, existing)| {
                let mut tags = existing.tags.clone();
                tags.remove_tags(ignore_tags);
                tags.has_all(with_tags)
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Every slot holding `id` and none of `ignore_tags`
    pub fn find_all_with_id(&self, id: &ItemId, ignore_tags: &TagSet) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, existing)| existing.item_id == *id && !existing.tags.has_any(ignore_tags))
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether any slot holds `stack`; with `ignore_tags` only the id is compared
    pub fn contains(&self, stack: &ItemStack, ignore_tags: bool) -> bool {
        self.items.iter().any(|existing| {
            if ignore_tags {
                existing.item_id == stack.item_id
            } else {
                existing == stack
            }
        })
    }

    /// True if no slot holds a positive quantity
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|stack| stack.quantity <= 0)
    }

    /// Total quantity across all slots sharing `stack`'s identity
    pub fn quantity_of(&self, stack: &ItemStack) -> i64 {
        self.items
            .iter()
            .filter(|existing| *existing == stack)
            .map(|existing| existing.quantity.max(0) as i64)
            .sum()
    }

    /// Whether this inventory holds at least `stack.quantity` units of the stack
    pub fn can_give_item(&self, stack: &ItemStack) -> bool {
        if !stack.is_valid() {
            return false;
        }

        let available = self.quantity_of(stack);
        let can_give = available >= stack.quantity as i64;
        if !can_give {
            log::warn!(
                "{}: cannot give {} item(s) with id '{}' (holding {})",
                self.owner,
                stack.quantity,
                stack.item_id,
                available
            );
        }
        can_give
    }

    /// Whether the slot limit admits `stack`; weight is not considered
    pub fn fits_slot_limit(&self, stack: &ItemStack) -> bool {
        stack.is_valid() && self.items.len() as i64 <= self.max_item_slots() as i64
    }

    /// Whether this inventory can take `stack` without breaking its limits
    pub fn can_receive_item(&self, stack: &ItemStack) -> bool {
        if !stack.is_valid() {
            return false;
        }

        let projected = self.current_weight + self.stack_weight(stack);
        let can_receive = self.fits_slot_limit(stack) && projected <= self.max_weight();
        if !can_receive {
            log::warn!(
                "{}: cannot receive {} item(s) with id '{}'",
                self.owner,
                stack.quantity,
                stack.item_id
            );
        }
        can_receive
    }

    /// Stable sort. Stacks that are invalid or unknown to the catalog go last
    /// regardless of direction.
    pub fn sort(&mut self, mode: SortMode, direction: SortDirection) {
        // Keys are computed once up front so the comparator stays pure
        let keys: Vec<Option<SortKey>> = self.items.iter().map(|stack| self.sort_key(stack, mode)).collect();

        let mut keyed: Vec<(Option<SortKey>, ItemStack)> = keys.into_iter().zip(self.items.drain(..)).collect();
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => {
                let ordering = a.compare(b);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        self.items = keyed.into_iter().map(|(_, stack)| stack).collect();
    }

    fn sort_key(&self, stack: &ItemStack, mode: SortMode) -> Option<SortKey> {
        if !stack.is_valid() {
            return None;
        }

        let quantity = stack.quantity as f64;
        let key = match mode {
            SortMode::Id => SortKey::Text(stack.item_id.as_str().to_owned()),
            SortMode::Quantity => SortKey::Number(quantity),
            SortMode::Level => SortKey::Number(stack.level as f64),
            SortMode::TagCount => SortKey::Number(stack.tags.len() as f64),
            _ => {
                let definition = self.lookup(&stack.item_id)?;
                match mode {
                    SortMode::Name => SortKey::Text(definition.name.clone()),
                    SortMode::Type => SortKey::Number(definition.item_type as u8 as f64),
                    SortMode::UnitValue => SortKey::Number(definition.value as f64),
                    SortMode::StackValue => SortKey::Number(definition.value as f64 * quantity),
                    SortMode::UnitWeight => SortKey::Number(definition.weight as f64),
                    SortMode::StackWeight => SortKey::Number(definition.weight as f64 * quantity),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// Recompute weight, then validate slot shapes
    pub fn refresh(&mut self) -> bool {
        self.update_weight();
        self.validate()
    }

    /// Normalize slot shapes in a single pass:
    ///
    /// - stacks with quantity <= 0 are removed
    /// - non-stackable stacks holding more than one unit are replaced by
    ///   single-unit stacks appended at the end
    ///
    /// Removal is compaction, or tombstoning when empty slots are allowed.
    /// Returns true if anything changed.
    pub fn validate(&mut self) -> bool {
        let mut removals: Vec<usize> = Vec::new();
        let mut exploded: Vec<ItemStack> = Vec::new();

        for (index, stack) in self.items.iter().enumerate() {
            if self.allow_empty_slots && stack.is_empty_slot() {
                continue;
            }

            if stack.quantity <= 0 {
                removals.push(index);
            } else if stack.quantity > 1 && !self.is_stackable(stack) {
                exploded.extend(stack.explode());
                removals.push(index);
            }
        }

        if removals.is_empty() {
            return false;
        }

        if self.allow_empty_slots {
            for &index in &removals {
                self.items[index] = ItemStack::empty();
            }
        } else {
            let removals: HashSet<usize> = removals.into_iter().collect();
            let mut index = 0;
            self.items.retain(|_| {
                let keep = !removals.contains(&index);
                index += 1;
                keep
            });
        }

        self.items.append(&mut exploded);
        true
    }

    /// Drop every slot and zero the weight
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.current_weight = 0.0;
    }
}

impl fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryStore")
            .field("owner", &self.owner)
            .field("items", &self.items)
            .field("current_weight", &self.current_weight)
            .field("max_weight", &self.max_weight)
            .field("max_item_slots", &self.max_item_slots)
            .field("allow_empty_slots", &self.allow_empty_slots)
            .finish()
    }
}

/// Precomputed sort key
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Text(String),
    Number(f64),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(_), Self::Number(_)) => Ordering::Less,
            (Self::Number(_), Self::Text(_)) => Ordering::Greater,
        }
    }
}
