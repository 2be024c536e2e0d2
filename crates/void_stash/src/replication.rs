//! Inventory replication
//!
//! An [`Inventory`] is either the authority for its items or an observer
//! mirroring them. Only the authority mutates; every committed mutation
//! recomputes weight, emits signals and marks the items dirty. The host takes
//! dirty state as an [`InventorySnapshot`] and delivers it to observers, which
//! reconcile it with [`Inventory::apply_observer_snapshot`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::SharedCatalog;
use crate::error::SnapshotError;
use crate::item::{ItemStack, TagSet};
use crate::settings::InventorySettings;
use crate::signal::{InventoryListener, InventorySignal, ListenerId, SignalHub};
use crate::store::{InventoryStore, SortDirection, SortMode};

/// Network role of an inventory instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetRole {
    /// Source of truth; the only role allowed to mutate
    Authority,
    /// Mirrors the authority's items
    Observer,
}

impl Default for NetRole {
    fn default() -> Self {
        NetRole::Authority
    }
}

/// Identity of one authoritative instance.
///
/// Sequence numbers only order snapshots from the same authority; a new or
/// migrated authority starts counting again under a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorityId(Uuid);

impl AuthorityId {
    /// Create a new random authority ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The nil id, carried by snapshots built without an authority
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AuthorityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuthorityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of batch mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperation {
    Add,
    Remove,
}

impl UpdateOperation {
    fn verb(&self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Remove => "Remove",
        }
    }

    fn preposition(&self) -> &'static str {
        match self {
            Self::Add => "to",
            Self::Remove => "from",
        }
    }
}

/// A staged add/remove, with its target slot resolved before any mutation
#[derive(Debug, Clone, PartialEq)]
pub struct ItemModifier {
    /// Requested stack
    pub stack: ItemStack,
    /// Slot the stack resolved to, if any
    pub index: Option<usize>,
}

impl ItemModifier {
    /// Create a new modifier
    pub fn new(stack: ItemStack, index: Option<usize>) -> Self {
        Self { stack, index }
    }
}

/// Authoritative item state as delivered to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Authority that produced this state
    pub authority: AuthorityId,
    /// Sequence number of the mutation that produced this state
    pub sequence: u64,
    /// Slots, tombstones included
    pub items: Vec<ItemStack>,
}

impl InventorySnapshot {
    /// Create a new snapshot
    pub fn new(sequence: u64, items: Vec<ItemStack>) -> Self {
        Self {
            authority: AuthorityId::nil(),
            sequence,
            items,
        }
    }

    /// Set the producing authority
    pub fn with_authority(mut self, authority: AuthorityId) -> Self {
        self.authority = authority;
        self
    }

    /// Encode for network transmission
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(SnapshotError::Encode)
    }

    /// Decode from network bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(SnapshotError::Decode)
    }

    /// Check if this snapshot is newer than a sequence number
    pub fn is_newer_than(&self, sequence: u64) -> bool {
        self.sequence > sequence
    }
}

/// A replicated inventory
#[derive(Debug)]
pub struct Inventory {
    /// Items and limits
    store: InventoryStore,
    /// Our role for this inventory
    role: NetRole,
    /// Updated / Empty listeners
    signals: SignalHub,
    /// Items changed since the last snapshot was taken
    dirty: bool,
    /// Authority: last committed mutation. Observer: last applied snapshot.
    sequence: u64,
    /// Authority: our own id. Observer: authority of the last applied snapshot.
    authority: Option<AuthorityId>,
}

impl Inventory {
    /// Create an empty inventory
    pub fn new(
        owner: impl Into<String>,
        catalog: SharedCatalog,
        settings: &InventorySettings,
        role: NetRole,
    ) -> Self {
        Self {
            store: InventoryStore::new(owner, catalog, settings),
            role,
            signals: SignalHub::new(),
            dirty: false,
            sequence: 0,
            authority: match role {
                NetRole::Authority => Some(AuthorityId::new()),
                NetRole::Observer => None,
            },
        }
    }

    /// Create an authoritative inventory
    pub fn authority(owner: impl Into<String>, catalog: SharedCatalog, settings: &InventorySettings) -> Self {
        Self::new(owner, catalog, settings, NetRole::Authority)
    }

    /// Create an observer inventory
    pub fn observer(owner: impl Into<String>, catalog: SharedCatalog, settings: &InventorySettings) -> Self {
        Self::new(owner, catalog, settings, NetRole::Observer)
    }

    pub fn role(&self) -> NetRole {
        self.role
    }

    /// Change role (authority hand-over).
    ///
    /// A promoted instance takes a fresh authority id and publishes its
    /// current items with the next snapshot. A demoted instance forgets its
    /// sequence so the first snapshot of the new authority is accepted.
    pub fn set_role(&mut self, role: NetRole) {
        if self.role == role {
            return;
        }
        log::debug!("{}: role changed {:?} -> {:?}", self.owner(), self.role, role);
        self.role = role;

        match role {
            NetRole::Authority => {
                self.authority = Some(AuthorityId::new());
                self.dirty = true;
            }
            NetRole::Observer => {
                self.authority = None;
                self.sequence = 0;
                self.dirty = false;
            }
        }
    }

    /// Authority id: ours on the authority, the last applied one on an observer
    pub fn authority_id(&self) -> Option<AuthorityId> {
        self.authority
    }

    pub fn is_authority(&self) -> bool {
        self.role == NetRole::Authority
    }

    /// Items, limits and queries
    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    pub fn owner(&self) -> &str {
        self.store.owner()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current slots, tombstones included
    pub fn items(&self) -> &[ItemStack] {
        self.store.items()
    }

    /// Owned copy of the current slots
    pub fn items_snapshot(&self) -> Vec<ItemStack> {
        self.store.items().to_vec()
    }

    pub fn current_weight(&self) -> f32 {
        self.store.current_weight()
    }

    pub fn max_weight(&self) -> f32 {
        self.store.max_weight()
    }

    pub fn current_count(&self) -> usize {
        self.store.current_count()
    }

    pub fn max_item_slots(&self) -> i32 {
        self.store.max_item_slots()
    }

    pub fn set_max_weight(&mut self, weight: f32) {
        self.store.set_max_weight(weight);
    }

    pub fn set_max_item_slots(&mut self, slots: i32) {
        self.store.set_max_item_slots(slots);
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn contains(&self, stack: &ItemStack, ignore_tags: bool) -> bool {
        self.store.contains(stack, ignore_tags)
    }

    pub fn can_give_item(&self, stack: &ItemStack) -> bool {
        self.store.can_give_item(stack)
    }

    pub fn can_receive_item(&self, stack: &ItemStack) -> bool {
        self.store.can_receive_item(stack)
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    /// Register a listener for [`InventorySignal`]s
    pub fn subscribe(&mut self, listener: impl InventoryListener + 'static) -> ListenerId {
        self.signals.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.signals.unsubscribe(id)
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.signals.is_subscribed(id)
    }

    // ------------------------------------------------------------------
    // Authority mutation
    // ------------------------------------------------------------------

    fn has_authority(&self, action: &str) -> bool {
        if !self.is_authority() {
            log::debug!("{}: ignoring {} on observer inventory", self.owner(), action);
            return false;
        }
        true
    }

    /// Add stacks, merging into matching slots where the item stacks
    pub fn add_items(&mut self, stacks: &[ItemStack]) {
        if !self.has_authority("add_items") || stacks.is_empty() {
            return;
        }
        self.update_items(stacks, UpdateOperation::Add);
    }

    /// Remove stacks by value
    pub fn discard_items(&mut self, stacks: &[ItemStack]) {
        if !self.has_authority("discard_items") || stacks.is_empty() {
            return;
        }
        self.update_items(stacks, UpdateOperation::Remove);
    }

    /// Remove whole slots by index; invalid indexes are dropped
    pub fn discard_item_indexes(&mut self, indexes: &[usize]) {
        if !self.has_authority("discard_item_indexes") || indexes.is_empty() {
            return;
        }
        let stacks = self.stacks_at(indexes);
        self.discard_items(&stacks);
    }

    /// Copies of the stacks at the valid `indexes`
    pub fn stacks_at(&self, indexes: &[usize]) -> Vec<ItemStack> {
        indexes
            .iter()
            .filter_map(|&index| self.store.item_at(index))
            .cloned()
            .collect()
    }

    /// Drop every slot
    pub fn clear(&mut self) {
        if !self.has_authority("clear") {
            return;
        }
        log::info!("{}: clearing inventory", self.owner());
        self.store.clear();
        self.notify_change();
    }

    /// Sort slots
    pub fn sort(&mut self, mode: SortMode, direction: SortDirection) {
        if !self.has_authority("sort") {
            return;
        }
        self.store.sort(mode, direction);
        self.notify_change();
    }

    /// Recompute weight and normalize slots. Observers only recompute weight.
    pub fn refresh(&mut self) {
        if !self.is_authority() {
            self.store.update_weight();
            return;
        }
        self.store.refresh();
        self.notify_change();
    }

    /// Resolve and apply a batch as one committed mutation
    pub fn update_items(&mut self, stacks: &[ItemStack], operation: UpdateOperation) {
        if !self.has_authority("update_items") {
            return;
        }

        let modifiers = self.resolve_modifiers(stacks, operation);
        match operation {
            UpdateOperation::Add => self.process_addition(modifiers),
            UpdateOperation::Remove => self.process_removal(modifiers),
        }
    }

    /// Locate each stack's target slot before anything mutates.
    ///
    /// A removal is split over as many matching slots as it needs, so
    /// `[A x3]` against three `A x1` slots yields three modifiers, one per
    /// slot. Consecutive identical removals walk forward the same way:
    /// `[A x1, A x1, A x1]` against three `A x1` slots hits all three. A slot
    /// is only passed once the batch has claimed everything it holds. Any
    /// quantity left over after the last matching slot drains that slot.
    pub fn resolve_modifiers(&self, stacks: &[ItemStack], operation: UpdateOperation) -> Vec<ItemModifier> {
        let no_tags = TagSet::new();
        let mut modifiers = Vec::with_capacity(stacks.len());
        let mut claimed: HashMap<usize, i64> = HashMap::new();
        let mut offset = 0usize;
        let mut last: Option<&ItemStack> = None;

        for stack in stacks {
            if self.store.internal_logs() {
                log::debug!(
                    "{}: {} {} item(s) with id '{}' {} inventory",
                    self.owner(),
                    operation.verb(),
                    stack.quantity,
                    stack.item_id,
                    operation.preposition()
                );
            }

            if last != Some(stack) {
                offset = 0;
            }
            last = Some(stack);

            if operation == UpdateOperation::Add {
                let index = self.store.find_first_with_stack(stack, &no_tags, offset);
                modifiers.push(ItemModifier::new(stack.clone(), index));
                continue;
            }

            let mut remaining = stack.quantity.max(0) as i64;
            let mut search_from = offset;
            let mut portions: Vec<ItemModifier> = Vec::new();

            while remaining > 0 {
                let found = match self.store.find_first_with_stack(stack, &no_tags, search_from) {
                    Some(found) => found,
                    None => break,
                };
                search_from = found + 1;

                let available = self.unclaimed(&claimed, found);
                if available <= 0 {
                    continue;
                }

                let taken = remaining.min(available);
                *claimed.entry(found).or_insert(0) += taken;
                remaining -= taken;
                portions.push(ItemModifier::new(stack.with_quantity(taken as i32), Some(found)));

                offset = if self.unclaimed(&claimed, found) > 0 { found } else { found + 1 };
            }

            match portions.last_mut() {
                Some(last_portion) => {
                    if remaining > 0 {
                        last_portion.stack.quantity = last_portion.stack.quantity.saturating_add(remaining as i32);
                    }
                }
                None => {
                    let index = self.store.find_first_with_stack(stack, &no_tags, offset);
                    portions.push(ItemModifier::new(stack.clone(), index));
                }
            }
            modifiers.extend(portions);
        }

        modifiers
    }

    /// Quantity of a slot not yet claimed by earlier removals in the batch
    fn unclaimed(&self, claimed: &HashMap<usize, i64>, index: usize) -> i64 {
        let held = self
            .store
            .item_at(index)
            .map(|stack| stack.quantity.max(0) as i64)
            .unwrap_or(0);
        held - claimed.get(&index).copied().unwrap_or(0)
    }

    fn process_addition(&mut self, modifiers: Vec<ItemModifier>) {
        if !self.has_authority("process_addition") {
            return;
        }

        // Slots appended by this batch; later modifiers of the same new item merge into them
        let batch_start = self.store.current_count();

        for ItemModifier { stack, index } in modifiers {
            if !stack.is_valid() {
                log::warn!(
                    "{}: refusing to add {} item(s) with id '{}'",
                    self.owner(),
                    stack.quantity,
                    stack.item_id
                );
                continue;
            }

            if !self.store.is_stackable(&stack) {
                self.store.items_mut().extend(stack.explode());
                continue;
            }

            let items = self.store.items_mut();
            let target = index
                .filter(|&i| items.get(i).map_or(false, |existing| *existing == stack))
                .or_else(|| {
                    items
                        .iter()
                        .enumerate()
                        .skip(batch_start)
                        .find(|(_, existing)| **existing == stack)
                        .map(|(i, _)| i)
                });

            match target {
                Some(i) => items[i].add(stack.quantity),
                None => items.push(stack),
            }
        }

        self.notify_change();
    }

    fn process_removal(&mut self, modifiers: Vec<ItemModifier>) {
        if !self.has_authority("process_removal") {
            return;
        }

        let owner = self.store.owner().to_owned();
        let items = self.store.items_mut();
        for ItemModifier { stack, index } in modifiers {
            match index.and_then(|i| items.get_mut(i)) {
                Some(slot) => {
                    slot.remove(stack.quantity);
                }
                None => {
                    log::warn!(
                        "{}: item with id '{}' not found in inventory (index {:?})",
                        owner,
                        stack.item_id,
                        index
                    );
                }
            }
        }

        if self.store.allow_empty_slots() {
            for slot in self.store.items_mut().iter_mut() {
                if slot.quantity <= 0 {
                    *slot = ItemStack::empty();
                }
            }
        } else {
            self.store.items_mut().retain(|slot| slot.quantity > 0);
        }

        self.notify_change();
    }

    /// Recompute weight, emit signals and mark the items for replication
    fn notify_change(&mut self) {
        self.store.update_weight();

        if self.store.is_empty() {
            self.store.set_current_weight(0.0);
            self.signals.emit(InventorySignal::Empty);
        }
        self.signals.emit(InventorySignal::Updated);

        self.dirty = true;
        self.sequence += 1;
    }

    // ------------------------------------------------------------------
    // Replication
    // ------------------------------------------------------------------

    /// Items changed since the last snapshot was taken
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Take the pending snapshot, if the items changed since the last one
    pub fn take_snapshot(&mut self) -> Option<InventorySnapshot> {
        if !self.is_authority() || !self.dirty {
            return None;
        }
        self.dirty = false;
        let authority = self.authority.unwrap_or_else(AuthorityId::nil);
        Some(InventorySnapshot::new(self.sequence, self.items_snapshot()).with_authority(authority))
    }

    /// Apply the authority's state on an observer
    pub fn apply_observer_snapshot(&mut self, snapshot: InventorySnapshot) -> Result<(), SnapshotError> {
        if self.is_authority() {
            log::warn!("{}: received snapshot on authoritative inventory", self.owner());
            return Err(SnapshotError::NotObserver(self.owner().to_owned()));
        }

        let same_authority = self.authority == Some(snapshot.authority);
        if !same_authority {
            log::debug!(
                "{}: snapshots now come from authority {}",
                self.owner(),
                snapshot.authority
            );
        } else if !snapshot.is_newer_than(self.sequence) {
            log::debug!(
                "{}: dropping stale snapshot {} (current {})",
                self.owner(),
                snapshot.sequence,
                self.sequence
            );
            return Err(SnapshotError::Stale {
                received: snapshot.sequence,
                current: self.sequence,
            });
        }

        log::debug!(
            "{}: applying snapshot {} with {} slot(s)",
            self.owner(),
            snapshot.sequence,
            snapshot.items.len()
        );
        self.authority = Some(snapshot.authority);
        self.sequence = snapshot.sequence;
        self.store.replace_items(snapshot.items);
        self.on_receive_snapshot();
        Ok(())
    }

    /// Observer-side reconciliation: trim trailing tombstones, then notify
    /// exactly like the authority does
    fn on_receive_snapshot(&mut self) {
        let items = self.store.items_mut();
        match items.iter().rposition(ItemStack::is_valid) {
            Some(last_valid) => items.truncate(last_valid + 1),
            None => items.clear(),
        }
        items.shrink_to_fit();

        if self.store.is_empty() {
            self.store.items_mut().clear();
            self.store.set_current_weight(0.0);
            self.signals.emit(InventorySignal::Empty);
        } else {
            self.store.update_weight();
        }
        self.signals.emit(InventorySignal::Updated);
    }

    /// Log the full inventory state
    pub fn debug_dump(&self) {
        log::debug!("Owning actor: {}", self.owner());
        log::debug!("Role: {:?}", self.role);
        log::debug!("Weight: {}", self.current_weight());
        log::debug!("Num: {}", self.current_count());
        log::debug!("Signals: {} emitted to {} listener(s)", self.signals.emitted(), self.signals.listener_count());
        for stack in self.items() {
            log::debug!(
                "Item: '{}' x{} (level {}, tags {:?})",
                stack.item_id,
                stack.quantity,
                stack.level,
                stack.tags.iter().map(|t| t.name()).collect::<Vec<_>>()
            );
        }
    }
}
