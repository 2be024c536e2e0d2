//! Item identifiers, tags, definitions and stacks

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of an item definition (not of a stack instance).
///
/// The empty string is the invalid id, used by the [`ItemStack::empty`] sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The invalid ID
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Whether this ID refers to anything at all
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Get the ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Hierarchical, dot separated tag (`"Rarity.Epic"` is a child of `"Rarity"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Create a new tag
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the tag name
    pub fn name(&self) -> &str {
        &self.0
    }

    /// True if this tag equals `parent` or sits below it in the hierarchy
    pub fn matches(&self, parent: &Tag) -> bool {
        match self.0.strip_prefix(parent.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Ordered set of tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    /// Create an empty tag set
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, tag: impl Into<Tag>) -> bool {
        self.0.insert(tag.into())
    }

    pub fn remove(&mut self, tag: &Tag) -> bool {
        self.0.remove(tag)
    }

    /// Remove every tag of `other` (exact match)
    pub fn remove_tags(&mut self, other: &TagSet) {
        for tag in &other.0 {
            self.0.remove(tag);
        }
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    /// Every tag of `other` is present verbatim
    pub fn has_all_exact(&self, other: &TagSet) -> bool {
        other.0.iter().all(|tag| self.0.contains(tag))
    }

    /// Every tag of `other` is present, or has a child present
    pub fn has_all(&self, other: &TagSet) -> bool {
        other
            .0
            .iter()
            .all(|wanted| self.0.iter().any(|tag| tag.matches(wanted)))
    }

    /// At least one tag of `other` is present, or has a child present
    pub fn has_any(&self, other: &TagSet) -> bool {
        other
            .0
            .iter()
            .any(|wanted| self.0.iter().any(|tag| tag.matches(wanted)))
    }
}

impl<T: Into<Tag>> FromIterator<T> for TagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Item type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemType {
    None,
    Consumable,
    Armor,
    Weapon,
    Accessory,
    Crafting,
    Material,
    Information,
    Special,
    Event,
    Quest,
    Junk,
    Other,
}

impl Default for ItemType {
    fn default() -> Self {
        Self::None
    }
}

impl ItemType {
    /// Type name as shown in search results and tooling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Consumable => "Consumable",
            Self::Armor => "Armor",
            Self::Weapon => "Weapon",
            Self::Accessory => "Accessory",
            Self::Crafting => "Crafting",
            Self::Material => "Material",
            Self::Information => "Information",
            Self::Special => "Special",
            Self::Event => "Event",
            Self::Quest => "Quest",
            Self::Junk => "Junk",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static item definition, as served by an [`ItemCatalog`](crate::catalog::ItemCatalog)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefinition {
    /// Unique identifier
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Item type
    pub item_type: ItemType,
    /// Whether several units share one slot
    pub stackable: bool,
    /// Value per unit
    pub value: f32,
    /// Weight per unit
    pub weight: f32,
    /// Icon path
    pub icon: String,
    /// Free-form metadata
    pub metadata: HashMap<Tag, String>,
    /// Relations to other items (crafting requirements, upgrades, ...)
    pub relations: HashMap<Tag, Vec<ItemId>>,
}

impl ItemDefinition {
    /// Create a new item definition
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            item_type: ItemType::default(),
            stackable: true,
            value: 0.0,
            weight: 0.0,
            icon: String::new(),
            metadata: HashMap::new(),
            relations: HashMap::new(),
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set type
    pub fn with_type(mut self, item_type: ItemType) -> Self {
        self.item_type = item_type;
        self
    }

    /// Make non-stackable
    pub fn non_stackable(mut self) -> Self {
        self.stackable = false;
        self
    }

    /// Set value (clamped to zero)
    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value.max(0.0);
        self
    }

    /// Set weight (clamped to zero)
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    /// Set icon path
    pub fn with_icon(mut self, path: impl Into<String>) -> Self {
        self.icon = path.into();
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<Tag>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Add a relation to other items
    pub fn with_relation(mut self, key: impl Into<Tag>, items: Vec<ItemId>) -> Self {
        self.relations.entry(key.into()).or_default().extend(items);
        self
    }

    /// Check if stackable
    pub fn is_stackable(&self) -> bool {
        self.stackable
    }
}

impl Default for ItemDefinition {
    fn default() -> Self {
        Self::new(ItemId::none(), "")
    }
}

/// A quantity of one item variant held in one inventory slot.
///
/// Two stacks are the same stack when id, level and tags match; quantity is
/// not part of identity, which is what lets stacks merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item ID (references ItemDefinition)
    pub item_id: ItemId,
    /// Quantity (<= 0 means the slot is logically empty)
    pub quantity: i32,
    /// Item level
    pub level: i32,
    /// Instance tags
    pub tags: TagSet,
}

impl ItemStack {
    /// Quantity carried by the empty-slot sentinel
    pub const EMPTY_QUANTITY: i32 = -1;

    /// Create a new item stack at level 1 without tags
    pub fn new(item_id: impl Into<ItemId>, quantity: i32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            level: 1,
            tags: TagSet::new(),
        }
    }

    /// Create a single item
    pub fn single(item_id: impl Into<ItemId>) -> Self {
        Self::new(item_id, 1)
    }

    /// The tombstone left in a vacated slot when empty slots are preserved
    pub fn empty() -> Self {
        Self::new(ItemId::none(), Self::EMPTY_QUANTITY)
    }

    /// Set level
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Replace tags
    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    /// Same identity, different quantity
    pub fn with_quantity(&self, quantity: i32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }

    /// Is this the empty-slot sentinel
    pub fn is_empty_slot(&self) -> bool {
        *self == Self::empty()
    }

    /// Valid id, not the sentinel, and holding at least one unit
    pub fn is_valid(&self) -> bool {
        self.item_id.is_valid() && !self.is_empty_slot() && self.quantity > 0
    }

    /// Copy of this stack with the given tags stripped
    pub fn without_tags(&self, ignore: &TagSet) -> Self {
        let mut copy = self.clone();
        copy.tags.remove_tags(ignore);
        copy
    }

    /// Tags sitting at or below `parent`
    pub fn tags_with_parent(&self, parent: &Tag) -> TagSet {
        self.tags.iter().filter(|t| t.matches(parent)).cloned().collect()
    }

    /// Add to this stack
    pub fn add(&mut self, amount: i32) {
        self.quantity = self.quantity.max(0).saturating_add(amount.max(0));
    }

    /// Remove from this stack, never going below zero.
    /// Returns the amount actually removed.
    pub fn remove(&mut self, amount: i32) -> i32 {
        let to_remove = amount.clamp(0, self.quantity.max(0));
        self.quantity = (self.quantity - amount.max(0)).max(0);
        to_remove
    }

    /// Split `amount` units off into a new stack
    pub fn split(&mut self, amount: i32) -> Option<ItemStack> {
        if amount > 0 && amount < self.quantity {
            self.quantity -= amount;
            Some(self.with_quantity(amount))
        } else {
            None
        }
    }

    /// Break the stack into single-unit stacks
    pub fn explode(&self) -> Vec<ItemStack> {
        (0..self.quantity.max(0)).map(|_| self.with_quantity(1)).collect()
    }

    /// Check if stacks can be merged (same identity, both non-empty)
    pub fn can_merge(&self, other: &ItemStack) -> bool {
        self == other && !self.is_empty_slot()
    }

    /// Merge another stack into this one, draining it
    pub fn merge(&mut self, other: &mut ItemStack) -> bool {
        if !self.can_merge(other) {
            return false;
        }
        self.add(other.quantity);
        other.quantity = 0;
        true
    }
}

impl PartialEq for ItemStack {
    fn eq(&self, other: &Self) -> bool {
        self.item_id == other.item_id && self.level == other.level && self.tags == other.tags
    }
}

impl Eq for ItemStack {}

impl Hash for ItemStack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item_id.hash(state);
        self.level.hash(state);
        self.tags.hash(state);
    }
}

impl Default for ItemStack {
    fn default() -> Self {
        Self::empty()
    }
}
