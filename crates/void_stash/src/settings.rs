//! Inventory defaults, read once when an inventory is constructed

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Construction-time inventory defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySettings {
    /// Maximum carried weight (<= 0 = unlimited)
    pub max_weight: f32,
    /// Maximum number of slots (<= 0 = unlimited)
    pub max_item_slots: i32,
    /// Leave the empty sentinel in vacated slots instead of compacting
    pub allow_empty_slots: bool,
    /// Containers destroy themselves once their inventory empties
    pub destroy_when_empty: bool,
    /// Log every modifier processed by a mutation
    pub internal_logs: bool,
    /// Ask the catalog to unload a definition right after looking it up
    pub unload_after_lookup: bool,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            max_weight: 0.0,
            max_item_slots: 0,
            allow_empty_slots: false,
            destroy_when_empty: false,
            internal_logs: false,
            unload_after_lookup: false,
        }
    }
}

impl InventorySettings {
    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validated()
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Set maximum weight
    pub fn with_max_weight(mut self, weight: f32) -> Self {
        self.max_weight = weight;
        self
    }

    /// Set maximum slot count
    pub fn with_max_item_slots(mut self, slots: i32) -> Self {
        self.max_item_slots = slots;
        self
    }

    /// Preserve vacated slots as tombstones
    pub fn with_empty_slots(mut self, allow: bool) -> Self {
        self.allow_empty_slots = allow;
        self
    }

    /// Destroy containers when they empty
    pub fn with_destroy_when_empty(mut self, destroy: bool) -> Self {
        self.destroy_when_empty = destroy;
        self
    }

    /// Enable per-modifier logging
    pub fn with_internal_logs(mut self, enabled: bool) -> Self {
        self.internal_logs = enabled;
        self
    }

    fn validated(mut self) -> Result<Self, SettingsError> {
        if !self.max_weight.is_finite() {
            return Err(SettingsError::Invalid(format!(
                "max_weight must be finite, got {}",
                self.max_weight
            )));
        }
        self.max_weight = self.max_weight.max(0.0);
        self.max_item_slots = self.max_item_slots.max(0);
        Ok(self)
    }
}
