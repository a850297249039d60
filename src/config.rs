//! Grid configuration.
//!
//! Hosts usually pass this as JSON; every field has a default so partial
//! objects are accepted.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::layout::VirtualizationMode;
use crate::types::SelectionMode;

/// Default data row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f32 = 28.0;

/// Default height of group header/footer/total rows in pixels.
pub const DEFAULT_GROUP_ROW_HEIGHT: f32 = 32.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Extra items materialized on each side of the visible window.
    pub overscan: usize,
    pub virtualization: VirtualizationMode,
    /// Item count at which `auto` virtualization turns on.
    pub virtualization_threshold: usize,
    pub row_height: f32,
    pub group_row_height: f32,
    pub show_group_footers: bool,
    pub show_grand_total: bool,
    /// Emit the grand total row even when the dataset is empty.
    pub always_show_grand_total: bool,
    pub selection_mode: SelectionMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            overscan: 3,
            virtualization: VirtualizationMode::Auto,
            virtualization_threshold: 100,
            row_height: DEFAULT_ROW_HEIGHT,
            group_row_height: DEFAULT_GROUP_ROW_HEIGHT,
            show_group_footers: false,
            show_grand_total: true,
            always_show_grand_total: false,
            selection_mode: SelectionMode::Range,
        }
    }
}

impl GridConfig {
    /// Parse and validate a JSON configuration object.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a size is not positive.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply a partial JSON object on top of this configuration; fields the
    /// object omits keep their current values.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed, is not an object, or the
    /// merged result fails validation.
    pub fn merge_json(&self, json: &str) -> Result<Self> {
        self.merge_value(serde_json::from_str(json)?)
    }

    /// [`GridConfig::merge_json`] for an already-decoded value.
    ///
    /// # Errors
    /// Same as [`GridConfig::merge_json`].
    pub fn merge_value(&self, patch: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(patch) = patch else {
            return Err(GridError::Config(
                "configuration must be a JSON object".to_string(),
            ));
        };
        let mut merged = serde_json::to_value(self)?;
        if let serde_json::Value::Object(fields) = &mut merged {
            fields.extend(patch);
        }
        let config: GridConfig = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`GridError::Config`] if a row height is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(GridError::Config(format!(
                "rowHeight must be positive, got {}",
                self.row_height
            )));
        }
        if !(self.group_row_height.is_finite() && self.group_row_height > 0.0) {
            return Err(GridError::Config(format!(
                "groupRowHeight must be positive, got {}",
                self.group_row_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config = GridConfig::from_json(r#"{"overscan": 5, "showGroupFooters": true}"#).unwrap();
        assert_eq!(config.overscan, 5);
        assert!(config.show_group_footers);
        assert_eq!(config.row_height, DEFAULT_ROW_HEIGHT);
        assert_eq!(config.virtualization, VirtualizationMode::Auto);
        assert_eq!(config.selection_mode, SelectionMode::Range);
    }

    #[test]
    fn parses_enums() {
        let config =
            GridConfig::from_json(r#"{"virtualization": "disabled", "selectionMode": "all"}"#)
                .unwrap();
        assert_eq!(config.virtualization, VirtualizationMode::Disabled);
        assert_eq!(config.selection_mode, SelectionMode::All);
    }

    #[test]
    fn rejects_bad_heights() {
        let err = GridConfig::from_json(r#"{"rowHeight": 0}"#).unwrap_err();
        assert!(matches!(err, GridError::Config(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = GridConfig::from_json("{overscan:").unwrap_err();
        assert!(matches!(err, GridError::Json(_)));
    }

    #[test]
    fn merge_keeps_omitted_fields() {
        let current = GridConfig::from_json(r#"{"selectionMode": "row", "rowHeight": 40}"#).unwrap();
        let merged = current.merge_json(r#"{"overscan": 5}"#).unwrap();
        assert_eq!(merged.overscan, 5);
        assert_eq!(merged.selection_mode, SelectionMode::Row);
        assert_eq!(merged.row_height, 40.0);
    }

    #[test]
    fn merge_rejects_non_objects_and_bad_values() {
        let current = GridConfig::default();
        assert!(matches!(current.merge_json("[1]"), Err(GridError::Config(_))));
        assert!(matches!(
            current.merge_json(r#"{"groupRowHeight": -2}"#),
            Err(GridError::Config(_))
        ));
        assert!(matches!(
            current.merge_json(r#"{"overscan": "lots"}"#),
            Err(GridError::Json(_))
        ));
    }
}
