use serde::{Deserialize, Serialize};

/// Default column width in pixels when the host does not supply one.
pub const DEFAULT_COL_WIDTH: f32 = 120.0;

fn default_width() -> f32 {
    DEFAULT_COL_WIDTH
}

/// A visible column in visual order, with its pixel width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub key: String,
    #[serde(default = "default_width")]
    pub width: f32,
}

impl ColumnDef {
    pub fn new(key: &str, width: f32) -> Self {
        Self {
            key: key.to_string(),
            width,
        }
    }
}

/// One level of the grouping hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupColumn {
    pub key: String,
    /// Emit a pivot-style subtotal row after each expanded group of this level.
    #[serde(default)]
    pub show_subtotal: bool,
}

impl GroupColumn {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            show_subtotal: false,
        }
    }

    #[must_use]
    pub fn with_subtotal(mut self) -> Self {
        self.show_subtotal = true;
        self
    }
}

impl From<&str> for GroupColumn {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}
