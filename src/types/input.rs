use serde::{Deserialize, Serialize};

/// Pointer gesture normalized by the host renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerInput {
    /// Position in the display sequence under the pointer.
    pub view_row_index: usize,
    /// Data index the renderer believes is under the pointer, if any.
    #[serde(default)]
    pub data_index: Option<usize>,
    pub column_key: String,
    #[serde(default)]
    pub ctrl_or_cmd: bool,
    #[serde(default)]
    pub shift: bool,
}

impl PointerInput {
    pub fn at(view_row_index: usize, column_key: &str) -> Self {
        Self {
            view_row_index,
            data_index: None,
            column_key: column_key.to_string(),
            ctrl_or_cmd: false,
            shift: false,
        }
    }

    #[must_use]
    pub fn ctrl(mut self) -> Self {
        self.ctrl_or_cmd = true;
        self
    }

    #[must_use]
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    #[must_use]
    pub fn with_data_index(mut self, data_index: usize) -> Self {
        self.data_index = Some(data_index);
        self
    }
}

/// Key press normalized by the host (`key` uses DOM `KeyboardEvent.key` names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInput {
    pub key: String,
    #[serde(default)]
    pub ctrl_or_cmd: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl_or_cmd: false,
            shift: false,
        }
    }

    #[must_use]
    pub fn ctrl(mut self) -> Self {
        self.ctrl_or_cmd = true;
        self
    }

    #[must_use]
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }
}
