//! Structured error types for gridview.
//!
//! Interactive operations never fail; they no-op on stale references. Errors only
//! surface where outside input is decoded (configuration JSON, wasm values).

/// All errors that can occur while decoding grid input.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// JSON decoding error from serde_json.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed input handed across the host boundary.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<String> for GridError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
