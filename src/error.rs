//! Structured error types for slideview.
//!
//! Coordinator errors are usage contract violations the UI should guard
//! against; `RequestFailed` is the only condition raised by the gateway.

/// All errors that can occur in slideview.
#[derive(Debug, thiserror::Error)]
pub enum SlideviewError {
    /// Slot index outside `0..pane_count`.
    #[error("Invalid viewer index {index} (pane count {pane_count})")]
    InvalidIndex { index: i64, pane_count: usize },

    /// A load was requested before any pane was selected.
    #[error("No viewer pane selected")]
    NoSlotSelected,

    /// Pane count other than 1, 2, 4 or 9.
    #[error("Unsupported layout: {0} panes")]
    UnsupportedLayout(u32),

    /// The deep-zoom backend could not construct a viewer.
    #[error("Viewer creation failed: {0}")]
    ViewerCreation(String),

    /// Remote API call failed.
    #[error("{message}: {cause}")]
    RequestFailed {
        message: String,
        #[source]
        cause: RequestCause,
    },

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed DZI manifest.
    #[error("Invalid DZI manifest: {0}")]
    Manifest(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Client-local storage unavailable or rejected a write.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Underlying cause of a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestCause {
    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Status(u16),

    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl SlideviewError {
    pub(crate) fn request(message: impl Into<String>, cause: RequestCause) -> Self {
        Self::RequestFailed {
            message: message.into(),
            cause,
        }
    }

    /// HTTP status carried by a `RequestFailed`, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed {
                cause: RequestCause::Status(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SlideviewError>;

#[cfg(target_arch = "wasm32")]
impl From<SlideviewError> for wasm_bindgen::JsValue {
    fn from(e: SlideviewError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
