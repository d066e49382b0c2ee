//! Runtime configuration, supplied as JSON by the embedding page.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlideviewError};

/// Default location of the OpenSeadragon button images.
pub const DEFAULT_PREFIX_URL: &str = "http://localhost:8080/openseadragon-bin/images/";

/// Default DOM id prefix; pane `i` is hosted in element `osdViewer-{i}`.
pub const DEFAULT_ELEMENT_ID_PREFIX: &str = "osdViewer-";

/// Options applied to every viewer instance the coordinator creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerOptions {
    pub prefix_url: String,
    pub element_id_prefix: String,
    pub show_navigator: bool,
    pub scroll_to_zoom: bool,
    pub fullscreen: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            prefix_url: DEFAULT_PREFIX_URL.to_string(),
            element_id_prefix: DEFAULT_ELEMENT_ID_PREFIX.to_string(),
            show_navigator: true,
            scroll_to_zoom: true,
            fullscreen: false,
        }
    }
}

impl ViewerOptions {
    /// DOM element id hosting the pane at `index`.
    #[must_use]
    pub fn element_id(&self, index: usize) -> String {
        format!("{}{index}", self.element_id_prefix)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlideviewConfig {
    /// Prefix for every remote API path (empty = same origin).
    pub api_base_url: String,
    /// Pane count on startup; must be 1, 2, 4 or 9.
    pub initial_pane_count: u32,
    /// Whether zoom/pan mirroring starts enabled.
    pub sync_enabled: bool,
    pub viewer: ViewerOptions,
}

impl Default for SlideviewConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            initial_pane_count: 1,
            sync_enabled: true,
            viewer: ViewerOptions::default(),
        }
    }
}

impl SlideviewConfig {
    /// Parse a configuration object. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `Config` for malformed JSON or a wrongly typed field.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SlideviewError::Config(e.to_string()))
    }
}
