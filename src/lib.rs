//! slideview - whole-slide image viewer core for the web
//!
//! Browses multi-gigapixel deep-zoom slides side by side:
//! - 1/2/4/9 pane grids, each pane hosting its own deep-zoom viewer
//! - Optional zoom/pan mirroring across panes, free of feedback loops
//! - Request/response gateway to the slide, registration, IHC and Fullnet services
//! - Logged-in user persisted in client-local storage
//!
//! # Usage (Rust)
//!
//! ```ignore
//! use slideview::{SyncCoordinator, TileSource, ViewerOptions};
//!
//! let mut coordinator = SyncCoordinator::new(backend, ViewerOptions::default());
//! coordinator.set_layout(4)?;
//! coordinator.select_slot(0)?;
//! coordinator.load_into_selected(&TileSource::with_defaults(url, 46000, 32893), "slide.svs")?;
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod layout;
pub mod session;
pub mod tile_source;
pub mod viewer;

// Browser bindings (OpenSeadragon, fetch, localStorage)
#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use config::{SlideviewConfig, ViewerOptions};
pub use coordinator::{SyncCoordinator, ViewerSlot};
pub use error::{RequestCause, Result, SlideviewError};
pub use gateway::AnalysisGateway;
pub use layout::{LayoutConfiguration, PaneCount};
pub use session::SessionStore;
pub use tile_source::TileSource;
pub use viewer::{ViewerBackend, ViewerId, ViewerInstance, ViewportEvent, ViewportPoint};

/// Parse a DZI manifest and return the OpenSeadragon tile-source object as JSON.
///
/// # Errors
/// Returns an error if the manifest is malformed.
#[wasm_bindgen(js_name = dziToTileSource)]
pub fn dzi_to_tile_source(xml: &str, url: &str) -> std::result::Result<String, JsValue> {
    let source = TileSource::from_dzi_xml(xml, url).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&source.to_document())
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
