//! The seam between the coordinator and a deep-zoom rendering library.
//!
//! A `ViewerBackend` constructs viewer instances; a `ViewerInstance` exposes
//! the viewport operations the coordinator needs and an explicit listener
//! subscription API for viewport changes. Instances are shared handles
//! (`Rc`) with interior mutability, mirroring how the browser owns them.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::ViewerOptions;
use crate::error::Result;
use crate::tile_source::TileSource;

/// Coordinator-assigned identity of one live viewer instance.
///
/// Ids are never reused within a coordinator, so a stale id can't alias a
/// newer instance in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub(crate) u64);

impl ViewerId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// Center of a viewport in image (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportPoint {
    pub x: f64,
    pub y: f64,
}

impl ViewportPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which viewport change a listener is subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportEventKind {
    Zoom,
    Pan,
}

impl ViewportEventKind {
    /// Event name used by OpenSeadragon's `addHandler`.
    #[must_use]
    pub fn handler_name(self) -> &'static str {
        match self {
            Self::Zoom => "zoom",
            Self::Pan => "pan",
        }
    }
}

/// A viewport change emitted by a viewer instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    Zoomed(f64),
    Panned(ViewportPoint),
}

impl ViewportEvent {
    #[must_use]
    pub fn kind(&self) -> ViewportEventKind {
        match self {
            Self::Zoomed(_) => ViewportEventKind::Zoom,
            Self::Panned(_) => ViewportEventKind::Pan,
        }
    }
}

/// Callback registered on a viewer instance.
pub type ViewportListener = Rc<dyn Fn(&ViewportEvent)>;

/// Handle returned by `add_listener`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

/// A running deep-zoom viewer.
pub trait ViewerInstance {
    /// Current zoom factor.
    fn zoom(&self) -> f64;

    /// Current viewport center.
    fn center(&self) -> ViewportPoint;

    /// Snap the viewport to `zoom`. May synchronously emit a `Zoomed` event.
    fn zoom_to(&self, zoom: f64);

    /// Snap the viewport center to `center`. May synchronously emit a `Panned` event.
    fn pan_to(&self, center: ViewportPoint);

    fn add_listener(&self, kind: ViewportEventKind, listener: ViewportListener) -> ListenerToken;

    fn remove_listener(&self, token: ListenerToken);

    /// Release the instance and everything it renders into.
    fn destroy(&self);
}

/// Factory for viewer instances.
pub trait ViewerBackend {
    type Instance: ViewerInstance + 'static;

    /// Construct a viewer for pane `slot`, bound to `source`.
    ///
    /// # Errors
    /// Returns `ViewerCreation` when the rendering library rejects the source
    /// or the pane's host element is missing.
    fn create(
        &mut self,
        slot: usize,
        source: &TileSource,
        options: &ViewerOptions,
    ) -> Result<Rc<Self::Instance>>;
}
