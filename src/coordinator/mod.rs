//! Viewport sync coordinator.
//!
//! `SyncCoordinator` owns one `ViewerSlot` per pane, decides which viewer
//! instance lives in each, and wires zoom/pan listeners so that, while sync is
//! enabled, moving one pane moves all the others.
//!
//! All mutation goes through `&mut self` on a single thread. Viewer listeners
//! only reach the shared broadcast hub, never the coordinator itself, so a
//! broadcast can run while the coordinator is borrowed elsewhere and a
//! teardown nested inside a broadcast is observed by it.

mod sync;

use std::collections::HashMap;
use std::rc::Rc;

use crate::config::{SlideviewConfig, ViewerOptions};
use crate::error::{Result, SlideviewError};
use crate::layout::{check_index, LayoutConfiguration, PaneCount};
use crate::tile_source::TileSource;
use crate::viewer::{ListenerToken, ViewerBackend, ViewerId, ViewerInstance, ViewportEventKind};

use sync::SyncHub;

/// One pane of the grid.
pub struct ViewerSlot<I> {
    index: usize,
    viewer: Option<LiveViewer<I>>,
    file_name: String,
}

struct LiveViewer<I> {
    id: ViewerId,
    instance: Rc<I>,
}

impl<I> ViewerSlot<I> {
    fn empty(index: usize) -> Self {
        Self {
            index,
            viewer: None,
            file_name: String::new(),
        }
    }

    /// Position in the grid, stable for the lifetime of a layout.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn viewer_id(&self) -> Option<ViewerId> {
        self.viewer.as_ref().map(|live| live.id)
    }

    #[must_use]
    pub fn viewer(&self) -> Option<&Rc<I>> {
        self.viewer.as_ref().map(|live| &live.instance)
    }

    /// Name of the loaded file, empty if none.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.viewer.is_none()
    }
}

/// Listener tokens registered on one wired instance.
struct Subscription {
    zoom: ListenerToken,
    pan: ListenerToken,
}

/// Owns the panes, their viewers, and the zoom/pan mirroring between them.
pub struct SyncCoordinator<B: ViewerBackend> {
    backend: B,
    options: ViewerOptions,
    layout: LayoutConfiguration,
    slots: Vec<ViewerSlot<B::Instance>>,
    hub: Rc<SyncHub<B::Instance>>,
    /// Instances that already carry sync listeners; keys form the wired set.
    wired: HashMap<ViewerId, Subscription>,
    next_id: u64,
}

impl<B: ViewerBackend> SyncCoordinator<B> {
    /// Single pane, sync enabled.
    pub fn new(backend: B, options: ViewerOptions) -> Self {
        Self {
            backend,
            options,
            layout: LayoutConfiguration::new(PaneCount::One),
            slots: vec![ViewerSlot::empty(0)],
            hub: Rc::new(SyncHub::new(true)),
            wired: HashMap::new(),
            next_id: 0,
        }
    }

    /// Coordinator using the configured pane count, sync flag and viewer options.
    ///
    /// # Errors
    /// Returns `UnsupportedLayout` if `initial_pane_count` is not 1, 2, 4 or 9.
    pub fn with_config(backend: B, config: &SlideviewConfig) -> Result<Self> {
        let pane_count = PaneCount::try_from(config.initial_pane_count)?;
        let mut coordinator = Self::new(backend, config.viewer.clone());
        coordinator.set_pane_count(pane_count);
        coordinator.hub.set_enabled(config.sync_enabled);
        Ok(coordinator)
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Switch to `pane_count` panes.
    ///
    /// # Errors
    /// Returns `UnsupportedLayout` for anything but 1, 2, 4 or 9; the current
    /// layout is left untouched.
    pub fn set_layout(&mut self, pane_count: u32) -> Result<()> {
        let pane_count = PaneCount::try_from(pane_count)?;
        self.set_pane_count(pane_count);
        Ok(())
    }

    /// Destroy every pane and allocate `pane_count` empty ones.
    ///
    /// Destructive: loaded assignments are dropped and the selection cleared.
    /// The sync flag is kept; with no live instances nothing can propagate.
    pub fn set_pane_count(&mut self, pane_count: PaneCount) {
        self.teardown();
        self.layout.set_pane_count(pane_count);
        self.slots = (0..pane_count.count()).map(ViewerSlot::empty).collect();
        log::debug!("layout changed to {pane_count} panes");
    }

    #[must_use]
    pub fn pane_count(&self) -> PaneCount {
        self.layout.pane_count()
    }

    #[must_use]
    pub fn layout(&self) -> LayoutConfiguration {
        self.layout
    }

    // ------------------------------------------------------------------
    // Selection and loading
    // ------------------------------------------------------------------

    /// Target pane `index` with the next `load_into_selected`.
    ///
    /// # Errors
    /// Returns `InvalidIndex` if `index >= pane_count`.
    pub fn select_slot(&mut self, index: usize) -> Result<()> {
        self.layout.select(index)
    }

    #[must_use]
    pub fn selected_slot(&self) -> Option<usize> {
        self.layout.selected_slot()
    }

    /// Load `source` into the selected pane.
    ///
    /// # Errors
    /// Returns `NoSlotSelected` without a prior `select_slot`, or whatever
    /// `load_into_slot` returns.
    pub fn load_into_selected(&mut self, source: &TileSource, file_name: &str) -> Result<ViewerId> {
        let index = self
            .layout
            .selected_slot()
            .ok_or(SlideviewError::NoSlotSelected)?;
        self.load_into_slot(index, source, file_name)
    }

    /// Replace whatever pane `index` shows with a new viewer bound to `source`.
    ///
    /// The previous instance is unsubscribed and destroyed before the new one
    /// is constructed. If sync is enabled the new instance is wired at once.
    ///
    /// # Errors
    /// Returns `InvalidIndex` if `index >= pane_count`, or the backend's
    /// `ViewerCreation` error, in which case the pane is left empty.
    pub fn load_into_slot(
        &mut self,
        index: usize,
        source: &TileSource,
        file_name: &str,
    ) -> Result<ViewerId> {
        let pane_count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| SlideviewError::InvalidIndex {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                pane_count,
            })?;

        if let Some(previous) = slot.viewer.take() {
            release(previous, &mut self.wired, &self.hub);
        }
        slot.file_name = file_name.to_string();

        let instance = match self.backend.create(index, source, &self.options) {
            Ok(instance) => instance,
            Err(e) => {
                slot.file_name.clear();
                log::warn!("pane {index}: could not create viewer for {file_name}: {e}");
                return Err(e);
            }
        };

        let id = ViewerId(self.next_id);
        self.next_id += 1;
        self.hub.add_peer(id, Rc::clone(&instance));
        slot.viewer = Some(LiveViewer { id, instance });
        log::debug!("pane {index}: created {id} for {file_name}");

        if self.hub.enabled() {
            self.wire_all();
        }
        Ok(id)
    }

    /// Release the viewer in pane `index`, leaving the pane empty.
    ///
    /// # Errors
    /// Returns `InvalidIndex` if `index >= pane_count`.
    pub fn clear_slot(&mut self, index: usize) -> Result<()> {
        let index = check_index(index, self.slots.len())?;
        if let Some(slot) = self.slots.get_mut(index) {
            if let Some(live) = slot.viewer.take() {
                release(live, &mut self.wired, &self.hub);
            }
            slot.file_name.clear();
        }
        Ok(())
    }

    /// Release every live viewer. Panes stay allocated, empty.
    pub fn teardown(&mut self) {
        for slot in &mut self.slots {
            if let Some(live) = slot.viewer.take() {
                release(live, &mut self.wired, &self.hub);
            }
            slot.file_name.clear();
        }
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Flip zoom/pan mirroring. Returns the new state.
    pub fn toggle_sync(&mut self) -> bool {
        let enabled = !self.hub.enabled();
        self.set_sync_enabled(enabled);
        enabled
    }

    /// Enabling wires every live instance that isn't wired yet.
    pub fn set_sync_enabled(&mut self, enabled: bool) {
        self.hub.set_enabled(enabled);
        log::debug!("sync {}", if enabled { "enabled" } else { "disabled" });
        if enabled {
            self.wire_all();
        }
    }

    #[must_use]
    pub fn sync_enabled(&self) -> bool {
        self.hub.enabled()
    }

    /// True only while a zoom/pan event is being mirrored.
    #[must_use]
    pub fn is_broadcasting(&self) -> bool {
        self.hub.in_progress()
    }

    #[must_use]
    pub fn is_wired(&self, id: ViewerId) -> bool {
        self.wired.contains_key(&id)
    }

    /// Bind sync listeners to every live instance lacking them.
    fn wire_all(&mut self) {
        for live in self.slots.iter().filter_map(|slot| slot.viewer.as_ref()) {
            if self.wired.contains_key(&live.id) {
                continue;
            }
            let zoom = live
                .instance
                .add_listener(ViewportEventKind::Zoom, SyncHub::listener(&self.hub, live.id));
            let pan = live
                .instance
                .add_listener(ViewportEventKind::Pan, SyncHub::listener(&self.hub, live.id));
            self.wired.insert(live.id, Subscription { zoom, pan });
            log::trace!("wired {}", live.id);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn slots(&self) -> &[ViewerSlot<B::Instance>] {
        &self.slots
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&ViewerSlot<B::Instance>> {
        self.slots.get(index)
    }

    /// File shown in pane `index`; `None` when out of range.
    #[must_use]
    pub fn file_name(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(ViewerSlot::file_name)
    }

    #[must_use]
    pub fn live_viewer_count(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }

    #[must_use]
    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: ViewerBackend> Drop for SyncCoordinator<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Unsubscribe, forget and destroy one instance, in that order.
fn release<I: ViewerInstance + 'static>(
    live: LiveViewer<I>,
    wired: &mut HashMap<ViewerId, Subscription>,
    hub: &SyncHub<I>,
) {
    if let Some(subscription) = wired.remove(&live.id) {
        live.instance.remove_listener(subscription.zoom);
        live.instance.remove_listener(subscription.pan);
    }
    hub.remove_peer(live.id);
    live.instance.destroy();
    log::debug!("released {}", live.id);
}
