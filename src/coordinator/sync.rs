//! Zoom/pan mirroring across live viewer instances.
//!
//! The emitting instance is the source of truth: its current zoom or center
//! is read once and applied verbatim to every other live instance. A single
//! hub-wide `in_progress` flag suppresses the events those followers emit
//! while being moved, so one user gesture produces exactly one broadcast.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::viewer::{ViewerId, ViewerInstance, ViewportEvent, ViewportEventKind, ViewportListener};

pub(crate) struct SyncHub<I> {
    enabled: Cell<bool>,
    in_progress: Cell<bool>,
    peers: RefCell<Vec<(ViewerId, Rc<I>)>>,
}

/// Clears `in_progress` however the broadcast exits.
struct BroadcastGuard<'a>(&'a Cell<bool>);

impl Drop for BroadcastGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<I: ViewerInstance + 'static> SyncHub<I> {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled: Cell::new(enabled),
            in_progress: Cell::new(false),
            peers: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub(crate) fn in_progress(&self) -> bool {
        self.in_progress.get()
    }

    pub(crate) fn add_peer(&self, id: ViewerId, instance: Rc<I>) {
        self.peers.borrow_mut().push((id, instance));
    }

    pub(crate) fn remove_peer(&self, id: ViewerId) {
        self.peers.borrow_mut().retain(|(peer, _)| *peer != id);
    }

    fn is_live(&self, id: ViewerId) -> bool {
        self.peers.borrow().iter().any(|(peer, _)| *peer == id)
    }

    /// Listener forwarding `source`'s viewport events into the hub.
    ///
    /// Holds the hub weakly: once the coordinator is gone the listener is inert.
    pub(crate) fn listener(hub: &Rc<Self>, source: ViewerId) -> ViewportListener {
        let weak: Weak<Self> = Rc::downgrade(hub);
        Rc::new(move |event: &ViewportEvent| {
            if let Some(hub) = weak.upgrade() {
                hub.broadcast(source, event.kind());
            }
        })
    }

    /// Mirror `source`'s current zoom or center onto every other live peer.
    ///
    /// Returns the number of followers moved. Nothing happens while sync is
    /// disabled or another broadcast is already running.
    pub(crate) fn broadcast(&self, source: ViewerId, kind: ViewportEventKind) -> usize {
        if !self.enabled.get() {
            return 0;
        }
        if self.in_progress.get() {
            log::trace!("suppressed nested {kind:?} event from {source}");
            return 0;
        }

        // Snapshot so followers may re-enter (emit, or be released) mid-loop.
        let peers: Vec<(ViewerId, Rc<I>)> = self
            .peers
            .borrow()
            .iter()
            .map(|(id, instance)| (*id, Rc::clone(instance)))
            .collect();
        let Some(leader) = peers
            .iter()
            .find(|(id, _)| *id == source)
            .map(|(_, instance)| Rc::clone(instance))
        else {
            return 0;
        };

        self.in_progress.set(true);
        let _guard = BroadcastGuard(&self.in_progress);

        let followers = peers.iter().filter(|(id, _)| *id != source);
        let mut moved = 0;
        match kind {
            ViewportEventKind::Zoom => {
                let zoom = leader.zoom();
                for (id, follower) in followers {
                    if self.is_live(*id) {
                        follower.zoom_to(zoom);
                        moved += 1;
                    }
                }
            }
            ViewportEventKind::Pan => {
                let center = leader.center();
                for (id, follower) in followers {
                    if self.is_live(*id) {
                        follower.pan_to(center);
                        moved += 1;
                    }
                }
            }
        }
        moved
    }
}
