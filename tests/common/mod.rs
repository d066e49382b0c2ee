//! Shared test doubles for slideview integration tests.
//!
//! - `MockBackend` / `MockViewer`: an in-memory deep-zoom viewer that records
//!   every create, destroy, zoom-to and pan-to, and (like the real library)
//!   re-emits a viewport event whenever it is moved programmatically
//! - `MockTransport`: scripted HTTP responses plus a request log
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use slideview::config::ViewerOptions;
use slideview::coordinator::SyncCoordinator;
use slideview::gateway::{HttpRequest, HttpResponse, Transport};
use slideview::tile_source::TileSource;
use slideview::viewer::{
    ListenerToken, ViewerBackend, ViewerInstance, ViewportEvent, ViewportEventKind,
    ViewportListener, ViewportPoint,
};
use slideview::{Result, SlideviewError};

/// Ordered lifecycle log shared between a backend and its viewers.
pub type EventLog = Rc<RefCell<Vec<String>>>;

// ============================================================================
// Viewer doubles
// ============================================================================

pub struct MockViewer {
    pub serial: usize,
    pub slot: usize,
    pub element_id: String,
    pub source: TileSource,
    zoom: Cell<f64>,
    center: Cell<ViewportPoint>,
    listeners: RefCell<Vec<(ListenerToken, ViewportEventKind, ViewportListener)>>,
    next_token: Cell<u64>,
    zoom_to_calls: Cell<usize>,
    pan_to_calls: Cell<usize>,
    destroy_calls: Cell<usize>,
    /// Re-emit a viewport event when moved programmatically.
    echo: Cell<bool>,
    log: EventLog,
}

impl MockViewer {
    fn emit(&self, event: ViewportEvent) {
        // Release the borrow before calling out: listeners may re-enter.
        let listeners: Vec<ViewportListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind())
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }

    /// Simulate the user zooming this pane.
    pub fn user_zoom(&self, zoom: f64) {
        self.zoom.set(zoom);
        self.emit(ViewportEvent::Zoomed(zoom));
    }

    /// Simulate the user dragging this pane.
    pub fn user_pan(&self, x: f64, y: f64) {
        let center = ViewportPoint::new(x, y);
        self.center.set(center);
        self.emit(ViewportEvent::Panned(center));
    }

    pub fn set_echo(&self, echo: bool) {
        self.echo.set(echo);
    }

    pub fn zoom_to_calls(&self) -> usize {
        self.zoom_to_calls.get()
    }

    pub fn pan_to_calls(&self) -> usize {
        self.pan_to_calls.get()
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn current_zoom(&self) -> f64 {
        self.zoom.get()
    }

    pub fn current_center(&self) -> ViewportPoint {
        self.center.get()
    }
}

impl ViewerInstance for MockViewer {
    fn zoom(&self) -> f64 {
        self.zoom.get()
    }

    fn center(&self) -> ViewportPoint {
        self.center.get()
    }

    fn zoom_to(&self, zoom: f64) {
        self.zoom_to_calls.set(self.zoom_to_calls.get() + 1);
        self.zoom.set(zoom);
        if self.echo.get() {
            self.emit(ViewportEvent::Zoomed(zoom));
        }
    }

    fn pan_to(&self, center: ViewportPoint) {
        self.pan_to_calls.set(self.pan_to_calls.get() + 1);
        self.center.set(center);
        if self.echo.get() {
            self.emit(ViewportEvent::Panned(center));
        }
    }

    fn add_listener(&self, kind: ViewportEventKind, listener: ViewportListener) -> ListenerToken {
        let token = ListenerToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.listeners.borrow_mut().push((token, kind, listener));
        token
    }

    fn remove_listener(&self, token: ListenerToken) {
        self.listeners.borrow_mut().retain(|(t, _, _)| *t != token);
    }

    fn destroy(&self) {
        self.destroy_calls.set(self.destroy_calls.get() + 1);
        self.log
            .borrow_mut()
            .push(format!("destroy #{} slot {}", self.serial, self.slot));
    }
}

#[derive(Default)]
pub struct MockBackend {
    created: RefCell<Vec<Rc<MockViewer>>>,
    log: EventLog,
    fail_next: Cell<bool>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> EventLog {
        Rc::clone(&self.log)
    }

    /// Every viewer ever created, in creation order.
    pub fn created(&self) -> Vec<Rc<MockViewer>> {
        self.created.borrow().clone()
    }

    pub fn viewer(&self, serial: usize) -> Rc<MockViewer> {
        Rc::clone(&self.created.borrow()[serial])
    }

    /// Make the next `create` fail.
    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }
}

impl ViewerBackend for MockBackend {
    type Instance = MockViewer;

    fn create(
        &mut self,
        slot: usize,
        source: &TileSource,
        options: &ViewerOptions,
    ) -> Result<Rc<MockViewer>> {
        if self.fail_next.replace(false) {
            return Err(SlideviewError::ViewerCreation("element not found".into()));
        }
        let serial = self.created.borrow().len();
        self.log
            .borrow_mut()
            .push(format!("create #{serial} slot {slot}"));
        let viewer = Rc::new(MockViewer {
            serial,
            slot,
            element_id: options.element_id(slot),
            source: source.clone(),
            zoom: Cell::new(1.0),
            center: Cell::new(ViewportPoint::new(0.5, 0.5)),
            listeners: RefCell::new(Vec::new()),
            next_token: Cell::new(0),
            zoom_to_calls: Cell::new(0),
            pan_to_calls: Cell::new(0),
            destroy_calls: Cell::new(0),
            echo: Cell::new(true),
            log: Rc::clone(&self.log),
        });
        self.created.borrow_mut().push(Rc::clone(&viewer));
        Ok(viewer)
    }
}

/// Coordinator over a fresh mock backend, switched to `panes` panes.
pub fn coordinator(panes: u32) -> SyncCoordinator<MockBackend> {
    let mut coordinator = SyncCoordinator::new(MockBackend::new(), ViewerOptions::default());
    coordinator.set_layout(panes).unwrap();
    coordinator
}

/// Coordinator with every pane loaded.
pub fn loaded_coordinator(panes: u32) -> SyncCoordinator<MockBackend> {
    let mut coordinator = coordinator(panes);
    for index in 0..coordinator.pane_count().count() {
        coordinator
            .load_into_slot(index, &source(&format!("slide{index}")), &format!("slide{index}.svs"))
            .unwrap();
    }
    coordinator
}

/// Live viewer shown in pane `index`.
pub fn viewer_at(coordinator: &SyncCoordinator<MockBackend>, index: usize) -> Rc<MockViewer> {
    Rc::clone(coordinator.slot(index).unwrap().viewer().unwrap())
}

pub fn source(name: &str) -> TileSource {
    TileSource::with_defaults(format!("/dzi/case1/{name}_files/"), 46000, 32893)
}

// ============================================================================
// Transport double
// ============================================================================

#[derive(Default)]
pub struct MockTransport {
    responses: RefCell<VecDeque<std::result::Result<HttpResponse, String>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with `status` and `body`.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses.borrow_mut().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    /// Queue a transport-level failure.
    pub fn fail(self, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.borrow().last().cloned().expect("no request sent")
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, String> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response".to_string()))
    }
}
