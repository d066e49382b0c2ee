//! OpenSeadragon bindings and the browser `ViewerBackend`.
//!
//! Expects the `OpenSeadragon` global to be loaded by the host page.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::ViewerOptions;
use crate::error::{Result, SlideviewError};
use crate::tile_source::{TileSource, TileSourceDocument};
use crate::viewer::{
    ListenerToken, ViewerBackend, ViewerInstance, ViewportEvent, ViewportEventKind,
    ViewportListener, ViewportPoint,
};

#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    type OsdViewer;

    #[wasm_bindgen(catch, js_name = OpenSeadragon)]
    fn open_seadragon(options: &JsValue) -> std::result::Result<OsdViewer, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn viewport(this: &OsdViewer) -> OsdViewport;

    #[wasm_bindgen(method, js_name = addHandler)]
    fn add_handler(this: &OsdViewer, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method, js_name = removeHandler)]
    fn remove_handler(this: &OsdViewer, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn destroy(this: &OsdViewer);

    #[derive(Debug, Clone)]
    type OsdViewport;

    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &OsdViewport) -> f64;

    #[wasm_bindgen(method, js_name = getCenter)]
    fn get_center(this: &OsdViewport) -> OsdPoint;

    #[wasm_bindgen(method, js_name = zoomTo)]
    fn zoom_to(this: &OsdViewport, zoom: f64);

    #[wasm_bindgen(method, js_name = panTo)]
    fn pan_to(this: &OsdViewport, center: &OsdPoint);
}

#[wasm_bindgen(js_namespace = OpenSeadragon)]
extern "C" {
    #[wasm_bindgen(js_name = Point)]
    #[derive(Debug, Clone)]
    type OsdPoint;

    #[wasm_bindgen(constructor, js_class = "Point")]
    fn new(x: f64, y: f64) -> OsdPoint;

    #[wasm_bindgen(method, getter)]
    fn x(this: &OsdPoint) -> f64;

    #[wasm_bindgen(method, getter)]
    fn y(this: &OsdPoint) -> f64;
}

impl From<OsdPoint> for ViewportPoint {
    fn from(point: OsdPoint) -> Self {
        ViewportPoint::new(point.x(), point.y())
    }
}

/// Options object passed to the `OpenSeadragon` constructor.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OsdOptions<'a> {
    id: String,
    prefix_url: &'a str,
    tile_sources: TileSourceDocument,
    gesture_settings_mouse: GestureSettings,
    show_navigator: bool,
    fullscreen: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GestureSettings {
    scroll_to_zoom: bool,
}

/// Creates OpenSeadragon viewers inside `{element_id_prefix}{slot}` elements.
#[derive(Debug, Default)]
pub struct OsdBackend;

impl ViewerBackend for OsdBackend {
    type Instance = OsdInstance;

    fn create(
        &mut self,
        slot: usize,
        source: &TileSource,
        options: &ViewerOptions,
    ) -> Result<Rc<OsdInstance>> {
        let osd_options = OsdOptions {
            id: options.element_id(slot),
            prefix_url: &options.prefix_url,
            tile_sources: source.to_document(),
            gesture_settings_mouse: GestureSettings {
                scroll_to_zoom: options.scroll_to_zoom,
            },
            show_navigator: options.show_navigator,
            fullscreen: options.fullscreen,
        };
        let js_options = serde_wasm_bindgen::to_value(&osd_options)
            .map_err(|e| SlideviewError::ViewerCreation(e.to_string()))?;
        let viewer = open_seadragon(&js_options)
            .map_err(|e| SlideviewError::ViewerCreation(js_message(&e)))?;
        Ok(Rc::new(OsdInstance::new(viewer)))
    }
}

struct Handler {
    kind: ViewportEventKind,
    callback: Closure<dyn FnMut(JsValue)>,
}

/// A live OpenSeadragon viewer plus the closures registered on it.
pub struct OsdInstance {
    viewer: OsdViewer,
    handlers: RefCell<HashMap<ListenerToken, Handler>>,
    next_token: Cell<u64>,
}

impl OsdInstance {
    fn new(viewer: OsdViewer) -> Self {
        Self {
            viewer,
            handlers: RefCell::new(HashMap::new()),
            next_token: Cell::new(0),
        }
    }
}

impl ViewerInstance for OsdInstance {
    fn zoom(&self) -> f64 {
        self.viewer.viewport().get_zoom()
    }

    fn center(&self) -> ViewportPoint {
        self.viewer.viewport().get_center().into()
    }

    fn zoom_to(&self, zoom: f64) {
        self.viewer.viewport().zoom_to(zoom);
    }

    fn pan_to(&self, center: ViewportPoint) {
        self.viewer
            .viewport()
            .pan_to(&OsdPoint::new(center.x, center.y));
    }

    fn add_listener(&self, kind: ViewportEventKind, listener: ViewportListener) -> ListenerToken {
        let token = ListenerToken(self.next_token.get());
        self.next_token.set(token.0 + 1);

        let viewer = self.viewer.clone();
        let callback = Closure::wrap(Box::new(move |_event: JsValue| {
            let viewport = viewer.viewport();
            let event = match kind {
                ViewportEventKind::Zoom => ViewportEvent::Zoomed(viewport.get_zoom()),
                ViewportEventKind::Pan => ViewportEvent::Panned(viewport.get_center().into()),
            };
            listener(&event);
        }) as Box<dyn FnMut(JsValue)>);

        self.viewer
            .add_handler(kind.handler_name(), callback.as_ref().unchecked_ref());
        self.handlers
            .borrow_mut()
            .insert(token, Handler { kind, callback });
        token
    }

    fn remove_listener(&self, token: ListenerToken) {
        let removed = self.handlers.borrow_mut().remove(&token);
        if let Some(handler) = removed {
            self.viewer.remove_handler(
                handler.kind.handler_name(),
                handler.callback.as_ref().unchecked_ref(),
            );
        }
    }

    fn destroy(&self) {
        let handlers: Vec<Handler> = self.handlers.borrow_mut().drain().map(|(_, h)| h).collect();
        for handler in &handlers {
            self.viewer.remove_handler(
                handler.kind.handler_name(),
                handler.callback.as_ref().unchecked_ref(),
            );
        }
        self.viewer.destroy();
    }
}

pub(crate) fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
