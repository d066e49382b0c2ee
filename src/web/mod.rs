//! Browser surface: the JavaScript-facing classes.
//!
//! - `SlideView` drives the pane grid and the OpenSeadragon viewers in it
//! - `SlideSession` keeps the logged-in user in `localStorage`
//! - `SlideGateway` exposes every remote API call as a `Promise`
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { SlideView, SlideGateway, initLogging } from 'slideview';
//! await init();
//! initLogging('info');
//! const view = new SlideView(JSON.stringify({ initialPaneCount: 4 }));
//! view.selectSlot(0);
//! view.loadIntoSelected('/dzi/case1/slide_files/', 'slide.svs', 46000, 32893);
//! ```

mod console;
mod fetch;
mod osd;
mod storage;

pub use fetch::FetchTransport;
pub use osd::{OsdBackend, OsdInstance};
pub use storage::LocalStorageStore;

use std::future::Future;
use std::rc::Rc;

use js_sys::{Array, Promise, Reflect, Uint8Array};
use log::LevelFilter;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::config::SlideviewConfig;
use crate::coordinator::SyncCoordinator;
use crate::gateway::{AnalysisGateway, UploadPart};
use crate::layout::slot_index;
use crate::session::{guard, Navigation, Route, SessionStore};
use crate::tile_source::TileSource;

/// Form field carrying each uploaded file.
const UPLOAD_FIELD: &str = "files";

/// Route `log` output to the browser console at `level` (`"error"` .. `"trace"`).
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) {
    console::install(level.parse().unwrap_or(LevelFilter::Info));
}

fn parse_config(config_json: Option<String>) -> crate::error::Result<SlideviewConfig> {
    match config_json {
        Some(json) => SlideviewConfig::from_json(&json),
        None => Ok(SlideviewConfig::default()),
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

// ============================================================================
// SlideView
// ============================================================================

/// The pane grid and its synchronized viewers.
#[wasm_bindgen]
pub struct SlideView {
    coordinator: SyncCoordinator<OsdBackend>,
}

#[wasm_bindgen]
impl SlideView {
    /// `config_json` is an optional `SlideviewConfig` JSON string.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<SlideView, JsValue> {
        console_error_panic_hook::set_once();
        let config = parse_config(config_json)?;
        Ok(Self {
            coordinator: SyncCoordinator::with_config(OsdBackend, &config)?,
        })
    }

    /// Destroy all viewers and switch to 1, 2, 4 or 9 panes.
    #[wasm_bindgen(js_name = setLayout)]
    pub fn set_layout(&mut self, pane_count: u32) -> Result<(), JsValue> {
        self.coordinator.set_layout(pane_count)?;
        Ok(())
    }

    #[wasm_bindgen(getter, js_name = paneCount)]
    pub fn pane_count(&self) -> u32 {
        u32::try_from(self.coordinator.pane_count().count()).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(js_name = selectSlot)]
    pub fn select_slot(&mut self, index: i32) -> Result<(), JsValue> {
        let index = slot_index(i64::from(index), self.coordinator.pane_count().count())?;
        self.coordinator.select_slot(index)?;
        Ok(())
    }

    #[wasm_bindgen(getter, js_name = selectedSlot)]
    pub fn selected_slot(&self) -> Option<u32> {
        self.coordinator
            .selected_slot()
            .and_then(|index| u32::try_from(index).ok())
    }

    /// Load a slide into the selected pane using the service's tiling defaults.
    #[wasm_bindgen(js_name = loadIntoSelected)]
    pub fn load_into_selected(
        &mut self,
        url: &str,
        file_name: &str,
        width: u32,
        height: u32,
    ) -> Result<(), JsValue> {
        let source = TileSource::with_defaults(url, u64::from(width), u64::from(height));
        self.coordinator.load_into_selected(&source, file_name)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = loadIntoSlot)]
    pub fn load_into_slot(
        &mut self,
        index: i32,
        url: &str,
        file_name: &str,
        width: u32,
        height: u32,
    ) -> Result<(), JsValue> {
        let index = slot_index(i64::from(index), self.coordinator.pane_count().count())?;
        let source = TileSource::with_defaults(url, u64::from(width), u64::from(height));
        self.coordinator.load_into_slot(index, &source, file_name)?;
        Ok(())
    }

    /// Load a full tile-source descriptor (`{url, width, height, tileSize?, overlap?, format?}`).
    #[wasm_bindgen(js_name = loadTileSource)]
    pub fn load_tile_source(
        &mut self,
        index: i32,
        source: JsValue,
        file_name: &str,
    ) -> Result<(), JsValue> {
        let index = slot_index(i64::from(index), self.coordinator.pane_count().count())?;
        let source: TileSource = serde_wasm_bindgen::from_value(source)?;
        self.coordinator.load_into_slot(index, &source, file_name)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = clearSlot)]
    pub fn clear_slot(&mut self, index: i32) -> Result<(), JsValue> {
        let index = slot_index(i64::from(index), self.coordinator.pane_count().count())?;
        self.coordinator.clear_slot(index)?;
        Ok(())
    }

    /// Returns the new sync state.
    #[wasm_bindgen(js_name = toggleSync)]
    pub fn toggle_sync(&mut self) -> bool {
        self.coordinator.toggle_sync()
    }

    #[wasm_bindgen(getter, js_name = syncEnabled)]
    pub fn sync_enabled(&self) -> bool {
        self.coordinator.sync_enabled()
    }

    /// Release every viewer (call on unmount).
    pub fn teardown(&mut self) {
        self.coordinator.teardown();
    }

    /// File name per pane, empty strings for empty panes.
    #[wasm_bindgen(js_name = fileNames)]
    pub fn file_names(&self) -> Vec<String> {
        self.coordinator
            .slots()
            .iter()
            .map(|slot| slot.file_name().to_string())
            .collect()
    }

    /// Row-major `{x, y, width, height}` rectangles for the current grid.
    #[wasm_bindgen(js_name = paneRects)]
    pub fn pane_rects(&self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        to_js(&self.coordinator.pane_count().pane_rects(width, height))
    }
}

// ============================================================================
// SlideSession
// ============================================================================

/// Logged-in user, persisted in `localStorage`.
#[wasm_bindgen]
pub struct SlideSession {
    session: SessionStore<LocalStorageStore>,
}

#[wasm_bindgen]
impl SlideSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<SlideSession, JsValue> {
        Ok(Self {
            session: SessionStore::open(LocalStorageStore::open()?)?,
        })
    }

    pub fn login(&mut self, username: &str) -> Result<(), JsValue> {
        self.session.login(username)?;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), JsValue> {
        self.session.logout()?;
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn username(&self) -> Option<String> {
        self.session.username().map(str::to_string)
    }

    #[wasm_bindgen(getter, js_name = isLoggedIn)]
    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Path to actually display when navigating to `path`.
    pub fn resolve(&self, path: &str) -> String {
        match Route::from_path(path) {
            Some(route) => match guard(route, &self.session) {
                Navigation::Proceed => route.path().to_string(),
                Navigation::Redirect(target) => target.path().to_string(),
            },
            None => path.to_string(),
        }
    }
}

// ============================================================================
// SlideGateway
// ============================================================================

/// Remote API calls; every method returns a `Promise` rejected with a message
/// on failure.
#[wasm_bindgen]
pub struct SlideGateway {
    inner: Rc<AnalysisGateway<FetchTransport>>,
}

fn promise<F, T>(future: F) -> Promise
where
    F: Future<Output = crate::error::Result<T>> + 'static,
    T: Serialize,
{
    future_to_promise(async move {
        let value = future.await?;
        to_js(&value)
    })
}

#[wasm_bindgen]
impl SlideGateway {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<SlideGateway, JsValue> {
        let config = parse_config(config_json)?;
        Ok(Self {
            inner: Rc::new(AnalysisGateway::from_config(FetchTransport, &config)),
        })
    }

    #[wasm_bindgen(js_name = listFolders)]
    pub fn list_folders(&self) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.list_folders().await })
    }

    #[wasm_bindgen(js_name = listFolderFiles)]
    pub fn list_folder_files(&self, folder: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.list_folder_files(&folder).await })
    }

    #[wasm_bindgen(js_name = deleteFolder)]
    pub fn delete_folder(&self, folder: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.delete_folder(&folder).await })
    }

    #[wasm_bindgen(js_name = deleteFile)]
    pub fn delete_file(&self, folder: String, file: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.delete_file(&folder, &file).await })
    }

    /// Upload `File` objects from a directory picker; folder-relative paths are kept.
    #[wasm_bindgen(js_name = uploadFolder)]
    pub fn upload_folder(&self, files: Array) -> Promise {
        let gateway = Rc::clone(&self.inner);
        future_to_promise(async move {
            let mut parts = Vec::new();
            for value in files.iter() {
                let file: web_sys::File = value.dyn_into()?;
                let relative_path = Reflect::get(&file, &JsValue::from_str("webkitRelativePath"))?
                    .as_string()
                    .filter(|path| !path.is_empty())
                    .unwrap_or_else(|| file.name());
                let buffer = JsFuture::from(file.array_buffer()).await?;
                parts.push(UploadPart {
                    field: UPLOAD_FIELD.to_string(),
                    file_name: relative_path,
                    bytes: Uint8Array::new(&buffer).to_vec(),
                });
            }
            let value = gateway.upload_folder(parts).await?;
            to_js(&value)
        })
    }

    #[wasm_bindgen(js_name = listRegistrationFolders)]
    pub fn list_registration_folders(&self) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.list_registration_folders().await })
    }

    #[wasm_bindgen(js_name = startRegistration)]
    pub fn start_registration(&self, folder: String, username: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.start_registration(&folder, &username).await })
    }

    #[wasm_bindgen(js_name = analyzeIhc)]
    pub fn analyze_ihc(&self, folder: String, file: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.analyze_ihc(&folder, &file).await })
    }

    /// Resolves to `null` when no result exists yet.
    #[wasm_bindgen(js_name = getFolderAnalysisResult)]
    pub fn folder_analysis_result(&self, folder: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.folder_analysis_result(&folder).await })
    }

    /// Resolves to `null` when no result exists yet.
    #[wasm_bindgen(js_name = getFileAnalysisResult)]
    pub fn file_analysis_result(&self, folder: String, file: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.file_analysis_result(&folder, &file).await })
    }

    #[wasm_bindgen(js_name = analyzeFullnet)]
    pub fn analyze_fullnet(&self, folder: String, file: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.analyze_fullnet(&folder, &file).await })
    }

    #[wasm_bindgen(js_name = getFullnetTaskStatus)]
    pub fn fullnet_task_status(&self, task_id: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.fullnet_task_status(&task_id).await })
    }

    /// Resolves to `null` when no result exists yet.
    #[wasm_bindgen(js_name = getFullnetResult)]
    pub fn fullnet_result(&self, filename: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.fullnet_result(&filename).await })
    }

    #[wasm_bindgen(js_name = getAllFullnetResults)]
    pub fn all_fullnet_results(&self) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.all_fullnet_results().await })
    }

    pub fn login(&self, username: String, password: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.login(&username, &password).await })
    }

    pub fn register(&self, username: String, password: String) -> Promise {
        let gateway = Rc::clone(&self.inner);
        promise(async move { gateway.register(&username, &password).await })
    }
}
