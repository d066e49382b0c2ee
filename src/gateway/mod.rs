//! Request/response wrapper around the remote file, analysis and user APIs.
//!
//! Every call returns the parsed JSON payload on success. A non-success
//! status or a transport failure becomes `RequestFailed` carrying a
//! human-readable message and the cause. Result lookups map HTTP 404 to
//! `Ok(None)`. Nothing is retried.

mod transport;

pub use transport::{Body, HttpRequest, HttpResponse, Method, Transport, UploadPart};

use serde_json::{json, Value};
use urlencoding::encode;

use crate::config::SlideviewConfig;
use crate::error::{RequestCause, Result, SlideviewError};

const NOT_FOUND: u16 = 404;

pub struct AnalysisGateway<T: Transport> {
    transport: T,
    base_url: String,
}

impl<T: Transport> AnalysisGateway<T> {
    /// `base_url` prefixes every API path; pass `""` for same-origin requests.
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(transport: T, config: &SlideviewConfig) -> Self {
        Self::new(transport, &config.api_base_url)
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// `GET /api/dzi/list`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn list_folders(&self) -> Result<Value> {
        self.fetch_json(Method::Get, "/api/dzi/list", Body::Empty, "Failed to list folders")
            .await
    }

    /// `GET /api/dzi/list/{folder}`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn list_folder_files(&self, folder: &str) -> Result<Value> {
        self.fetch_json(
            Method::Get,
            &format!("/api/dzi/list/{}", encode(folder)),
            Body::Empty,
            &format!("Failed to list folder {folder}"),
        )
        .await
    }

    /// `DELETE /api/dzi/deleteFolder/{folder}`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure or non-2xx status.
    pub async fn delete_folder(&self, folder: &str) -> Result<bool> {
        self.fetch_ok(
            Method::Delete,
            &format!("/api/dzi/deleteFolder/{}", encode(folder)),
            Body::Empty,
            &format!("Failed to delete folder {folder}"),
        )
        .await
    }

    /// `DELETE /api/dzi/delete/{folder}/{file}`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure or non-2xx status.
    pub async fn delete_file(&self, folder: &str, file: &str) -> Result<bool> {
        self.fetch_ok(
            Method::Delete,
            &format!("/api/dzi/delete/{}/{}", encode(folder), encode(file)),
            Body::Empty,
            &format!("Failed to delete file {file}"),
        )
        .await
    }

    /// `POST /api/svs/upload` (multipart)
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn upload_folder(&self, parts: Vec<UploadPart>) -> Result<Value> {
        self.fetch_json(
            Method::Post,
            "/api/svs/upload",
            Body::Multipart(parts),
            "Failed to upload folder",
        )
        .await
    }

    // ------------------------------------------------------------------
    // Registration and analysis
    // ------------------------------------------------------------------

    /// `GET /api/svs/list`; a single object payload is wrapped into a list.
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn list_registration_folders(&self) -> Result<Vec<Value>> {
        let payload = self
            .fetch_json(
                Method::Get,
                "/api/svs/list",
                Body::Empty,
                "Failed to list registration folders",
            )
            .await?;
        Ok(match payload {
            Value::Array(items) => items,
            other => vec![other],
        })
    }

    /// `POST /api/svs/register/{folder}` with `{username}`.
    ///
    /// # Errors
    /// `RequestFailed` on transport failure or non-2xx status.
    pub async fn start_registration(&self, folder: &str, username: &str) -> Result<bool> {
        self.fetch_ok(
            Method::Post,
            &format!("/api/svs/register/{}", encode(folder)),
            Body::Json(json!({ "username": username })),
            "Image registration failed",
        )
        .await
    }

    /// `POST /api/ihc/analyze?folderName&fileName`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn analyze_ihc(&self, folder: &str, file: &str) -> Result<Value> {
        self.fetch_json(
            Method::Post,
            &format!(
                "/api/ihc/analyze?folderName={}&fileName={}",
                encode(folder),
                encode(file)
            ),
            Body::Empty,
            "IHC analysis failed",
        )
        .await
    }

    /// `GET /api/ihc/resultfolder?folderName`; `None` on 404.
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, other non-2xx status or invalid JSON.
    pub async fn folder_analysis_result(&self, folder: &str) -> Result<Option<Value>> {
        self.fetch_optional(
            &format!("/api/ihc/resultfolder?folderName={}", encode(folder)),
            "Failed to query folder analysis result",
        )
        .await
    }

    /// `GET /api/ihc/result?folderName&fileName`; `None` on 404.
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, other non-2xx status or invalid JSON.
    pub async fn file_analysis_result(&self, folder: &str, file: &str) -> Result<Option<Value>> {
        self.fetch_optional(
            &format!(
                "/api/ihc/result?folderName={}&fileName={}",
                encode(folder),
                encode(file)
            ),
            "Failed to query image analysis result",
        )
        .await
    }

    /// `POST /api/fullnet/analyze` with `{filename: "{folder}/{file}"}`.
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn analyze_fullnet(&self, folder: &str, file: &str) -> Result<Value> {
        self.fetch_json(
            Method::Post,
            "/api/fullnet/analyze",
            Body::Json(json!({ "filename": format!("{folder}/{file}") })),
            "Fullnet analysis failed",
        )
        .await
    }

    /// `GET /api/fullnet/task/{taskId}`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn fullnet_task_status(&self, task_id: &str) -> Result<Value> {
        self.fetch_json(
            Method::Get,
            &format!("/api/fullnet/task/{}", encode(task_id)),
            Body::Empty,
            "Failed to query analysis task status",
        )
        .await
    }

    /// `GET /api/fullnet/result?filename`; `None` on 404.
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, other non-2xx status or invalid JSON.
    pub async fn fullnet_result(&self, filename: &str) -> Result<Option<Value>> {
        self.fetch_optional(
            &format!("/api/fullnet/result?filename={}", encode(filename)),
            "Failed to fetch Fullnet result",
        )
        .await
    }

    /// `GET /api/fullnet/results`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn all_fullnet_results(&self) -> Result<Value> {
        self.fetch_json(
            Method::Get,
            "/api/fullnet/results",
            Body::Empty,
            "Failed to fetch all Fullnet results",
        )
        .await
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// `POST /api/user/login`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn login(&self, username: &str, password: &str) -> Result<Value> {
        self.fetch_json(
            Method::Post,
            "/api/user/login",
            Body::Json(json!({ "username": username, "password": password })),
            "Login failed",
        )
        .await
    }

    /// `POST /api/user/register`
    ///
    /// # Errors
    /// `RequestFailed` on transport failure, non-2xx status or invalid JSON.
    pub async fn register(&self, username: &str, password: &str) -> Result<Value> {
        self.fetch_json(
            Method::Post,
            "/api/user/register",
            Body::Json(json!({ "username": username, "password": password })),
            "Registration failed",
        )
        .await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Body,
        message: &str,
    ) -> Result<HttpResponse> {
        let request = HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            body,
        };
        log::debug!("{} {}", method.as_str(), request.url);
        self.transport
            .send(request)
            .await
            .map_err(|e| failure(message, RequestCause::Transport(e)))
    }

    async fn fetch_json(&self, method: Method, path: &str, body: Body, message: &str) -> Result<Value> {
        let response = self.execute(method, path, body, message).await?;
        if !response.is_success() {
            return Err(failure(message, RequestCause::Status(response.status)));
        }
        parse_body(&response, message)
    }

    async fn fetch_optional(&self, path: &str, message: &str) -> Result<Option<Value>> {
        let response = self.execute(Method::Get, path, Body::Empty, message).await?;
        if response.status == NOT_FOUND {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(failure(message, RequestCause::Status(response.status)));
        }
        parse_body(&response, message).map(Some)
    }

    async fn fetch_ok(&self, method: Method, path: &str, body: Body, message: &str) -> Result<bool> {
        let response = self.execute(method, path, body, message).await?;
        if !response.is_success() {
            return Err(failure(message, RequestCause::Status(response.status)));
        }
        Ok(true)
    }
}

fn parse_body(response: &HttpResponse, message: &str) -> Result<Value> {
    serde_json::from_str(&response.body)
        .map_err(|e| failure(message, RequestCause::Decode(e.to_string())))
}

fn failure(message: &str, cause: RequestCause) -> SlideviewError {
    log::error!("API error: {message}: {cause}");
    SlideviewError::request(message, cause)
}
