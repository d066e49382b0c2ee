//! Browser HTTP transport for the analysis gateway.

use gloo_net::http::{Request, RequestBuilder};
use js_sys::{Array, Uint8Array};
use web_sys::{Blob, FormData};

use super::osd::js_message;
use crate::gateway::{Body, HttpRequest, HttpResponse, Method, Transport, UploadPart};

#[derive(Debug, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, String> {
        let builder = builder(request.method, &request.url);
        let prepared = match &request.body {
            Body::Empty => builder.build(),
            Body::Json(value) => builder.json(value),
            Body::Multipart(parts) => builder.body(form_data(parts)?),
        }
        .map_err(|e| e.to_string())?;

        let response = prepared.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;

        Ok(HttpResponse { status, body })
    }
}

fn builder(method: Method, url: &str) -> RequestBuilder {
    match method {
        Method::Get => Request::get(url),
        Method::Post => Request::post(url),
        Method::Delete => Request::delete(url),
    }
}

fn form_data(parts: &[UploadPart]) -> std::result::Result<FormData, String> {
    let form = FormData::new().map_err(|e| js_message(&e))?;
    for part in parts {
        let bytes = Uint8Array::from(part.bytes.as_slice());
        let blob = Blob::new_with_u8_array_sequence(&Array::of1(&bytes))
            .map_err(|e| js_message(&e))?;
        form.append_with_blob_and_filename(&part.field, &blob, &part.file_name)
            .map_err(|e| js_message(&e))?;
    }
    Ok(form)
}
