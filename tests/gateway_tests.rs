//! Remote API gateway tests for slideview
//!
//! Tests for URL construction, request bodies, status handling, 404 lookups,
//! payload normalization and transport failures, against a scripted transport.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::MockTransport;
use futures::executor::block_on;
use serde_json::json;
use slideview::gateway::{Body, Method, UploadPart};
use slideview::{AnalysisGateway, RequestCause, SlideviewConfig, SlideviewError};
use test_case::test_case;

fn gateway(transport: MockTransport) -> AnalysisGateway<MockTransport> {
    AnalysisGateway::new(transport, "http://api.local/")
}

#[test]
fn list_folders_returns_payload() {
    let api = gateway(MockTransport::new().respond(200, r#"["case1","case2"]"#));

    let folders = block_on(api.list_folders()).unwrap();

    assert_eq!(folders, json!(["case1", "case2"]));
    let request = api.transport().last_request();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, "http://api.local/api/dzi/list");
    assert_eq!(request.body, Body::Empty);
}

#[test]
fn path_segments_are_encoded() {
    let api = gateway(MockTransport::new().respond(200, "[]"));

    block_on(api.list_folder_files("case 1/a")).unwrap();

    assert_eq!(
        api.transport().last_request().url,
        "http://api.local/api/dzi/list/case%201%2Fa"
    );
}

#[test]
fn query_values_are_encoded() {
    let api = gateway(MockTransport::new().respond(200, r#"{"task":"t1"}"#));

    block_on(api.analyze_ihc("case&1", "slide #2.svs")).unwrap();

    let request = api.transport().last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(
        request.url,
        "http://api.local/api/ihc/analyze?folderName=case%261&fileName=slide%20%232.svs"
    );
}

#[test]
fn missing_results_are_none() {
    let api = gateway(
        MockTransport::new()
            .respond(404, "")
            .respond(404, r#"{"detail":"Not Found"}"#)
            .respond(404, ""),
    );

    assert_eq!(block_on(api.folder_analysis_result("case1")).unwrap(), None);
    assert_eq!(block_on(api.file_analysis_result("case1", "a.svs")).unwrap(), None);
    assert_eq!(block_on(api.fullnet_result("case1/a.svs")).unwrap(), None);
}

#[test]
fn present_result_is_some() {
    let api = gateway(MockTransport::new().respond(200, r#"{"positive":0.42}"#));

    let result = block_on(api.file_analysis_result("case1", "a.svs")).unwrap();

    assert_eq!(result, Some(json!({ "positive": 0.42 })));
    assert_eq!(
        api.transport().last_request().url,
        "http://api.local/api/ihc/result?folderName=case1&fileName=a.svs"
    );
}

#[test_case(400)]
#[test_case(401)]
#[test_case(500)]
#[test_case(503)]
fn error_status_becomes_request_failed(status: u16) {
    let api = gateway(MockTransport::new().respond(status, r#"{"detail":"boom"}"#));

    let err = block_on(api.all_fullnet_results()).unwrap_err();

    assert_eq!(err.status(), Some(status));
    match err {
        SlideviewError::RequestFailed { message, cause } => {
            assert_eq!(message, "Failed to fetch all Fullnet results");
            assert_eq!(cause, RequestCause::Status(status));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test_case("folder" ; "folder analysis result")]
#[test_case("file" ; "file analysis result")]
#[test_case("fullnet" ; "fullnet result")]
fn server_error_on_lookup_is_not_swallowed(lookup: &str) {
    let api = gateway(MockTransport::new().respond(500, r#"{"detail":"boom"}"#));

    let result = match lookup {
        "folder" => block_on(api.folder_analysis_result("case1")),
        "file" => block_on(api.file_analysis_result("case1", "a.svs")),
        _ => block_on(api.fullnet_result("case1/a.svs")),
    };

    let err = result.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(matches!(
        err,
        SlideviewError::RequestFailed {
            cause: RequestCause::Status(500),
            ..
        }
    ));
}

#[test]
fn transport_failure_has_no_status() {
    let api = gateway(MockTransport::new().fail("connection refused"));

    let err = block_on(api.login("alice", "secret")).unwrap_err();

    assert_eq!(err.status(), None);
    assert!(matches!(
        err,
        SlideviewError::RequestFailed {
            cause: RequestCause::Transport(ref reason),
            ..
        } if reason == "connection refused"
    ));
    assert!(err.to_string().starts_with("Login failed"));
}

#[test]
fn invalid_json_is_a_decode_failure() {
    let api = gateway(MockTransport::new().respond(200, "<html>oops</html>"));

    let err = block_on(api.list_folders()).unwrap_err();

    assert!(matches!(
        err,
        SlideviewError::RequestFailed {
            cause: RequestCause::Decode(_),
            ..
        }
    ));
}

#[test]
fn fullnet_analysis_joins_folder_and_file() {
    let api = gateway(MockTransport::new().respond(200, r#"{"task_id":"42"}"#));

    let task = block_on(api.analyze_fullnet("case1", "a.svs")).unwrap();

    assert_eq!(task["task_id"], "42");
    let request = api.transport().last_request();
    assert_eq!(request.url, "http://api.local/api/fullnet/analyze");
    assert_eq!(request.body, Body::Json(json!({ "filename": "case1/a.svs" })));
}

#[test]
fn task_status_and_fullnet_lookup_urls() {
    let api = gateway(
        MockTransport::new()
            .respond(200, r#"{"status":"running"}"#)
            .respond(200, "{}"),
    );

    block_on(api.fullnet_task_status("42")).unwrap();
    block_on(api.fullnet_result("case1/a.svs")).unwrap();

    let requests = api.transport().requests();
    assert_eq!(requests[0].url, "http://api.local/api/fullnet/task/42");
    assert_eq!(
        requests[1].url,
        "http://api.local/api/fullnet/result?filename=case1%2Fa.svs"
    );
}

#[test_case(r#"[{"name":"a"},{"name":"b"}]"#, 2 ; "array kept")]
#[test_case(r#"{"name":"a"}"#, 1 ; "object wrapped")]
#[test_case("[]", 0 ; "empty array")]
fn registration_folders_are_always_a_list(body: &str, expected: usize) {
    let api = gateway(MockTransport::new().respond(200, body));

    let folders = block_on(api.list_registration_folders()).unwrap();

    assert_eq!(folders.len(), expected);
}

#[test]
fn start_registration_posts_username() {
    let api = gateway(MockTransport::new().respond(202, ""));

    assert!(block_on(api.start_registration("case 1", "alice")).unwrap());

    let request = api.transport().last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://api.local/api/svs/register/case%201");
    assert_eq!(request.body, Body::Json(json!({ "username": "alice" })));
}

#[test]
fn deletes_report_success() {
    let api = gateway(MockTransport::new().respond(204, "").respond(200, ""));

    assert!(block_on(api.delete_folder("case1")).unwrap());
    assert!(block_on(api.delete_file("case1", "a.svs")).unwrap());

    let requests = api.transport().requests();
    assert_eq!(requests[0].method, Method::Delete);
    assert_eq!(requests[0].url, "http://api.local/api/dzi/deleteFolder/case1");
    assert_eq!(requests[1].url, "http://api.local/api/dzi/delete/case1/a.svs");
}

#[test]
fn failed_delete_is_an_error() {
    let api = gateway(MockTransport::new().respond(404, ""));

    let err = block_on(api.delete_folder("missing")).unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[test]
fn upload_sends_multipart_parts() {
    let api = gateway(MockTransport::new().respond(200, r#"{"uploaded":1}"#));
    let part = UploadPart {
        field: "files".into(),
        file_name: "case1/a.svs".into(),
        bytes: vec![1, 2, 3],
    };

    block_on(api.upload_folder(vec![part.clone()])).unwrap();

    let request = api.transport().last_request();
    assert_eq!(request.url, "http://api.local/api/svs/upload");
    assert_eq!(request.body, Body::Multipart(vec![part]));
}

#[test]
fn user_endpoints_post_credentials() {
    let api = gateway(
        MockTransport::new()
            .respond(200, r#"{"ok":true}"#)
            .respond(201, r#"{"ok":true}"#),
    );

    block_on(api.login("alice", "secret")).unwrap();
    block_on(api.register("bob", "hunter2")).unwrap();

    let requests = api.transport().requests();
    assert_eq!(requests[0].url, "http://api.local/api/user/login");
    assert_eq!(
        requests[0].body,
        Body::Json(json!({ "username": "alice", "password": "secret" }))
    );
    assert_eq!(requests[1].url, "http://api.local/api/user/register");
}

#[test]
fn same_origin_gateway_uses_relative_urls() {
    let config = SlideviewConfig::default();
    let api = AnalysisGateway::from_config(MockTransport::new().respond(200, "{}"), &config);

    block_on(api.all_fullnet_results()).unwrap();

    assert_eq!(api.transport().last_request().url, "/api/fullnet/results");
}
