use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use phantom_trax::{resolve_model, ModelKind, PromptOptimizer, RemixError, ReplicateClient};

const TEXT_PATH: &str = "/v1/models/meta/meta-llama-3-8b-instruct/predictions";

fn client_for(server: &MockServer) -> ReplicateClient {
    ReplicateClient::with_http(
        reqwest::blocking::Client::new(),
        format!("{}/", server.base_url()),
        "r8_text_token",
    )
}

#[test]
fn fragments_are_joined_and_trimmed() {
    let server = MockServer::start();

    let create = server.mock(|when, then| {
        when.method(POST)
            .path(TEXT_PATH)
            .header("authorization", "Bearer r8_text_token")
            .body_contains("User Input: sad piano")
            .json_body_partial(r#"{"input": {"max_tokens": 100, "temperature": 0.7}}"#);
        then.status(201)
            .json_body(json!({ "id": "txt-1", "status": "processing" }));
    });
    let fetch = server.mock(|when, then| {
        when.method(GET).path("/v1/predictions/txt-1");
        then.status(200).json_body(json!({
            "id": "txt-1",
            "status": "succeeded",
            "output": ["  Melancholic ", "solo piano, ", "70 BPM", "\n"]
        }));
    });

    let client = client_for(&server);
    let model = resolve_model("", ModelKind::Text).unwrap();
    let out = PromptOptimizer::new(&client, &model, Duration::from_millis(1))
        .optimize("sad piano")
        .unwrap();

    create.assert();
    fetch.assert();
    assert_eq!(out, "Melancholic solo piano, 70 BPM");
}

#[test]
fn blank_output_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(TEXT_PATH);
        then.status(201).json_body(json!({
            "id": "txt-2",
            "status": "succeeded",
            "output": ["  ", "\n"]
        }));
    });

    let client = client_for(&server);
    let model = resolve_model("", ModelKind::Text).unwrap();
    let res = PromptOptimizer::new(&client, &model, Duration::from_millis(1)).optimize("x");
    assert!(res.is_err());
}

#[test]
fn failed_text_job_propagates() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(TEXT_PATH);
        then.status(201).json_body(json!({
            "id": "txt-3",
            "status": "failed",
            "error": "model is warming up"
        }));
    });

    let client = client_for(&server);
    let model = resolve_model("", ModelKind::Text).unwrap();
    let err = PromptOptimizer::new(&client, &model, Duration::from_millis(1))
        .optimize("x")
        .unwrap_err();
    match err {
        RemixError::JobFailed { id, message, .. } => {
            assert_eq!(id, "txt-3");
            assert_eq!(message, "model is warming up");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn canceled_text_job_keeps_the_reason() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(TEXT_PATH);
        then.status(201).json_body(json!({
            "id": "txt-4",
            "status": "canceled",
            "error": "canceled by admin: quota"
        }));
    });

    let client = client_for(&server);
    let model = resolve_model("", ModelKind::Text).unwrap();
    let err = PromptOptimizer::new(&client, &model, Duration::from_millis(1))
        .optimize("x")
        .unwrap_err();
    assert!(matches!(
        err,
        RemixError::JobFailed { ref message, .. } if message == "canceled by admin: quota"
    ));
}
