mod common;

use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;

use phantom_trax::{
    remix_input, resolve_model, JobStatus, ModelKind, RemixError, RemixJobClient, RemixRequest,
    ReplicateClient,
};

const VERSION: &str = "671ac645ce5e552cc63a54a2bbff63fcf798043055d2dac5fc9e36a837eedcfb";

fn request(source: std::path::PathBuf, seed: Option<i64>) -> RemixRequest {
    RemixRequest {
        source_audio: source,
        prompt: "lofi hip hop with vinyl crackle".into(),
        duration_secs: 30,
        temperature: 1.0,
        seed,
    }
}

#[test]
fn input_without_seed_has_no_seed_field() {
    let input = remix_input(&request("a.wav".into(), None), "https://files/a", "stereo-melody-large");
    assert_eq!(
        input,
        json!({
            "input_audio": "https://files/a",
            "prompt": "lofi hip hop with vinyl crackle",
            "duration": 30,
            "model_version": "stereo-melody-large",
            "normalization_strategy": "loudness",
            "temperature": 1.0,
        })
    );
}

#[test]
fn input_with_seed_is_an_integer() {
    let input = remix_input(&request("a.wav".into(), Some(42)), "https://files/a", "stereo-melody-large");
    assert_eq!(input["seed"], json!(42));
    assert!(input["seed"].is_i64());
}

#[test]
fn submit_uploads_then_creates_versioned_prediction() {
    let dir = tempdir().unwrap();
    let clip = dir.path().join("temp_input.wav");
    std::fs::write(&clip, b"RIFF....WAVE").unwrap();

    let server = MockServer::start();

    let upload = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/files")
            .header("authorization", "Bearer r8_test_token")
            .body_contains("name=\"content\"");
        then.status(201).json_body(json!({
            "id": "file-1",
            "urls": { "get": "https://files.example/file-1" }
        }));
    });

    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/predictions")
            .header("authorization", "Bearer r8_test_token")
            .json_body_partial(format!(
                r#"{{
                    "version": "{VERSION}",
                    "input": {{
                        "input_audio": "https://files.example/file-1",
                        "duration": 30,
                        "model_version": "stereo-melody-large",
                        "normalization_strategy": "loudness",
                        "seed": 7
                    }}
                }}"#
            ));
        then.status(201)
            .json_body(json!({ "id": "pred-1", "status": "starting" }));
    });

    let client = ReplicateClient::new(&common::mock_config(&server.base_url())).unwrap();
    let model = resolve_model("", ModelKind::Music).unwrap();
    let handle = RemixJobClient::new(&client, &model)
        .submit(&request(clip, Some(7)))
        .unwrap();

    upload.assert();
    create.assert();
    assert_eq!(handle.id, "pred-1");
    assert_eq!(handle.duration_secs, 30);
    assert_eq!(handle.initial.status, JobStatus::Queued);
}

#[test]
fn rejected_submission_surfaces_status_and_body() {
    let dir = tempdir().unwrap();
    let clip = dir.path().join("temp_input.wav");
    std::fs::write(&clip, b"RIFF....WAVE").unwrap();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/files");
        then.status(201)
            .json_body(json!({ "id": "f", "urls": { "get": "https://files.example/f" } }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1/predictions");
        then.status(422).body("invalid duration");
    });

    let client = ReplicateClient::new(&common::mock_config(&server.base_url())).unwrap();
    let model = resolve_model("", ModelKind::Music).unwrap();
    let err = RemixJobClient::new(&client, &model)
        .submit(&request(clip, None))
        .unwrap_err();

    match err {
        RemixError::Api { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, "invalid duration");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_prompt_is_rejected_before_any_request() {
    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method(POST).path("/v1/files");
        then.status(201);
    });

    let client = ReplicateClient::new(&common::mock_config(&server.base_url())).unwrap();
    let model = resolve_model("", ModelKind::Music).unwrap();
    let mut req = request("missing.wav".into(), None);
    req.prompt = "  ".into();

    let err = RemixJobClient::new(&client, &model).submit(&req).unwrap_err();
    assert!(matches!(err, RemixError::InvalidRequest(_)));
    upload.assert_hits(0);
}

#[test]
fn client_requires_a_token() {
    let config = phantom_trax::Config::from_lookup(|_| None);
    assert!(matches!(
        ReplicateClient::new(&config),
        Err(RemixError::MissingCredential)
    ));
}
