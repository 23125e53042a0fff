use std::net::TcpListener;
use std::time::Duration;

use aim_rs::{AimError, FailureKind, ImageDescriber, ModelSettings, OllamaClient};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mockito::Matcher;
use serde_json::json;

const IMAGE: &[u8] = b"\xFF\xD8\xFF\xE0 fake jpeg";

fn client_for(host: &str) -> OllamaClient {
    OllamaClient::new(host, &ModelSettings::default(), Duration::from_secs(5)).unwrap()
}

#[test]
fn test_describe_sends_image_and_returns_text() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({
            "model": "llava",
            "stream": false,
            "images": [STANDARD.encode(IMAGE)],
            "options": { "temperature": 0.5 },
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"model":"llava","response":"  a red bicycle\n","done":true}"#)
        .expect(1)
        .create();

    let client = client_for(&server.url());
    let text = client.describe(IMAGE).unwrap();

    assert_eq!(text, "a red bicycle");
    mock.assert();
}

#[test]
fn test_http_error_is_response_error() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(404)
        .with_body(r#"{"error":"model \"llava\" not found, try pulling it first"}"#)
        .create();

    let err = client_for(&server.url()).describe(IMAGE).unwrap_err();

    match &err {
        AimError::InferenceResponse { reason, .. } => {
            assert!(reason.contains("404"), "{}", reason);
            assert!(reason.contains("try pulling it first"), "{}", reason);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.failure_kind(), Some(FailureKind::Inference));
}

#[test]
fn test_malformed_payload_is_response_error() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(r#"{"done":true}"#)
        .create();

    let err = client_for(&server.url()).describe(IMAGE).unwrap_err();
    assert!(matches!(err, AimError::InferenceResponse { .. }), "{:?}", err);
}

#[test]
fn test_empty_description_is_response_error() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(r#"{"response":"   ","done":true}"#)
        .create();

    let err = client_for(&server.url()).describe(IMAGE).unwrap_err();
    assert!(matches!(err, AimError::InferenceResponse { .. }), "{:?}", err);
}

#[test]
fn test_connection_refused_is_unavailable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = client_for(&format!("127.0.0.1:{}", port))
        .describe(IMAGE)
        .unwrap_err();
    assert!(matches!(err, AimError::InferenceUnavailable { .. }), "{:?}", err);
}
