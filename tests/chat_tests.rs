use std::sync::{Arc, Mutex};

use genestream_client::GeneStream;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn stream_fragments_accumulate_into_the_bot_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(json!({ "model": "llama3.2", "prompt": "hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "{\"response\":\"Hel\"}\n{\"response\":\"lo\"}\n",
            "application/x-ndjson",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let fragments = Arc::new(Mutex::new(Vec::new()));
    let sink = fragments.clone();

    let message = client
        .chat()
        .generate("hi", move |fragment| {
            sink.lock().unwrap().push(fragment.to_string());
        })
        .await
        .unwrap();

    assert_eq!(message, "Hello");
    assert_eq!(*fragments.lock().unwrap(), vec!["Hel", "lo"]);
}

#[tokio::test]
async fn malformed_stream_lines_are_skipped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "{\"response\":\"a\"}\nnot json at all\n{\"response\":\"b\"}\n{\"done\":true}\n",
            "application/x-ndjson",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let message = client.chat().generate("hi", |_| {}).await.unwrap();
    assert_eq!(message, "ab");
}

#[tokio::test]
async fn generate_surfaces_api_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "error": "model_unavailable" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let err = client.chat().generate("hi", |_| {}).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
}
