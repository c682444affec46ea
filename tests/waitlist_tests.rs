use genestream_client::error::Error;
use genestream_client::GeneStream;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn joining_sends_the_email_unauthenticated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/waitlist"))
        .and(body_json(json!({ "email": "ada@example.com" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    client.waitlist().join("ada@example.com").await.unwrap();
}

#[tokio::test]
async fn validation_failures_surface_the_server_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/waitlist"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_email",
            "message": "That does not look like an email address"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let err = client.waitlist().join("nope").await.unwrap_err();
    match err {
        Error::Api { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(body.error, "invalid_email");
            assert_eq!(
                body.message.as_deref(),
                Some("That does not look like an email address")
            );
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}
