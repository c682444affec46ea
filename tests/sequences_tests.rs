use genestream_client::sequences::{SearchOptions, SortField, SortOrder};
use genestream_client::GeneStream;
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn empty_search_response() -> serde_json::Value {
    json!({ "results": [], "total": 0 })
}

#[tokio::test]
async fn anonymous_search_is_public_only_and_carries_no_auth_header() {
    let mock_server = MockServer::start().await;

    // Any search carrying an Authorization header would match this mock
    // first and fail the run.
    Mock::given(method("GET"))
        .and(path("/sequences/search"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sequences/search"))
        .and(query_param("query", "insulin"))
        .and(query_param("publicOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_search_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let response = client
        .sequences()
        .search(&SearchOptions::new("insulin"))
        .await
        .unwrap();
    assert_eq!(response.total, 0);
}

#[tokio::test]
async fn authenticated_search_carries_the_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sequences/search"))
        .and(header("Authorization", "Bearer tok-1"))
        .and(query_param("query", "insulin"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .and(query_param("publicOnly", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "gs_id": "GS1",
                    "score": 12.5,
                    "sequence_length": 110,
                    "char_set": "PROTEIN",
                    "metadata": {
                        "organism": "Homo sapiens",
                        "display_name": "Insulin",
                        "access_level": "private"
                    }
                }
            ],
            "total": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    client.set_access_token(Some("tok-1"));

    let response = client
        .sequences()
        .search(&SearchOptions::new("insulin"))
        .await
        .unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.results[0].gs_id, "GS1");
    assert_eq!(
        response.results[0].metadata.display_name.as_deref(),
        Some("Insulin")
    );
}

#[tokio::test]
async fn search_forwards_sort_and_project_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sequences/search"))
        .and(query_param("sortBy", "date"))
        .and(query_param("sortOrder", "desc"))
        .and(query_param("projectId", "p1"))
        .and(query_param("publicOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_search_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    client.set_access_token(Some("tok-1"));

    let mut options = SearchOptions::new("crispr");
    options.sort = Some((SortField::Date, SortOrder::Desc));
    options.project_id = Some("p1".to_string());
    options.public_only = true;

    client.sequences().search(&options).await.unwrap();
}

#[tokio::test]
async fn suggestions_forward_the_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sequences/suggest"))
        .and(query_param("query", "ins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "s1", "text": "insulin", "description": "Human insulin precursor" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let suggestions = client.sequences().suggest("ins").await.unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].text, "insulin");
}

#[tokio::test]
async fn sequence_detail_is_cached_separately_per_auth_state() {
    let mock_server = MockServer::start().await;

    // Authenticated reads see the raw sequence; anonymous ones do not.
    Mock::given(method("GET"))
        .and(path("/sequences/GS1"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gs_id": "GS1",
            "sequence": "MALWMRLLPLL"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sequences/GS1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "gs_id": "GS1" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let sequences = client.sequences();

    let anonymous = sequences.get("GS1", false).await.unwrap();
    assert!(anonymous.sequence.is_none());

    client.set_access_token(Some("tok-1"));
    // A different cache key: this read goes back to the network.
    let authenticated = sequences.get("GS1", false).await.unwrap();
    assert_eq!(authenticated.sequence.as_deref(), Some("MALWMRLLPLL"));

    // Both variants are now cached.
    sequences.get("GS1", false).await.unwrap();
    client.set_access_token(None);
    sequences.get("GS1", false).await.unwrap();
}

#[tokio::test]
async fn detail_fetch_can_include_annotations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sequences/GS2"))
        .and(query_param("include", "annotations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gs_id": "GS2",
            "annotations": {
                "name": [
                    {
                        "_id": "a1",
                        "gs_id": "GS2",
                        "type": "name",
                        "content": "Insulin",
                        "created_by": "u1",
                        "project_id": "p1",
                        "access_level": "private",
                        "published": false
                    }
                ],
                "description": []
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let detail = client.sequences().get("GS2", true).await.unwrap();
    let annotations = detail.annotations.unwrap();
    assert_eq!(annotations.name.len(), 1);
    assert_eq!(annotations.name[0].content, "Insulin");
    assert!(!annotations.name[0].published);
}

#[tokio::test]
async fn annotated_fetch_is_not_masked_by_a_cached_bare_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sequences/GS3"))
        .and(query_param("include", "annotations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gs_id": "GS3",
            "annotations": { "name": [], "description": [] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sequences/GS3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "gs_id": "GS3" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let sequences = client.sequences();

    let bare = sequences.get("GS3", false).await.unwrap();
    assert!(bare.annotations.is_none());

    // A different cache key: the annotated read goes to the network.
    let annotated = sequences.get("GS3", true).await.unwrap();
    assert!(annotated.annotations.is_some());

    // Both variants are now served from the cache.
    sequences.get("GS3", false).await.unwrap();
    sequences.get("GS3", true).await.unwrap();
}

#[tokio::test]
async fn access_mutations_invalidate_the_cached_sequence() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sequences/GS1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "gs_id": "GS1" })))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sequences/GS1/project-access"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeneStream::new(&mock_server.uri());
    let sequences = client.sequences();

    sequences.get("GS1", false).await.unwrap();
    sequences.grant_project_access("GS1", "p1").await.unwrap();
    // Invalidation forces the next read onto the network.
    sequences.get("GS1", false).await.unwrap();
}
