//! Integration tests for persisted query negotiation over HTTP.

use std::sync::Arc;

use horizon_lattice_apq::testing::RecordingTransport;
use horizon_lattice_apq::{
    BatchRequest, HttpMethod, Middleware, NetworkError, NetworkLayer, Operation, PersistedQueries,
    Variables,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY_ID: &str = "3b569978eefa6cb3241ee5b5abd4ed861d8625030cb91cbcdb0272412aed7b47";
const QUERY_TEXT: &str = "query AppQuery {\n  getUser {\n    name\n    surname\n    id\n  }\n}\n";

fn sample_operation() -> Operation {
    Operation::query("SampleQuery").id(QUERY_ID).text(QUERY_TEXT)
}

fn success_body() -> Value {
    json!({
        "data": {
            "getUser": {"id": "VXNlcjo=", "name": "Joe", "surname": "Doe"}
        }
    })
}

fn error_body(message: &str) -> Value {
    json!({"data": null, "errors": [{"message": message}]})
}

fn network(server: &MockServer, middleware: PersistedQueries) -> NetworkLayer {
    NetworkLayer::builder(format!("{}/graphql", server.uri()))
        .middleware(middleware)
        .build()
        .expect("Failed to build network layer")
}

async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
        .collect()
}

#[tokio::test]
async fn test_returns_data_for_persisted_query_with_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let network = network(&server, PersistedQueries::builder().build().unwrap());
    let response = network
        .fetch(sample_operation(), Variables::new())
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(
        received_bodies(&server).await,
        vec![json!({
            "operationName": "SampleQuery",
            "variables": {},
            "extensions": {"persistedQuery": {"version": 1, "sha256Hash": QUERY_ID}}
        })]
    );
}

#[tokio::test]
async fn test_negotiates_new_persisted_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"query": QUERY_TEXT})))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_body("PersistedQueryNotFound")))
        .expect(1)
        .mount(&server)
        .await;

    let network = network(&server, PersistedQueries::builder().build().unwrap());
    let response = network
        .fetch(sample_operation(), Variables::new())
        .await
        .unwrap();

    assert!(response.is_success());
    let bodies = received_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(
        bodies[1],
        json!({
            "operationName": "SampleQuery",
            "query": QUERY_TEXT,
            "variables": {},
            "extensions": {"persistedQuery": {"version": 1, "sha256Hash": QUERY_ID}}
        })
    );
}

#[tokio::test]
async fn test_supports_get_with_persisted_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/graphql"))
        .and(query_param("operationName", "SampleQuery"))
        .and(query_param("variables", "{}"))
        .and(query_param(
            "extensions",
            format!(r#"{{"persistedQuery":{{"version":1,"sha256Hash":"{QUERY_ID}"}}}}"#),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let network = network(
        &server,
        PersistedQueries::builder()
            .use_get_for_hashed_queries(true)
            .build()
            .unwrap(),
    );
    let response = network
        .fetch(sample_operation(), Variables::new())
        .await
        .unwrap();

    assert!(response.is_success());
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_get_negotiation_falls_back_to_post() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_body("PersistedQueryNotFound")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"query": QUERY_TEXT})))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let network = network(
        &server,
        PersistedQueries::builder()
            .use_get_for_hashed_queries(true)
            .build()
            .unwrap(),
    );
    let response = network
        .fetch(sample_operation(), Variables::new())
        .await
        .unwrap();

    assert!(response.is_success());
}

#[tokio::test]
async fn test_query_can_be_hashed_on_demand() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .mount(&server)
        .await;

    let network = network(
        &server,
        PersistedQueries::builder()
            .hash(|query| format!("hashed:{}", query.trim().len()))
            .build()
            .unwrap(),
    );
    network
        .fetch(
            Operation::query("SampleQuery").text(QUERY_TEXT),
            Variables::new(),
        )
        .await
        .unwrap();

    let bodies = received_bodies(&server).await;
    assert_eq!(
        bodies[0]["extensions"]["persistedQuery"]["sha256Hash"],
        format!("hashed:{}", QUERY_TEXT.trim().len())
    );
}

#[tokio::test]
async fn test_hash_function_must_be_provided_if_query_has_no_id() {
    let server = MockServer::start().await;

    let network = network(&server, PersistedQueries::builder().build().unwrap());
    let err = network
        .fetch(
            Operation::query("SampleQuery").text(QUERY_TEXT),
            Variables::new(),
        )
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_returns_error_when_persisted_query_not_supported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(error_body("PersistedQueryNotSupported")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let network = network(&server, PersistedQueries::builder().build().unwrap());
    let response = network
        .fetch(sample_operation(), Variables::new())
        .await
        .unwrap();

    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.first_error().map(|error| error.message.as_str()),
        Some("PersistedQueryNotSupported")
    );
    assert!(response.data.is_none());
}

#[tokio::test]
async fn test_ordinary_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_body("Something went wrong.")))
        .expect(1)
        .mount(&server)
        .await;

    let network = network(&server, PersistedQueries::builder().build().unwrap());
    let response = network
        .fetch(sample_operation(), Variables::new())
        .await
        .unwrap();

    assert_eq!(response.error_message().as_deref(), Some("Something went wrong."));
}

#[tokio::test]
async fn test_http_status_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let network = network(&server, PersistedQueries::builder().build().unwrap());
    let err = network
        .fetch(sample_operation(), Variables::new())
        .await
        .unwrap_err();

    match err {
        NetworkError::HttpStatus { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message.as_deref(), Some("unavailable"));
        }
        other => panic!("Expected HTTP status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batched_requests_are_rejected() {
    let transport = Arc::new(RecordingTransport::new());
    let network = NetworkLayer::builder("https://api.example.com/graphql")
        .middleware(PersistedQueries::builder().build().unwrap())
        .transport(Arc::clone(&transport))
        .build()
        .unwrap();

    let request = network.request(sample_operation(), Variables::new());
    let err = network
        .execute(BatchRequest::new([request]))
        .await
        .unwrap_err();

    assert!(err.is_protocol_misuse());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_shared_middleware_serves_concurrent_requests() {
    let middleware: Arc<dyn Middleware> = Arc::new(
        PersistedQueries::builder()
            .use_get_for_hashed_queries(true)
            .build()
            .unwrap(),
    );
    let transport = Arc::new(RecordingTransport::new());
    let network = NetworkLayer::builder("https://api.example.com/graphql")
        .shared_middleware(Arc::clone(&middleware))
        .transport(Arc::clone(&transport))
        .build()
        .unwrap();
    let other = NetworkLayer::builder("https://api.example.com/graphql")
        .shared_middleware(middleware)
        .transport(Arc::clone(&transport))
        .build()
        .unwrap();

    let query = network.fetch(sample_operation(), Variables::new());
    let mutation = other.fetch(
        Operation::mutation("CreateUser").id("mutation-hash"),
        Variables::new(),
    );
    let (query, mutation) = tokio::join!(query, mutation);
    query.unwrap();
    mutation.unwrap();

    let mut methods: Vec<HttpMethod> = transport
        .calls()
        .iter()
        .map(|call| call.fetch_opts().method)
        .collect();
    methods.sort_by_key(|method| method.to_string());
    assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Post]);
}

#[tokio::test]
async fn test_commented_mutation_document_is_posted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"operationName": "CreateUser"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"createUser": {"id": "1"}}})))
        .expect(1)
        .mount(&server)
        .await;

    let network = network(
        &server,
        PersistedQueries::builder()
            .use_get_for_hashed_queries(true)
            .build()
            .unwrap(),
    );
    let operation = Operation::from_document(
        "CreateUser",
        "# Creates a user\nmutation CreateUser { createUser { id } }",
    )
    .id("mutation-hash");
    let response = network.fetch(operation, Variables::new()).await.unwrap();

    assert!(response.is_success());
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.as_str(), "POST");
    assert!(requests[0].url.query().is_none());
}
