//! End-to-end tests for the HTTP transport and client
//!
//! These tests use wiremock to stand in for the query endpoint.

use serde_json::{json, Value};
use std::io::Write;
use std::rc::Rc;
use strata_client::{
    BodyEncoding, Client, ClientConfig, ClientError, HttpTransport, RequestArgs, TermChain,
    Transport, TransportError,
};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn experiment_body() -> Value {
    json!({
        "result": {
            "results": [
                {"model": "Experiment", "join_index": -1, "tree": null, "objects": [[403, null]]},
                {"model": "Reaction", "join_index": 0, "tree": null,
                 "objects": [[23063, 403], [23064, 403], [23057, 403], [23099, null]]}
            ],
            "data": [
                {"fields": ["id", "title"], "objects": [[403, "Suzuki screen"]], "urls": ["/api/experiment/403"]},
                {"fields": ["id", "reaction_yield"],
                 "objects": [[23063, 0.41], [23064, 0.77], [23057, 0.12], [23099, null]],
                 "urls": ["/api/reaction/23063", "/api/reaction/23064", "/api/reaction/23057", null]}
            ]
        }
    })
}

async fn query_server(body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(format!("{}/api/query/", server.uri()))
}

fn experiment_chain() -> TermChain {
    let mut chain = TermChain::new();
    chain
        .join("Experiment.id=403", "experiments")
        .and_then(|c| c.outer_join("Reaction", "reactions"))
        .expect("valid chain");
    chain
}

// ============================================================================
// TEST: Transport
// ============================================================================

#[tokio::test]
async fn test_form_encoded_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("return_data=true"))
        .and(body_string_contains("follow_fks=false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new();
    let args = strata_client::layer(&RequestArgs::new(), None, "Experiment");
    let body = transport
        .post(&format!("{}/api/query/", server.uri()), &args)
        .await
        .unwrap();

    assert_eq!(body, json!({"result": {}}));
}

#[tokio::test]
async fn test_json_encoded_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query/"))
        .and(body_partial_json(json!({"q": "Experiment", "return_data": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().with_encoding(BodyEncoding::Json);
    let args = strata_client::layer(&RequestArgs::new(), None, "Experiment");
    transport
        .post(&format!("{}/api/query/", server.uri()), &args)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("query failed"))
        .mount(&server)
        .await;

    let err = HttpTransport::new()
        .post(&server.uri(), &RequestArgs::new())
        .await
        .unwrap_err();

    match err {
        TransportError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "query failed");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = HttpTransport::new()
        .post(&server.uri(), &RequestArgs::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Decode(_)));
}

// ============================================================================
// TEST: Client
// ============================================================================

#[tokio::test]
async fn test_run_chain_end_to_end() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let server = query_server(experiment_body()).await;
    let client = Client::new(config_for(&server)).unwrap();

    let output = client.run(&experiment_chain(), None, None).await.unwrap();

    let experiment = &output.objects.get("experiments").unwrap()[0];
    let reactions = output.objects.get("reactions").unwrap();
    assert_eq!(reactions.len(), 4);
    assert_eq!(experiment.borrow().url(), Some("/api/experiment/403"));
    assert_eq!(experiment.borrow().model(), Some("Experiment"));

    let linked = experiment.borrow().related("reactions").unwrap().to_vec();
    assert_eq!(linked.len(), 3);
    for (reaction, expected) in linked.iter().zip(&reactions[..3]) {
        assert!(Rc::ptr_eq(reaction, expected));
        let parents = reaction.borrow().related("experiments").unwrap().to_vec();
        assert!(Rc::ptr_eq(&parents[0], experiment));
    }

    let orphan = &reactions[3];
    assert_eq!(orphan.borrow().related("experiments").map(<[_]>::len), Some(0));
    assert_eq!(orphan.borrow().url(), None);
    output.unlink();
}

#[tokio::test]
async fn test_client_defaults_and_params_layered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("follow_fks=true"))
        .and(body_string_contains("limit=5"))
        .and(body_string_contains("return_data=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(experiment_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.defaults = RequestArgs::new().with("follow_fks", true).with("limit", 1);
    let client = Client::new(config).unwrap();
    let params = RequestArgs::new().with("limit", 5).with("return_data", false);

    client
        .run(&experiment_chain(), Some(&params), None)
        .await
        .unwrap()
        .unlink();
}

#[tokio::test]
async fn test_client_from_config_file() {
    let server = query_server(experiment_body()).await;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "endpoint = \"{}/api/query/\"\nfield_naming = \"camel_case\"",
        server.uri()
    )
    .unwrap();

    let client = Client::from_file(file.path()).unwrap();
    let output = client.run(&experiment_chain(), None, None).await.unwrap();

    let reaction = &output.objects.get("reactions").unwrap()[0];
    assert_eq!(reaction.borrow().field("reactionYield"), Some(&json!(0.41)));
    output.unlink();
}

#[tokio::test]
async fn test_server_error_rejects_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).unwrap();
    let err = client.run(&experiment_chain(), None, None).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Transport(TransportError::Status { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_response_without_data_is_empty() {
    let server = query_server(json!({"result": {"results": []}})).await;
    let client = Client::new(config_for(&server)).unwrap();

    let output = client.run(&experiment_chain(), None, None).await.unwrap();

    assert!(output.objects.is_empty());
    assert!(output.trees.is_empty());
}
