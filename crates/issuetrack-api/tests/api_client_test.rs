#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use issuetrack_api::{
    AlertHeaders, AlertSink, ApiClient, Error, IssueRecord, NotificationInterceptor, PageRequest,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSink {
    alerts: Mutex<Vec<(String, Option<String>)>>,
}

impl AlertSink for RecordingSink {
    fn success(&self, key: &str, param: Option<&str>) {
        self.alerts
            .lock()
            .unwrap()
            .push((key.to_owned(), param.map(str::to_owned)));
    }
}

async fn setup() -> (MockServer, ApiClient, Arc<RecordingSink>) {
    let server = MockServer::start().await;
    let sink = Arc::new(RecordingSink::default());
    let interceptor = NotificationInterceptor::new(sink.clone(), AlertHeaders::default());
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new())
        .unwrap()
        .with_interceptor(interceptor);
    (server, client, sink)
}

fn issue_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "Steps to reproduce",
        "created": "2017-03-14",
        "state": "OPEN",
        "priority": "HIGH",
        "attachment": null,
        "attachmentContentType": null,
        "comment": null
    })
}

// ── Issues ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_issue() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/issues/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(7, "Bug A")))
        .mount(&server)
        .await;

    let issue = client.get_issue(7).await.unwrap();

    assert_eq!(issue.id, Some(7));
    assert_eq!(issue.name.as_deref(), Some("Bug A"));
    assert_eq!(issue.created.as_deref(), Some("2017-03-14"));
    assert_eq!(issue.priority.as_deref(), Some("HIGH"));
}

#[tokio::test]
async fn test_list_issues_reads_total_count() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/issues"))
        .and(query_param("page", "1"))
        .and(query_param("size", "20"))
        .and(query_param("sort", "name,desc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Total-Count", "42")
                .set_body_json(json!([issue_json(1, "One"), issue_json(2, "Two")])),
        )
        .mount(&server)
        .await;

    let page = client
        .list_issues(&PageRequest {
            page: 1,
            size: 20,
            sort: vec!["name,desc".into()],
        })
        .await
        .unwrap();

    assert_eq!(page.total_count, 42);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[1].name.as_deref(), Some("Two"));
}

#[tokio::test]
async fn test_list_issues_without_total_header_counts_items() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(1, "One")])))
        .mount(&server)
        .await;

    let page = client.list_issues(&PageRequest::default()).await.unwrap();
    assert_eq!(page.total_count, 1);
}

#[tokio::test]
async fn test_create_issue_posts_without_id() {
    let (server, client, sink) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/issues"))
        .and(body_partial_json(json!({ "id": null, "name": "Bug A" })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-issueTrackerApp-alert", "issueTrackerApp.issue.created")
                .insert_header("X-issueTrackerApp-params", "11")
                .set_body_json(issue_json(11, "Bug A")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_issue(&IssueRecord {
            name: Some("Bug A".into()),
            ..IssueRecord::default()
        })
        .await
        .unwrap();

    assert_eq!(created.id, Some(11));
    assert_eq!(
        *sink.alerts.lock().unwrap(),
        vec![("issueTrackerApp.issue.created".to_owned(), Some("11".to_owned()))]
    );
}

#[tokio::test]
async fn test_update_issue_puts_to_id_path() {
    let (server, client, _) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/issues/7"))
        .and(body_partial_json(json!({ "id": 7, "name": "Bug A (edited)" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(7, "Bug A (edited)")))
        .expect(1)
        .mount(&server)
        .await;

    let record = IssueRecord {
        id: Some(7),
        name: Some("Bug A (edited)".into()),
        ..IssueRecord::default()
    };
    let updated = client.update_issue(7, &record).await.unwrap();
    assert_eq!(updated.name.as_deref(), Some("Bug A (edited)"));
}

#[tokio::test]
async fn test_delete_issue() {
    let (server, client, sink) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/issues/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-issueTrackerApp-alert", "issueTrackerApp.issue.deleted")
                .insert_header("X-issueTrackerApp-params", "7"),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.delete_issue(7).await.unwrap();
    assert_eq!(sink.alerts.lock().unwrap().len(), 1);
}

// ── Search ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_issues_passes_query() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/_search/issues"))
        .and(query_param("query", "crash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(3, "Crash")])))
        .mount(&server)
        .await;

    let page = client
        .search_issues("crash", &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.data.len(), 1);
    // Search results keep the raw wire date.
    assert_eq!(page.data[0].created.as_deref(), Some("2017-03-14"));
}

// ── Alert bridge ────────────────────────────────────────────────────

#[tokio::test]
async fn test_response_without_alert_is_untouched() {
    let (server, client, sink) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/issues/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(1, "Plain")))
        .mount(&server)
        .await;

    let issue = client.get_issue(1).await.unwrap();
    assert_eq!(issue.name.as_deref(), Some("Plain"));
    assert!(sink.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_custom_app_prefix() {
    let server = MockServer::start().await;
    let sink = Arc::new(RecordingSink::default());
    let interceptor = NotificationInterceptor::new(sink.clone(), AlertHeaders::for_app("otherApp"));
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new())
        .unwrap()
        .with_interceptor(interceptor);

    Mock::given(method("DELETE"))
        .and(path("/api/issues/2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-otherApp-alert", "otherApp.issue.deleted")
                .insert_header("X-issueTrackerApp-alert", "ignored"),
        )
        .mount(&server)
        .await;

    client.delete_issue(2).await.unwrap();
    assert_eq!(
        *sink.alerts.lock().unwrap(),
        vec![("otherApp.issue.deleted".to_owned(), None)]
    );
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failure_headers_are_captured() {
    let (server, client, sink) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/issues"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("X-issueTrackerApp-error", "error.idexists")
                .insert_header("X-issueTrackerApp-params", "issue"),
        )
        .mount(&server)
        .await;

    let result = client
        .create_issue(&IssueRecord {
            id: Some(5),
            ..IssueRecord::default()
        })
        .await;

    match result {
        Err(Error::Api {
            status,
            ref error_key,
            ref params,
            ..
        }) => {
            assert_eq!(status, 400);
            assert_eq!(error_key.as_deref(), Some("error.idexists"));
            assert_eq!(params.as_deref(), Some("issue"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
    assert!(sink.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_not_found() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/issues/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.get_issue(99).await.unwrap_err();
    assert!(err.is_not_found(), "expected not found, got: {err:?}");
}

#[tokio::test]
async fn test_unauthorized() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_issues(&PageRequest::default()).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/issues/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    match client.get_issue(1).await {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("oops")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    let transport = issuetrack_api::TransportConfig::default()
        .with_bearer_token(secrecy::SecretString::from("t0ken".to_string()));
    let client = ApiClient::new(&server.uri(), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/issues/1"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(1, "Auth")))
        .expect(1)
        .mount(&server)
        .await;

    client.get_issue(1).await.unwrap();
}
