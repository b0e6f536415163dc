#![allow(clippy::unwrap_used)]
// End-to-end flows through controllers and the router against a mock server.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use issuetrack_api::{AlertHeaders, AlertSink, ApiClient, NotificationInterceptor};
use issuetrack_core::{
    BundledTranslations, Issue, IssueDeleteController, IssueDialogController, IssueId,
    IssueResource, IssueUpdates, ModalExit, ModalState, RestIssueResource, Router, StateName,
    Transition,
};

#[derive(Default)]
struct Alerts(Mutex<Vec<String>>);

impl AlertSink for Alerts {
    fn success(&self, key: &str, _param: Option<&str>) {
        self.0.lock().unwrap().push(key.to_owned());
    }
}

async fn setup() -> (MockServer, RestIssueResource, Arc<Alerts>) {
    let server = MockServer::start().await;
    let alerts = Arc::new(Alerts::default());
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new())
        .unwrap()
        .with_interceptor(NotificationInterceptor::new(
            alerts.clone(),
            AlertHeaders::default(),
        ));
    (server, RestIssueResource::new(client), alerts)
}

fn router(resource: &RestIssueResource) -> Router<RestIssueResource> {
    Router::new(
        resource.clone(),
        Arc::new(BundledTranslations),
        vec!["ROLE_USER".into()],
        "en",
    )
}

#[tokio::test]
async fn create_posts_and_list_reloads() {
    let (server, resource, alerts) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/issues"))
        .and(body_partial_json(json!({ "id": null, "name": "Bug A" })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-issueTrackerApp-alert", "issueTrackerApp.issue.created")
                .insert_header("X-issueTrackerApp-params", "12")
                .set_body_json(json!({ "id": 12, "name": "Bug A", "created": null })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut router = router(&resource);
    let activation = router.navigate("/issue/new").await.unwrap();
    let mut dialog = IssueDialogController::new(
        resource.clone(),
        IssueUpdates::new(),
        activation.entity().unwrap().clone(),
    );
    dialog.issue_mut().name = Some("Bug A".into());

    let saved = dialog.save().await.unwrap();
    assert_eq!(saved.id, Some(IssueId::new(12)));
    assert!(matches!(dialog.modal(), ModalState::Closed(_)));
    assert_eq!(
        *alerts.0.lock().unwrap(),
        vec!["issueTrackerApp.issue.created".to_string()]
    );

    let exit = dialog.modal().exit().unwrap();
    let transition = router.exit_transition(StateName::IssueNew, exit).unwrap();
    assert_eq!(
        transition,
        Transition {
            to: StateName::Issue,
            reload: true
        }
    );
    let reloaded = router.follow(transition).await.unwrap();
    assert!(reloaded.is_entered(StateName::Issue));
}

#[tokio::test]
async fn edit_puts_to_id_path() {
    let (server, resource, _) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/issues/7"))
        .and(body_partial_json(json!({ "id": 7, "name": "Bug A (edited)" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 7, "name": "Bug A (edited)" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut dialog = IssueDialogController::new(
        resource,
        IssueUpdates::new(),
        Issue {
            id: Some(IssueId::new(7)),
            name: Some("Bug A (edited)".into()),
            ..Issue::default()
        },
    );
    dialog.save().await.unwrap();
    assert!(!dialog.is_saving());
}

#[tokio::test]
async fn failed_save_leaves_dialog_open() {
    let (server, resource, alerts) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/issues"))
        .respond_with(
            ResponseTemplate::new(400).insert_header("X-issueTrackerApp-error", "error.idexists"),
        )
        .mount(&server)
        .await;

    let mut dialog = IssueDialogController::new(resource, IssueUpdates::new(), Issue::blank());
    let err = dialog.save().await.unwrap_err();

    assert_eq!(err.error_key(), Some("error.idexists"));
    assert!(dialog.modal().is_open());
    assert!(!dialog.is_saving());
    assert!(alerts.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delete_closes_with_true() {
    let (server, resource, _) = setup().await;

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

    let mut controller = IssueDeleteController::new(
        resource,
        Issue {
            id: Some(IssueId::new(7)),
            ..Issue::default()
        },
    );
    controller.confirm_delete(IssueId::new(7)).await.unwrap();
    assert_eq!(controller.modal().result(), Some(&true));
    assert_eq!(controller.modal().exit(), Some(ModalExit::Confirm));
}

#[tokio::test]
async fn detail_route_resolves_issue_with_local_date() {
    let (server, resource, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/issues/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Bug A",
            "created": "2017-03-14"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut router = router(&resource);
    let activation = router.navigate("/issue/7").await.unwrap();

    assert_eq!(router.current(), Some(StateName::IssueDetail));
    let issue = activation.entity().unwrap();
    assert_eq!(issue.created, NaiveDate::from_ymd_opt(2017, 3, 14));
}

#[tokio::test]
async fn dates_round_trip_through_the_server() {
    let (server, resource, _) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/issues/3"))
        .and(body_partial_json(json!({ "created": "2020-02-29" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "created": "2020-02-29"
        })))
        .mount(&server)
        .await;

    let issue = Issue {
        id: Some(IssueId::new(3)),
        created: NaiveDate::from_ymd_opt(2020, 2, 29),
        ..Issue::default()
    };
    let saved = resource.update(&issue).await.unwrap();
    assert_eq!(saved.created, issue.created);
}
