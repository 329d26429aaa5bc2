//! HTTP surface for ad-hoc checks and lead intake, exercised through the public router.

mod common;

use std::sync::Arc;
use std::time::Duration;

use audience_gate::screening::{
    screening_router, CheckRequest, LeadSubmission, ScreeningService, ScreeningStatus,
};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::*;
use serde_json::{json, Value};
use tower::ServiceExt;

fn fetcher() -> ScriptedFetcher {
    ScriptedFetcher::new()
        .with_page("https://www.instagram.com/johndoe/", INSTAGRAM_24K)
        .with_page("https://www.instagram.com/smallish/", INSTAGRAM_812)
        .with_page("https://www.threads.net/@johndoe", THREADS_12345)
        .with_page("https://blog.naver.com/johnblog", BLOG_120)
}

fn service_with(
    fetcher: ScriptedFetcher,
) -> (Arc<ScreeningService<ScriptedFetcher, MemoryStore>>, Arc<ScriptedFetcher>, MemoryStore) {
    let fetcher = Arc::new(fetcher);
    let store = MemoryStore::default();
    let service = Arc::new(ScreeningService::new(
        fetcher.clone(),
        Arc::new(store.clone()),
        unpaced(),
    ));
    (service, fetcher, store)
}

fn json_request(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).expect("payload encodes")))
        .expect("request builds")
}

fn lead(name: &str) -> LeadSubmission {
    LeadSubmission {
        name: name.to_string(),
        contact: Some("john@example.com".to_string()),
        threads_url: Some("https://www.threads.net/@johndoe".to_string()),
        instagram_url: Some("https://www.instagram.com/johndoe/".to_string()),
        blog_url: None,
    }
}

#[tokio::test]
async fn check_route_reports_every_target() {
    let (service, _, _) = service_with(fetcher());
    let router = screening_router(service);

    let response = router
        .oneshot(json_request(
            "/api/v1/checks",
            &json!({ "targets": ["johndoe", "smallish", "john@doe"] }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["passed"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["errored"], 1);
    assert_eq!(body["rows"][0]["metric"], 24_000);
    assert_eq!(body["rows"][0]["strategy"], "description_meta");
    assert_eq!(body["rows"][1]["status"], "failed");
    assert_eq!(body["rows"][2]["platform"], Value::Null);
    assert_eq!(body["rows"][2]["error"], "unsupported platform");
}

#[tokio::test]
async fn threshold_overrides_apply_to_one_request_only() {
    let (service, _, _) = service_with(fetcher());

    let request: CheckRequest = serde_json::from_value(json!({
        "targets": ["smallish"],
        "thresholds": { "instagram": 500 }
    }))
    .expect("request decodes");
    let (rows, thresholds) = service.check_targets(request).await.expect("check runs");
    assert_eq!(thresholds.instagram, 500);
    assert_eq!(thresholds.threads, 500);
    assert!(rows[0].outcome.verdict().expect("checked").passed);

    assert_eq!(service.settings().thresholds.instagram, 1_000);
}

#[tokio::test]
async fn empty_check_is_unprocessable() {
    let (service, _, _) = service_with(fetcher());
    let router = screening_router(service);

    let response = router
        .oneshot(json_request("/api/v1/checks", &json!({ "targets": ["  "] })))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn export_route_returns_csv_with_bom() {
    let (service, _, _) = service_with(fetcher());
    let router = screening_router(service);

    let response = router
        .oneshot(json_request(
            "/api/v1/checks/export",
            &json!({ "targets": ["@johndoe", "https://blog.naver.com/johnblog"] }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let bytes = read_body(response).await;
    assert!(bytes.starts_with("\u{feff}".as_bytes()));
    let text = String::from_utf8(bytes).expect("utf8");
    assert!(text.contains("https://www.threads.net/@johndoe,Threads,12345,500,passed"));
    assert!(text.contains("https://blog.naver.com/johnblog,Naver Blog,120,300,failed"));
}

#[tokio::test]
async fn concurrent_checks_share_one_browser_session() {
    let (service, fetcher, _) = service_with(fetcher().with_delay(Duration::from_millis(20)));

    let first = CheckRequest {
        targets: vec!["johndoe".to_string(), "@johndoe".to_string()],
        thresholds: Default::default(),
    };
    let second = CheckRequest {
        targets: vec!["smallish".to_string(), "https://blog.naver.com/johnblog".to_string()],
        thresholds: Default::default(),
    };

    let (left, right) = tokio::join!(service.check_targets(first), service.check_targets(second));
    assert!(left.is_ok() && right.is_ok());
    assert_eq!(fetcher.calls().len(), 4);
    assert_eq!(fetcher.peak_sessions(), 1);
}

#[tokio::test]
async fn screened_lead_is_selected_when_all_links_pass() {
    let (service, fetcher, store) = service_with(fetcher());

    let record = service.submit(lead("John Doe")).expect("lead stored");
    assert_eq!(record.status, ScreeningStatus::Pending);

    let screened = service
        .screen(&record.submission_id)
        .await
        .expect("lead screened");
    assert_eq!(screened.status, ScreeningStatus::Completed);
    let report = screened.report.expect("report present");
    assert!(report.is_selected());
    assert_eq!(fetcher.calls().len(), 2);

    let stored = store
        .records
        .lock()
        .expect("store mutex poisoned")
        .get(&record.submission_id)
        .cloned()
        .expect("record persisted");
    assert_eq!(stored.status, ScreeningStatus::Completed);
}

#[tokio::test]
async fn lead_without_links_is_excluded_without_rendering() {
    let (service, fetcher, _) = service_with(fetcher());
    let router = screening_router(service);

    let response = router
        .oneshot(json_request(
            "/api/v1/leads",
            &json!({ "name": "No Links", "threads_url": "", "blog_url": "  " }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "excluded");
    assert!(body.get("final_status").is_none());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn submitted_lead_is_screened_in_the_background() {
    let (service, _, _) = service_with(fetcher());
    let router = screening_router(service);

    let submit = router
        .clone()
        .oneshot(json_request(
            "/api/v1/leads",
            &serde_json::to_value(lead("Background Doe")).expect("lead encodes"),
        ))
        .await
        .expect("route responds");
    assert_eq!(submit.status(), StatusCode::ACCEPTED);
    let accepted = read_json_body(submit).await;
    assert_eq!(accepted["status"], "pending");
    let id = accepted["submission_id"]
        .as_str()
        .expect("submission id")
        .to_string();

    let mut latest = Value::Null;
    for _ in 0..50 {
        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/leads/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::OK);
        latest = read_json_body(response).await;
        if latest["status"] == "completed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(latest["status"], "completed");
    assert_eq!(latest["final_status"], "selected");
    assert_eq!(latest["platforms"]["instagram"]["metric"], 24_000);
    assert_eq!(latest["platforms"]["threads"]["status"], "passed");
}

#[tokio::test]
async fn unknown_submission_is_not_found() {
    let (service, _, _) = service_with(fetcher());
    let router = screening_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/leads/lead-999999")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_outage_surfaces_as_internal_error() {
    let service = Arc::new(ScreeningService::new(
        Arc::new(fetcher()),
        Arc::new(UnavailableStore),
        unpaced(),
    ));
    let router = screening_router(service);

    let response = router
        .oneshot(json_request(
            "/api/v1/leads",
            &serde_json::to_value(lead("Outage")).expect("lead encodes"),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("database offline"));
}

#[tokio::test]
async fn transient_write_failure_does_not_strand_a_screened_lead() {
    let store = FlakyStore::failing_updates(1);
    let service = ScreeningService::new(Arc::new(fetcher()), Arc::new(store.clone()), unpaced());
    let record = service.submit(lead("Retry")).expect("lead stored");

    let screened = service
        .screen(&record.submission_id)
        .await
        .expect("second write succeeds");

    assert_eq!(screened.status, ScreeningStatus::Completed);
    assert_eq!(store.update_attempts(), 2);
    let stored = service.get(&record.submission_id).expect("record present");
    assert_eq!(stored.status, ScreeningStatus::Completed);
    assert!(stored.report.is_some());
}

#[tokio::test]
async fn persistent_write_failure_is_reported_after_bounded_attempts() {
    let store = FlakyStore::failing_updates(usize::MAX);
    let service = ScreeningService::new(Arc::new(fetcher()), Arc::new(store.clone()), unpaced());
    let record = service.submit(lead("Offline")).expect("lead stored");

    let result = service.screen(&record.submission_id).await;

    assert!(result.is_err());
    assert_eq!(store.update_attempts(), 3);
}
