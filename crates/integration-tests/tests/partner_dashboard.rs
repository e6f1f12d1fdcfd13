//! The partner dashboard: leads, statistics and lead submission.

use axum::http::StatusCode;
use partner_portal_integration_tests::{PARTNER_EMAIL, TestPortal};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn mount_leads(portal: &TestPortal, body: Value) {
    Mock::given(method("GET"))
        .and(path("/leads"))
        .and(query_param("partner_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&portal.backend)
        .await;
}

#[tokio::test]
async fn test_dashboard_lists_leads() {
    let mut portal = TestPortal::start().await;
    portal.login_partner().await;
    mount_leads(
        &portal,
        json!({
            "success": true,
            "leads": [
                {"id": 1, "client_name": "Анна", "client_phone": "+7 900", "status": "approved",
                 "estimate_amount": 650000, "commission_amount": 65000},
                {"id": 2, "name": "Борис", "phone": "+7 901", "status": "new"},
            ],
            "statistics": {"total_leads": 2, "approved_leads": 1, "total_commission": 65000},
        }),
    )
    .await;

    let response = portal.get("/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Анна"));
    assert!(response.body.contains("Борис"));
    assert!(response.body.contains("65\u{a0}000\u{a0}₽"));
    assert!(!response.body.contains("Итоги расходятся"));
}

#[tokio::test]
async fn test_unknown_status_is_shown_raw() {
    let mut portal = TestPortal::start().await;
    portal.login_partner().await;
    mount_leads(
        &portal,
        json!({
            "leads": [{"id": 1, "client_name": "Анна", "client_phone": "1", "status": "on_hold"}],
            "statistics": {"total_leads": 1, "approved_leads": 0, "total_commission": 0},
        }),
    )
    .await;

    let response = portal.get("/dashboard").await;
    assert!(response.body.contains("badge badge-neutral\">on_hold<"));
}

#[tokio::test]
async fn test_statistics_discrepancy_is_flagged() {
    let mut portal = TestPortal::start().await;
    portal.login_partner().await;
    mount_leads(
        &portal,
        json!({
            "leads": [{"id": 1, "client_name": "Анна", "client_phone": "1", "status": "approved",
                       "commission_amount": 1000}],
            "statistics": {"total_leads": 5, "approved_leads": 1, "total_commission": 1000},
        }),
    )
    .await;

    let response = portal.get("/dashboard").await;
    assert!(response.body.contains("Итоги расходятся"));
}

#[tokio::test]
async fn test_create_lead_identifies_partner() {
    let mut portal = TestPortal::start().await;
    portal.login_partner().await;
    Mock::given(method("POST"))
        .and(path("/create-lead"))
        .and(header("X-User-Id", PARTNER_EMAIL))
        .and(body_partial_json(json!({"name": "Олег", "phone": "+7 902"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&portal.backend)
        .await;

    let response = portal
        .post_form(
            "/dashboard/leads",
            &[("name", " Олег "), ("phone", "+7 902"), ("notes", "кухня")],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/dashboard?created=1"));
    portal.backend.verify().await;
}

#[tokio::test]
async fn test_create_lead_failure_keeps_values() {
    let mut portal = TestPortal::start().await;
    portal.login_partner().await;
    mount_leads(&portal, json!({"leads": []})).await;
    Mock::given(method("POST"))
        .and(path("/create-lead"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Телефон занят"})))
        .mount(&portal.backend)
        .await;

    let response = portal
        .post_form("/dashboard/leads", &[("name", "Олег"), ("phone", "+7 902")])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Телефон занят"));
    assert!(response.body.contains("value=\"Олег\""));
}

#[tokio::test]
async fn test_unreachable_backend_shows_connection_error() {
    let mut portal = TestPortal::start_with(&[("PORTAL_LEADS_URL", "http://127.0.0.1:1/leads")]).await;
    portal.login_partner().await;

    let response = portal.get("/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Ошибка соединения. Попробуйте позже."));
}
