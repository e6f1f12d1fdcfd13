//! Landing page, calculator and partner registration.

use axum::http::StatusCode;
use partner_portal_integration_tests::TestPortal;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_health_does_not_call_backend() {
    let mut portal = TestPortal::start().await;
    let response = portal.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_landing_page_calculator() {
    let mut portal = TestPortal::start().await;

    let response = portal.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("50\u{a0}000\u{a0}₽"));

    let response = portal.get("/?estimate=300000").await;
    assert!(response.body.contains("30\u{a0}000\u{a0}₽"));
}

#[tokio::test]
async fn test_registration_resets_form() {
    let mut portal = TestPortal::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_partial_json(json!({
            "name": "Мария",
            "email": "maria@example.com",
            "phone": "+7 900 000 00 00",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "partner_id": 12})),
        )
        .expect(1)
        .mount(&portal.backend)
        .await;

    let response = portal
        .post_form(
            "/register",
            &[
                ("name", "Мария"),
                ("email", "maria@example.com"),
                ("phone", "+7 900 000 00 00"),
                ("traffic_source", "Instagram"),
                ("experience", ""),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Заявка отправлена!"));
    assert!(!response.body.contains("maria@example.com"));
    assert!(!portal.has_session());
    portal.backend.verify().await;
}

#[tokio::test]
async fn test_minimal_registration_forwards_blank_optionals() {
    let mut portal = TestPortal::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({
            "name": "A",
            "email": "a@a.com",
            "phone": "1",
            "traffic_source": "",
            "experience": "",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&portal.backend)
        .await;

    let response = portal
        .post_form(
            "/register",
            &[
                ("name", "A"),
                ("email", "a@a.com"),
                ("phone", "1"),
                ("traffic_source", ""),
                ("experience", ""),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Заявка отправлена!"));
    assert!(response.body.contains("name=\"name\" type=\"text\" required value=\"\""));
    assert!(response.body.contains("name=\"email\" type=\"email\" required value=\"\""));
    assert!(response.body.contains("name=\"phone\" type=\"tel\" required value=\"\""));
    portal.backend.verify().await;
}

#[tokio::test]
async fn test_registration_failure_keeps_values() {
    let mut portal = TestPortal::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"error": "Email уже зарегистрирован"})),
        )
        .mount(&portal.backend)
        .await;

    let response = portal
        .post_form(
            "/register",
            &[
                ("name", "Мария"),
                ("email", "maria@example.com"),
                ("phone", "123"),
            ],
        )
        .await;

    assert!(response.body.contains("Email уже зарегистрирован"));
    assert!(response.body.contains("value=\"maria@example.com\""));
}

#[tokio::test]
async fn test_registration_requires_fields() {
    let mut portal = TestPortal::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&portal.backend)
        .await;

    let response = portal
        .post_form("/register", &[("name", "Мария"), ("email", ""), ("phone", "1")])
        .await;

    assert!(response.body.contains("Заполните имя, email и телефон."));
    portal.backend.verify().await;
}
