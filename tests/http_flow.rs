//! End-to-end tests driving the axum router in memory.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http_body_util::BodyExt;
use rentdesk::{
    api::{self, AppState},
    config::{database, settings::Settings},
    errors::Result,
    notify::{Email, Mailer},
    receipt::PdfReceiptRenderer,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const PASSWORD: &str = "Correct-Horse-42";

#[derive(Default)]
struct Outbox(Mutex<Vec<Email>>);

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, email: &Email) -> Result<()> {
        self.0.lock().unwrap().push(email.clone());
        Ok(())
    }
}

struct TestApp {
    router: Router,
    outbox: Arc<Outbox>,
    _media: tempfile::TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let db = database::create_connection("sqlite::memory:").await.unwrap();
        database::create_tables(&db).await.unwrap();

        let mut settings = Settings::default();
        settings.auth.jwt_secret = "integration-secret-0123456789".to_string();
        settings.media.root = media.path().to_path_buf();

        let outbox = Arc::new(Outbox::default());
        let state = AppState::new(db, settings, outbox.clone(), Arc::new(PdfReceiptRenderer));
        Self {
            router: api::router(state),
            outbox,
            _media: media,
        }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["access"].as_str().unwrap().to_string()
    }

    /// Registers an admin and one of their tenants; returns (admin token, tenant token, tenant id).
    async fn landlord_and_tenant(&self) -> (String, String, i64) {
        let (status, _) = self
            .call(Method::POST, "/api/register-admin", None, Some(account("landlord")))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let admin = self.login("landlord").await;

        let (status, tenant) = self
            .call(Method::POST, "/api/tenants", Some(&admin), Some(account("renter")))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{tenant}");
        assert_eq!(tenant["role"], "tenant");
        let tenant_token = self.login("renter").await;
        (admin, tenant_token, tenant["id"].as_i64().unwrap())
    }
}

fn account(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": PASSWORD,
        "password2": PASSWORD,
        "first_name": "Awa",
    })
}

fn upload(name: &str) -> Value {
    json!({ "filename": name, "content_base64": STANDARD.encode(b"file body") })
}

#[tokio::test]
async fn test_rental_lifecycle() {
    let app = TestApp::new().await;
    let (admin, tenant, tenant_id) = app.landlord_and_tenant().await;

    let (status, property) = app
        .call(
            Method::POST,
            "/api/properties",
            Some(&admin),
            Some(json!({
                "name": "Studio Plateau",
                "kind": "studio",
                "address": "4 Avenue Principale",
                "monthly_rent": 50000.0,
                "deposit": 100000.0,
                "minimum_months": 3,
                "images": [upload("front.jpg")],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{property}");
    let property_id = property["id"].as_i64().unwrap();
    assert_eq!(property["images"].as_array().unwrap().len(), 1);

    // Tenant cannot see the property before holding a contract
    let (_, listed) = app.call(Method::GET, "/api/properties", Some(&tenant), None).await;
    assert_eq!(listed, json!([]));

    let (status, body) = app
        .call(
            Method::POST,
            "/api/contracts",
            Some(&admin),
            Some(json!({
                "tenant_id": tenant_id,
                "property_id": property_id,
                "start_date": "2025-12-31",
                "end_date": "2025-01-01",
                "document": upload("lease.pdf"),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["end_date"].is_array());

    let (status, contract) = app
        .call(
            Method::POST,
            "/api/contracts",
            Some(&admin),
            Some(json!({
                "tenant_id": tenant_id,
                "property_id": property_id,
                "start_date": "2025-01-01",
                "end_date": "2025-12-31",
                "document": upload("lease.pdf"),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{contract}");

    let (_, listed) = app.call(Method::GET, "/api/properties", Some(&tenant), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], property_id);

    let (status, payment) = app
        .call(
            Method::POST,
            "/api/payments",
            Some(&tenant),
            Some(json!({
                "property_id": property_id,
                "amount": 50000.0,
                "kind": "loyer",
                "period": "Juin 2025",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{payment}");
    assert_eq!(payment["validated"], false);
    assert_eq!(payment["tenant_id"], tenant_id);
    let payment_id = payment["id"].as_i64().unwrap();
    let validate_uri = format!("/api/payments/{payment_id}/validate");

    let (status, _) = app.call(Method::POST, &validate_uri, Some(&tenant), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, validated) = app.call(Method::POST, &validate_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK, "{validated}");
    assert_eq!(validated["payment"]["validated"], true);
    let receipt_url = validated["receipt_url"].as_str().unwrap().to_string();
    assert!(receipt_url.ends_with(&format!("/media/receipts/receipt_payment_{payment_id}.pdf")));

    let (status, again) = app.call(Method::POST, &validate_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(again["message"], "Payment already validated");

    let sent = app.outbox.0.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "renter@example.com");
    assert!(sent[0].body.starts_with("Hello Awa,"));

    let receipt = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/media/receipts/receipt_payment_{payment_id}.pdf"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(receipt.status(), StatusCode::OK);
    let bytes = receipt.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF-1.4"));
}

#[tokio::test]
async fn test_messaging_sender_only_mutation() {
    let app = TestApp::new().await;
    let (admin, tenant, tenant_id) = app.landlord_and_tenant().await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/messages",
            Some(&admin),
            Some(json!({ "recipient_id": tenant_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sent) = app
        .call(
            Method::POST,
            "/api/messages",
            Some(&admin),
            Some(json!({ "recipient_id": tenant_id, "text": "Rent is due" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sent}");
    let message_uri = format!("/api/messages/{}", sent["id"]);
    let admin_id = sent["sender_id"].as_i64().unwrap();

    let (status, _) = app.call(Method::DELETE, &message_uri, Some(&tenant), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, still_there) = app.call(Method::GET, &message_uri, Some(&tenant), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(still_there["text"], "Rent is due");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/messages",
            Some(&tenant),
            Some(json!({ "recipient_id": admin_id, "text": "Paid yesterday" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, thread) = app
        .call(Method::GET, &format!("/api/messages/thread/{admin_id}"), Some(&tenant), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = thread
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["Rent is due", "Paid yesterday"]);

    let (status, _) = app.call(Method::DELETE, &message_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_authentication_required() {
    let app = TestApp::new().await;
    let (status, _) = app.call(Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call(Method::GET, "/api/me", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (admin_token, _, _) = app.landlord_and_tenant().await;
    let (status, me) = app.call(Method::GET, "/api/me", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "landlord");
    assert_eq!(me["role"], "admin");
    assert!(me.get("password_hash").is_none());

    let (status, health) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["services"]["database"], "healthy");
}

#[tokio::test]
async fn test_refresh_flow() {
    let app = TestApp::new().await;
    app.call(Method::POST, "/api/register-admin", None, Some(account("landlord")))
        .await;
    let (status, pair) = app
        .call(
            Method::POST,
            "/api/token",
            None,
            Some(json!({ "username": "landlord", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let refresh = pair["refresh"].as_str().unwrap();
    let (status, access) = app
        .call(
            Method::POST,
            "/api/token/refresh",
            None,
            Some(json!({ "refresh": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(access["access"].is_string());

    // An access token is not accepted where a refresh token is expected
    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh": pair["access"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
