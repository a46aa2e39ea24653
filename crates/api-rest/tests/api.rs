//! Router-level tests: requests go through the real middleware stack against a memory store.

use api_rest::{router, AppState};
use api_shared::Policy;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use his_core::models::RegisterRequest;
use his_core::{AppConfig, FixedClock, MemoryStore, ServiceContext};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@his.test";
const PASSWORD: &str = "correct-horse";

struct TestApp {
    router: Router,
    state: AppState,
    clock: Arc<FixedClock>,
}

fn app_with(policy: Policy) -> TestApp {
    let start = Utc
        .with_ymd_and_hms(2026, 10, 16, 4, 30, 0)
        .single()
        .expect("valid start time");
    let clock = Arc::new(FixedClock::new(start));
    let config = AppConfig::from_lookup(|_| None).expect("default config should resolve");
    let ctx = ServiceContext::new(Arc::new(MemoryStore::new()), clock.clone(), Arc::new(config));
    let state = AppState::with_policy(ctx, policy);
    TestApp {
        router: router(state.clone()),
        state,
        clock,
    }
}

fn app() -> TestApp {
    app_with(Policy::hospital())
}

impl TestApp {
    async fn register(&self, email: &str, role: &str) {
        let req: RegisterRequest = serde_json::from_value(json!({
            "name": "Test User",
            "email": email,
            "password": PASSWORD,
            "role": role,
        }))
        .expect("register request should parse");
        self.state
            .services
            .users
            .register(req)
            .await
            .expect("register should succeed");
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"]
            .as_str()
            .expect("login should return a token")
            .to_owned()
    }

    async fn admin_token(&self) -> String {
        self.register(ADMIN_EMAIL, "admin").await;
        self.login(ADMIN_EMAIL).await
    }

    async fn raw(&self, req: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("router should respond")
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let res = self
            .raw(builder.body(body).expect("request should build"))
            .await;
        let status = res.status();
        let bytes = res
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response should be JSON")
        };
        (status, value)
    }
}

fn patient_body() -> Value {
    json!({
        "title": "Mr",
        "name": "Ravi Kumar",
        "gender": "Male",
        "age": { "years": 34 },
        "mobile": "98765 43210",
        "address": { "line": "12 MG Road", "city": "Pune" },
        "relationType": "S/O",
        "relativeName": "Suresh Kumar",
        "religion": "Hindu",
        "occupation": "Service",
        "idType": "Aadhaar",
        "idNumber": "1234-5678-9012",
    })
}

fn service_body(code: &str, category: &str, applicability: &str, price: f64) -> Value {
    json!({
        "name": format!("{code} service"),
        "code": code,
        "category": category,
        "applicability": applicability,
        "price": price,
    })
}

// =============================================================================
// Health and access control
// =============================================================================

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = app();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["message"], "HIS is alive");

    let (status, _) = app.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_401_with_envelope() {
    let app = app();
    let (status, body) = app.send(Method::GET, "/api/patients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_garbage_token_is_401() {
    let app = app();
    let (status, _) = app
        .send(Method::GET, "/api/patients", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let app = app();
    let token = app.admin_token().await;
    app.clock.advance(Duration::days(8));
    let (status, _) = app
        .send(Method::GET, "/api/patients", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_role_is_403() {
    let app = app();
    app.register("desk@his.test", "receptionist").await;
    let token = app.login("desk@his.test").await;

    let (status, body) = app.send(Method::GET, "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], false);

    // Reading the catalogue is open to every role; changing it is not.
    let (status, _) = app.send(Method::GET, "/api/services", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(
            Method::POST,
            "/api/services",
            Some(&token),
            Some(service_body("CBC", "Laboratory", "Both", 350.0)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_permissive_policy_lets_any_role_through() {
    let app = app_with(Policy::permissive());
    app.register("nurse@his.test", "nurse").await;
    let token = app.login("nurse@his.test").await;
    let (status, _) = app.send(Method::GET, "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Auth endpoints
// =============================================================================

#[tokio::test]
async fn test_login_and_me_use_legacy_envelope() {
    let app = app();
    let token = app.admin_token().await;

    let (status, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_bad_password_is_401() {
    let app = app();
    app.register(ADMIN_EMAIL, "admin").await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_register_duplicate_email_is_400() {
    let app = app();
    let token = app.admin_token().await;
    let body = json!({
        "name": "Second Admin",
        "email": ADMIN_EMAIL,
        "password": PASSWORD,
        "role": "admin",
    });
    let (status, body) = app
        .send(Method::POST, "/api/auth/register", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email is already registered");
}

// =============================================================================
// Request validation
// =============================================================================

#[tokio::test]
async fn test_malformed_json_names_the_field() {
    let app = app();
    let token = app.admin_token().await;
    let mut body = patient_body();
    body["mobile"] = json!("12345");

    let (status, body) = app
        .send(Method::POST, "/api/patients", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    let message = body["message"].as_str().expect("message should be a string");
    assert!(message.starts_with("mobile: "), "{message}");
}

#[tokio::test]
async fn test_bad_path_id_is_400() {
    let app = app();
    let token = app.admin_token().await;
    let (status, body) = app
        .send(Method::GET, "/api/patients/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid id");
}

// =============================================================================
// Resources
// =============================================================================

#[tokio::test]
async fn test_patient_create_then_fetch() {
    let app = app();
    let token = app.admin_token().await;

    let (status, created) = app
        .send(Method::POST, "/api/patients", Some(&token), Some(patient_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["uhid"], "UHID202610160001");
    assert_eq!(created["data"]["mobile"], "9876543210");

    let id = created["data"]["id"].as_str().expect("patient id");
    let (status, fetched) = app
        .send(Method::GET, &format!("/api/patients/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], created["data"]);

    let (status, by_uhid) = app
        .send(Method::GET, "/api/patients/uhid/UHID202610160001", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_uhid["data"]["id"], id);
}

#[tokio::test]
async fn test_unknown_patient_is_404() {
    let app = app();
    let token = app.admin_token().await;
    let uri = format!("/api/patients/{}", uuid::Uuid::new_v4());
    let (status, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Patient not found");
}

#[tokio::test]
async fn test_list_is_paginated() {
    let app = app();
    let token = app.admin_token().await;
    for _ in 0..3 {
        let (status, _) = app
            .send(Method::POST, "/api/patients", Some(&token), Some(patient_body()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, body) = app
        .send(Method::GET, "/api/patients?page=2&limit=2", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["hasPrevPage"], true);
    assert_eq!(body["data"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_opd_bill_rejects_ipd_only_service_and_stores_nothing() {
    let app = app();
    let token = app.admin_token().await;

    let (_, patient) = app
        .send(Method::POST, "/api/patients", Some(&token), Some(patient_body()))
        .await;
    let (_, nursing) = app
        .send(
            Method::POST,
            "/api/services",
            Some(&token),
            Some(service_body("NURSE", "Nursing", "IPD", 800.0)),
        )
        .await;

    let bill = json!({
        "patientId": patient["data"]["id"],
        "services": [{ "serviceId": nursing["data"]["id"] }],
        "paymentMode": "Cash",
    });
    let (status, body) = app
        .send(Method::POST, "/api/opd-billing", Some(&token), Some(bill))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Service NURSE service is not applicable to OPD");

    let (_, list) = app.send(Method::GET, "/api/opd-billing", Some(&token), None).await;
    assert_eq!(list["data"]["total"], 0);
    let (_, orders) = app.send(Method::GET, "/api/lab-orders", Some(&token), None).await;
    assert_eq!(orders["data"]["total"], 0);
}

#[tokio::test]
async fn test_opd_bill_pdf_is_an_attachment() {
    let app = app();
    let token = app.admin_token().await;

    let (_, patient) = app
        .send(Method::POST, "/api/patients", Some(&token), Some(patient_body()))
        .await;
    let (_, consult) = app
        .send(
            Method::POST,
            "/api/services",
            Some(&token),
            Some(service_body("CONS", "Consultation", "Both", 500.0)),
        )
        .await;
    let bill = json!({
        "patientId": patient["data"]["id"],
        "services": [{ "serviceId": consult["data"]["id"], "quantity": 2 }],
        "paidAmount": 1000.0,
        "paymentMode": "UPI",
    });
    let (status, created) = app
        .send(Method::POST, "/api/opd-billing", Some(&token), Some(bill))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["data"]["billNumber"], "OPD-00001");

    let id = created["data"]["id"].as_str().expect("bill id");
    let req = Request::builder()
        .uri(format!("/api/opd-billing/{id}/pdf"))
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    let res = app.raw(req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/pdf");
    assert_eq!(
        res.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"OPD-00001.pdf\""
    );
    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_vocabulary_lists_blood_groups() {
    let app = app();
    let token = app.admin_token().await;
    let (status, body) = app
        .send(Method::GET, "/api/vocab/blood-group", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let options = body["data"].as_array().expect("options array");
    assert_eq!(options.len(), 8);
    assert_eq!(options[0], json!({ "value": "A+", "label": "A+" }));

    let (status, _) = app
        .send(Method::GET, "/api/vocab/star-sign", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app();
    let (status, body) = app
        .send(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/opd-billing").is_some());
}
