use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use carenest::{models::auth::UserRole, routes::create_router};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

use super::common::{test_config, TestApp, TEST_WEBHOOK_SECRET};

fn sign(body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn app_with_secret() -> TestApp {
    let mut config = test_config();
    config.billing.webhook_secret = Some(TEST_WEBHOOK_SECRET.to_string());
    TestApp::with_config(config)
}

fn token(app: &TestApp, user_id: Uuid, role: UserRole) -> String {
    app.state.jwt_service.generate_token(user_id, role).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn authed(method: &str, uri: &str, bearer: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", bearer));
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn webhook(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/stripe")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-webhook-signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_plan_requires_auth() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());

    let request = Request::builder()
        .uri("/api/v1/plan")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_get_plan_and_start_trial() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let bearer = token(&app, Uuid::new_v4(), UserRole::User);

    let (status, body) = send(&router, authed("GET", "/api/v1/plan", &bearer, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plan"], "free");
    assert_eq!(body["data"]["status"], "none");
    assert_eq!(body["data"]["limits"]["maxEventsPerMonth"], 500);
    assert_eq!(body["data"]["limits"]["maxChildren"], 2);
    assert_eq!(body["data"]["trial"]["used"], false);

    let (status, body) = send(&router, authed("POST", "/api/v1/plan/trial", &bearer, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["trial"]["active"], true);
    assert_eq!(body["data"]["limits"]["aiEnabled"], true);

    let (status, body) = send(&router, authed("POST", "/api/v1/plan/trial", &bearer, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "TRIAL_ALREADY_USED");
}

#[tokio::test]
async fn test_webhook_signature_required_when_configured() {
    let app = app_with_secret();
    let router = create_router(app.state.clone());
    let body = json!({
        "type": "subscription_activated",
        "data": { "userId": Uuid::new_v4().to_string() }
    })
    .to_string();

    let (status, response) = send(&router, webhook(&body, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error"]["code"], "INVALID_SIGNATURE");

    let (status, _) = send(&router, webhook(&body, Some("deadbeef"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.subscriptions.write_count(), 0);
}

#[tokio::test]
async fn test_signed_webhook_applied() {
    let app = app_with_secret();
    let router = create_router(app.state.clone());
    let user_id = Uuid::new_v4();
    let body = json!({
        "type": "subscription_activated",
        "data": { "userId": user_id.to_string(), "customer_id": "cus_r" }
    })
    .to_string();
    let signature = format!("sha256={}", sign(&body));

    let (status, response) = send(&router, webhook(&body, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "handled": true }));

    let bearer = token(&app, user_id, UserRole::User);
    let (_, plan) = send(&router, authed("GET", "/api/v1/plan", &bearer, None)).await;
    assert_eq!(plan["data"]["plan"], "pro");
}

#[tokio::test]
async fn test_unsigned_webhook_accepted_without_secret() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let body = json!({ "event_type": "subscription_renewed", "userId": "someone" }).to_string();

    let (status, response) = send(&router, webhook(&body, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "handled": false }));
}

#[tokio::test]
async fn test_blank_webhook_secret_is_not_a_signing_key() {
    let mut config = test_config();
    config.billing.webhook_secret = Some(String::new());
    let app = TestApp::with_config(config);
    let router = create_router(app.state.clone());
    let user_id = Uuid::new_v4();
    let body = json!({
        "type": "subscription_activated",
        "data": { "userId": user_id.to_string() }
    })
    .to_string();

    // An empty-key HMAC must not be demanded; the request goes through as unsigned
    let (status, response) = send(&router, webhook(&body, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "handled": true }));
    assert!(app.subscriptions.get(user_id).is_some());
}

#[tokio::test]
async fn test_malformed_webhook_is_bad_request() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());

    let (status, body) = send(&router, webhook("{\"data\": {}}", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_export_gated_to_pro() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let user_id = Uuid::new_v4();
    let bearer = token(&app, user_id, UserRole::User);

    let (status, body) = send(&router, authed("GET", "/api/v1/events/export", &bearer, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "PLAN_REQUIRED");
    assert_eq!(body["error"]["details"]["requiredPlan"], "pro");
    assert!(body["error"]["details"]["upgradePath"].is_string());

    // A free trial does not open pro-only routes
    app.state.trial_service.start_trial(user_id).await.unwrap();
    let (status, _) = send(&router, authed("GET", "/api/v1/events/export", &bearer, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let body = json!({ "type": "subscription_activated", "userId": user_id.to_string() }).to_string();
    send(&router, webhook(&body, None)).await;

    let (status, body) = send(&router, authed("GET", "/api/v1/events/export", &bearer, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_event_quota_over_http() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let user_id = Uuid::new_v4();
    let child_id = app.care.add_child(user_id);
    app.care.seed_events(user_id, child_id, 500);
    let bearer = token(&app, user_id, UserRole::User);

    let (status, body) = send(
        &router,
        authed(
            "POST",
            "/api/v1/events",
            &bearer,
            Some(json!({ "childId": child_id, "eventType": "diaper" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "QUOTA_EXCEEDED");
    assert_eq!(body["error"]["details"]["limit"], 500);
    assert_eq!(body["error"]["details"]["resource"], "events");
}

#[tokio::test]
async fn test_create_child_over_http() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let bearer = token(&app, Uuid::new_v4(), UserRole::User);

    let (status, body) = send(
        &router,
        authed(
            "POST",
            "/api/v1/children",
            &bearer,
            Some(json!({ "name": "Noah", "birthDate": "2024-05-01" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Noah");
    assert_eq!(body["data"]["birthDate"], "2024-05-01");
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let user_bearer = token(&app, Uuid::new_v4(), UserRole::User);

    let (status, body) = send(&router, authed("GET", "/api/v1/admin/metrics", &user_bearer, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_set_plan_over_http() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let admin_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let admin_bearer = token(&app, admin_id, UserRole::Admin);

    let (status, body) = send(
        &router,
        authed(
            "PUT",
            &format!("/api/v1/admin/subscriptions/{}/plan", user_id),
            &admin_bearer,
            Some(json!({ "plan": "pro", "status": "past_due" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plan"], "pro");
    assert_eq!(body["data"]["status"], "past_due");
    assert_eq!(app.subscriptions.audits()[0].admin_id, admin_id);

    let (status, body) = send(
        &router,
        authed(
            "GET",
            &format!("/api/v1/admin/subscriptions/{}", user_id),
            &admin_bearer,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plan"]["plan"], "pro");
    assert_eq!(body["data"]["usage"]["eventsThisMonth"], 0);

    let (status, body) = send(
        &router,
        authed("GET", "/api/v1/admin/subscriptions?plan=pro&perPage=10", &admin_bearer, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_store_outage_is_503_without_details() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let bearer = token(&app, Uuid::new_v4(), UserRole::User);
    app.subscriptions.set_unavailable(true);

    let (status, body) = send(&router, authed("GET", "/api/v1/plan", &bearer, None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");
    assert!(!body.to_string().contains("10.0.0.5"));
}

#[tokio::test]
async fn test_request_id_propagated() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());

    let request = Request::builder()
        .uri("/api/v1/plan")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let request = Request::builder()
        .uri("/api/v1/plan")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
