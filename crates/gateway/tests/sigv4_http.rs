//! HTTP-level middleware tests: real requests through the router, signed
//! with the same canonicalisation the verifier uses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use chrono::{DateTime, Utc};
use http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use hive_bus::{ControlBus, FanoutReply};
use hive_gateway::{router, sigv4, AppState};
use hive_iam::crypto::MasterKey;
use hive_iam::kv::MemoryKv;
use hive_iam::IamStore;
use hive_types::config::GatewayConfig;
use hive_types::error::ApiError;
use hive_types::iam::KeyStatus;

const REGION: &str = "ap-southeast-2";
const ACCT: &str = "000000000000";

struct IdleBus;

#[async_trait]
impl ControlBus for IdleBus {
    async fn request_raw(
        &self,
        _subject: String,
        _payload: Vec<u8>,
        _timeout: Duration,
    ) -> Result<Vec<u8>, ApiError> {
        Err(ApiError::new(hive_types::error::Code::ServiceUnavailable))
    }

    async fn fanout_raw(
        &self,
        _subject: String,
        _payload: Vec<u8>,
        _window: Duration,
        _expected: usize,
    ) -> Result<Vec<FanoutReply>, ApiError> {
        Ok(Vec::new())
    }

    async fn publish(&self, _subject: String, _payload: Vec<u8>) -> Result<(), ApiError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

async fn state_with_key() -> (Arc<AppState>, String, String) {
    let iam = Arc::new(IamStore::new(
        Arc::new(MemoryKv::new()),
        MasterKey::generate(),
    ));
    // Signed as root so the policy gate stays out of these tests'
    // way; dispatch.rs covers evaluation.
    iam.create_user(ACCT, "root", None, Vec::new()).await.unwrap();
    let (record, secret) = iam.create_access_key(ACCT, "root").await.unwrap();
    let state = Arc::new(AppState::new(
        iam,
        Some(Arc::new(IdleBus) as Arc<dyn ControlBus>),
        GatewayConfig::default(),
    ));
    (state, record.access_key_id, secret)
}

fn signed_request(
    body: &str,
    access_key: &str,
    secret: &str,
    service: &str,
    when: DateTime<Utc>,
) -> Request<Body> {
    let amz_date = when.format("%Y%m%dT%H%M%SZ").to_string();
    let date = when.format("%Y%m%d").to_string();
    let host = "localhost";

    let mut header_values = HashMap::new();
    header_values.insert("host", host.to_string());
    header_values.insert("x-amz-date", amz_date.clone());
    let (headers_block, signed_list) = sigv4::canonical_headers("host;x-amz-date", |name| {
        header_values.get(name).map(String::as_str)
    });

    let canonical = sigv4::canonical_request(
        "POST",
        "/",
        "",
        &headers_block,
        &signed_list,
        &sigv4::payload_hash(body.as_bytes()),
    );
    let scope = format!("{date}/{REGION}/{service}/aws4_request");
    let sts = sigv4::string_to_sign(&amz_date, &scope, &canonical);
    let key = sigv4::signing_key(secret, &date, REGION, service);
    let signature = sigv4::sign(&key, &sts);

    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::HOST, host)
        .header("x-amz-date", amz_date)
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .header(
            header::AUTHORIZATION,
            format!(
                "AWS4-HMAC-SHA256 Credential={access_key}/{scope}, \
                 SignedHeaders={signed_list}, Signature={signature}"
            ),
        )
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, String) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn valid_signature_reaches_the_dispatcher() {
    let (state, access_key, secret) = state_with_key().await;
    let request = signed_request("Action=ListUsers", &access_key, &secret, "iam", Utc::now());
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains("<ListUsersResult>"));
    assert!(body.contains("<UserName>root</UserName>"));
}

#[tokio::test]
async fn wrong_secret_is_signature_does_not_match() {
    let (state, access_key, _secret) = state_with_key().await;
    let request = signed_request(
        "Action=ListUsers",
        &access_key,
        "0000000000000000000000000000000000000000",
        "iam",
        Utc::now(),
    );
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("<Code>SignatureDoesNotMatch</Code>"));
}

#[tokio::test]
async fn unknown_access_key_is_invalid_client_token() {
    let (state, _access_key, secret) = state_with_key().await;
    let request = signed_request(
        "Action=ListUsers",
        "AKIAUNKNOWNUNKNOWN00",
        &secret,
        "iam",
        Utc::now(),
    );
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("<Code>InvalidClientTokenId</Code>"));
}

#[tokio::test]
async fn inactive_key_is_invalid_client_token() {
    let (state, access_key, secret) = state_with_key().await;
    state
        .iam
        .update_access_key(&access_key, KeyStatus::Inactive)
        .await
        .unwrap();
    let request = signed_request("Action=ListUsers", &access_key, &secret, "iam", Utc::now());
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("<Code>InvalidClientTokenId</Code>"));
}

#[tokio::test]
async fn missing_authorization_is_a_403() {
    let (state, _, _) = state_with_key().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::HOST, "localhost")
        .body(Body::from("Action=ListUsers"))
        .unwrap();
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("<Code>MissingAuthenticationToken</Code>"));
}

#[tokio::test]
async fn malformed_authorization_is_incomplete_signature() {
    let (state, _, _) = state_with_key().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::HOST, "localhost")
        .header(header::AUTHORIZATION, "AWS4-HMAC-SHA256 Credential=only")
        .header("x-amz-date", "20260801T000000Z")
        .body(Body::from("Action=ListUsers"))
        .unwrap();
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("<Code>IncompleteSignature</Code>"));
}

#[tokio::test]
async fn ten_minute_old_timestamp_is_rejected() {
    let (state, access_key, secret) = state_with_key().await;
    let when = Utc::now() - chrono::Duration::minutes(10);
    let request = signed_request("Action=ListUsers", &access_key, &secret, "iam", when);
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("<Code>SignatureDoesNotMatch</Code>"));
}

#[tokio::test]
async fn skew_just_inside_the_window_is_accepted() {
    let (state, access_key, secret) = state_with_key().await;
    let when = Utc::now() - chrono::Duration::seconds(299);
    let request = signed_request("Action=ListUsers", &access_key, &secret, "iam", when);
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn skew_just_outside_the_window_is_rejected() {
    let (state, access_key, secret) = state_with_key().await;
    let when = Utc::now() - chrono::Duration::seconds(302);
    let request = signed_request("Action=ListUsers", &access_key, &secret, "iam", when);
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("<Code>SignatureDoesNotMatch</Code>"));
}

#[tokio::test]
async fn options_requests_pass_without_credentials() {
    let (state, _, _) = state_with_key().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn tampered_body_breaks_the_signature() {
    let (state, access_key, secret) = state_with_key().await;
    let mut request = signed_request("Action=ListUsers", &access_key, &secret, "iam", Utc::now());
    *request.body_mut() = Body::from("Action=DeleteUser&UserName=ops");
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("<Code>SignatureDoesNotMatch</Code>"));
}
