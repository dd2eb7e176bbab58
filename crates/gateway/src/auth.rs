//! The SigV4 verification middleware. Runs before routing; on success it
//! stashes the authenticated identity, account, service, region and
//! access-key ID in the request extensions for the dispatcher and the
//! policy evaluator.
//!
//! Failure messages never reveal which sub-check failed beyond the
//! catalogue code the state machine prescribes.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{NaiveDateTime, Utc};
use http::{header, Method, Request};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use uuid::Uuid;

use hive_iam::crypto::decrypt_secret;
use hive_types::api::ServiceTag;
use hive_types::error::{ApiError, Code};
use hive_types::iam::KeyStatus;

use crate::envelope::Envelope;
use crate::sigv4::{self, AuthHeader};
use crate::AppState;

/// Accepted clock skew on `X-Amz-Date`, in seconds, inclusive.
const MAX_CLOCK_SKEW_SECS: i64 = 300;
/// Requests beyond this size are not worth hashing.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// The per-request scratch the middleware fills in: read by the
/// dispatcher and the policy evaluator, dropped with the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated user name (`root` for the root principal).
    pub identity: String,
    /// The account the identity belongs to.
    pub account_id: String,
    /// The raw service tag from the credential scope.
    pub service: String,
    /// The signing region.
    pub region: String,
    /// The key that signed this request.
    pub access_key_id: String,
    /// Request ID used in every envelope this request renders.
    pub request_id: String,
}

/// Picks the error envelope for a given (possibly unparsed) service tag.
/// Before the credential scope parses, the EC2 shape is all we have.
fn envelope_for(service: Option<&str>) -> Envelope {
    match service.and_then(ServiceTag::parse) {
        Some(ServiceTag::Iam) | Some(ServiceTag::Account) => Envelope::Iam,
        _ => Envelope::Ec2,
    }
}

/// The middleware entry point.
pub async fn sigv4_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // OPTIONS passes through untouched; the Authorization header is
    // never read for it.
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }
    match verify(&state, request).await {
        Ok(request) => next.run(request).await,
        Err(response) => *response,
    }
}

async fn verify(
    state: &AppState,
    request: Request<Body>,
) -> Result<Request<Body>, Box<Response>> {
    let request_id = Uuid::new_v4().to_string();
    let fail = |envelope: Envelope, code: Code, request_id: &str| {
        Box::new(envelope.error_response(&ApiError::new(code), request_id))
    };

    let auth_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if auth_value.is_empty() {
        return Err(fail(
            Envelope::Ec2,
            Code::MissingAuthenticationToken,
            &request_id,
        ));
    }

    let Some(parsed) = AuthHeader::parse(auth_value) else {
        return Err(fail(Envelope::Ec2, Code::IncompleteSignature, &request_id));
    };
    let envelope = envelope_for(Some(&parsed.service));

    // Timestamp: mandatory, exact format, bounded skew.
    let amz_date = request
        .headers()
        .get("x-amz-date")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let Ok(timestamp) = NaiveDateTime::parse_from_str(&amz_date, "%Y%m%dT%H%M%SZ") else {
        return Err(fail(envelope, Code::IncompleteSignature, &request_id));
    };
    let skew = (Utc::now() - timestamp.and_utc()).num_seconds().abs();
    if skew > MAX_CLOCK_SKEW_SECS {
        debug!(skew, "request timestamp outside the accepted window");
        return Err(fail(envelope, Code::SignatureDoesNotMatch, &request_id));
    }

    // The key must resolve and be active.
    let record = match state.iam.lookup_access_key(&parsed.access_key_id).await {
        Ok(record) => record,
        Err(e) => {
            debug!(key = %parsed.access_key_id, error = %e, "access key lookup failed");
            let code = if e.code == Code::InvalidClientTokenId {
                Code::InvalidClientTokenId
            } else {
                Code::InternalError
            };
            return Err(fail(envelope, code, &request_id));
        }
    };
    if record.status != KeyStatus::Active {
        return Err(fail(envelope, Code::InvalidClientTokenId, &request_id));
    }

    let secret = match decrypt_secret(state.iam.master_key(), &record.encrypted_secret) {
        Ok(secret) => secret,
        Err(e) => {
            warn!(key = %parsed.access_key_id, error = %e, "stored secret did not decrypt");
            return Err(fail(envelope, Code::InternalError, &request_id));
        }
    };

    // Canonicalise. The body must be buffered for its hash; it is put
    // back afterwards.
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return Err(fail(envelope, Code::InvalidParameter, &request_id));
        }
    };

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_default();
    let (headers_block, signed_list) =
        sigv4::canonical_headers(&parsed.signed_headers, |name| {
            if name == "host" {
                if host.is_empty() {
                    None
                } else {
                    Some(host.as_str())
                }
            } else {
                parts.headers.get(name).and_then(|v| v.to_str().ok())
            }
        });

    let canonical_request = sigv4::canonical_request(
        parts.method.as_str(),
        &sigv4::canonical_uri(parts.uri.path()),
        &sigv4::canonical_query_string(parts.uri.query().unwrap_or("")),
        &headers_block,
        &signed_list,
        &sigv4::payload_hash(&bytes),
    );
    let string_to_sign = sigv4::string_to_sign(&amz_date, &parsed.scope(), &canonical_request);
    let key = sigv4::signing_key(&secret, &parsed.date, &parsed.region, &parsed.service);
    let computed = sigv4::sign(&key, &string_to_sign);

    let matches: bool = computed
        .as_bytes()
        .ct_eq(parsed.signature.as_bytes())
        .into();
    if !matches {
        debug!(key = %parsed.access_key_id, "computed signature differs from the supplied one");
        return Err(fail(envelope, Code::SignatureDoesNotMatch, &request_id));
    }

    let context = AuthContext {
        identity: record.user_name,
        account_id: record.account_id,
        service: parsed.service,
        region: parsed.region,
        access_key_id: parsed.access_key_id,
        request_id,
    };
    debug!(identity = %context.identity, service = %context.service, "request authenticated");

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(context);
    Ok(request)
}
