#![forbid(unsafe_code)]

//! # Hive Gateway
//!
//! The public front-end of the control plane. The pipeline per request:
//! TLS accept → SigV4 middleware → service routing from the credential
//! scope → action dispatch → AWS-shaped XML response. Errors at any step
//! short-circuit to the error catalogue and the active service's
//! envelope.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::response::Response;
use axum::Router;
use http::{Method, StatusCode};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use hive_bus::ControlBus;
use hive_codec::query::QueryMap;
use hive_iam::IamStore;
use hive_types::config::GatewayConfig;
use hive_types::error::{ApiError, Code};

pub mod actions;
pub mod auth;
pub mod dispatch;
pub mod envelope;
pub mod server;
pub mod sigv4;

use auth::AuthContext;
use dispatch::Dispatcher;
use envelope::Envelope;

/// Everything a request handler can reach: the IAM store, the bus (when
/// connected), the gateway configuration, and the action registry.
pub struct AppState {
    /// The IAM store.
    pub iam: Arc<IamStore>,
    /// The control bus; `None` until the connection is up.
    pub bus: Option<Arc<dyn ControlBus>>,
    /// Front-end settings.
    pub config: GatewayConfig,
    /// The action registry.
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Assembles the state with a freshly built registry.
    pub fn new(
        iam: Arc<IamStore>,
        bus: Option<Arc<dyn ControlBus>>,
        config: GatewayConfig,
    ) -> AppState {
        AppState {
            iam,
            bus,
            config,
            dispatcher: Dispatcher::new(),
        }
    }
}

/// Builds the router: one catch-all route behind the SigV4 middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::sigv4_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// The AWS SDK leaves trailing base64 padding percent-encoded as
/// `%3D%3D` in `ImportKeyPair.PublicKeyMaterial`; repair it before the
/// form decode.
fn repair_base64_padding(raw: &str) -> String {
    if raw.contains("PublicKeyMaterial") {
        raw.replace("%3D%3D", "==")
    } else {
        raw.to_string()
    }
}

async fn handle_request(
    State(state): State<Arc<AppState>>,
    context: Option<Extension<AuthContext>>,
    request: http::Request<axum::body::Body>,
) -> Response {
    if request.method() == Method::OPTIONS {
        return Response::builder()
            .status(StatusCode::OK)
            .body(axum::body::Body::empty())
            .unwrap_or_default();
    }
    let Some(Extension(context)) = context else {
        // The middleware always stashes a context for non-OPTIONS
        // requests; reaching this line is a routing bug.
        let err = ApiError::new(Code::InternalError);
        return Envelope::Ec2.error_response(&err, "unknown");
    };

    let query = request.uri().query().unwrap_or("").to_string();
    let body = match axum::body::to_bytes(request.into_body(), 10 * 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "request body unreadable");
            let err = ApiError::new(Code::InvalidParameter);
            return Envelope::Ec2.error_response(&err, &context.request_id);
        }
    };

    // Query-string parameters first, form-body parameters on top.
    let mut params = QueryMap::parse(&query);
    let body_raw = repair_base64_padding(&String::from_utf8_lossy(&body));
    for (k, v) in QueryMap::parse(&body_raw).iter() {
        params.insert(k, v);
    }

    state
        .dispatcher
        .dispatch(state.clone(), context, params)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_repair_is_scoped_to_key_material_bodies() {
        let body = "Action=ImportKeyPair&KeyName=k&PublicKeyMaterial=c3NoLXJzYSBBQUFB%3D%3D";
        assert_eq!(
            repair_base64_padding(body),
            "Action=ImportKeyPair&KeyName=k&PublicKeyMaterial=c3NoLXJzYSBBQUFB=="
        );
        let other = "Action=RunInstances&UserData=%3D%3D";
        assert_eq!(repair_base64_padding(other), other);
    }

    #[test]
    fn repaired_body_decodes_to_the_padded_blob() {
        let body = repair_base64_padding("PublicKeyMaterial=QUJDRA%3D%3D");
        let q = QueryMap::parse(&body);
        assert_eq!(q.get("PublicKeyMaterial"), Some("QUJDRA=="));
    }
}
