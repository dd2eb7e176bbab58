//! The action dispatcher: a static registry of `action name → handler`
//! per service. The generic wrapper decodes the input shape, enforces
//! policy, requires a live bus for everything outside the local-only
//! allow-list, invokes the handler, and hands the typed output to the
//! sub-dispatcher's envelope.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::response::Response;
use http::StatusCode;
use tracing::{debug, warn};

use hive_codec::query::{decode_args, FromQuery, QueryMap};
use hive_codec::xml::ToXmlFields;
use hive_iam::policy::{evaluate_access, ROOT_IDENTITY};
use hive_types::api::{qualified_action, ServiceTag};
use hive_types::error::{ApiError, Code};
use hive_types::iam::policy::Decision;

use crate::actions;
use crate::auth::AuthContext;
use crate::envelope::{xml_response, Envelope};
use crate::AppState;

/// Actions that never touch the bus; everything else requires a live
/// connection.
pub const LOCAL_ACTIONS: &[&str] = &[
    "DescribeRegions",
    "DescribeAvailabilityZones",
    "DescribeAccountAttributes",
];

type BoxedOutput = Box<dyn ToXmlFields + Send>;
type HandlerFuture = Pin<Box<dyn Future<Output = Result<BoxedOutput, ApiError>> + Send>>;
type Handler =
    Box<dyn Fn(Arc<AppState>, AuthContext, Arc<QueryMap>) -> HandlerFuture + Send + Sync>;

/// One service's registry plus its envelope capability.
pub struct ServiceDispatcher {
    service: ServiceTag,
    envelope: Envelope,
    actions: HashMap<&'static str, Handler>,
}

impl ServiceDispatcher {
    fn new(service: ServiceTag, envelope: Envelope) -> ServiceDispatcher {
        ServiceDispatcher {
            service,
            envelope,
            actions: HashMap::new(),
        }
    }

    /// The envelope this service renders with.
    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    /// Registered action names, for table invariants and tests.
    pub fn action_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.keys().copied()
    }

    /// Registers a typed handler under an action name.
    pub fn register<I, O, F, Fut>(&mut self, name: &'static str, handler: F)
    where
        I: FromQuery + Default + Send + 'static,
        O: ToXmlFields + Send + 'static,
        F: Fn(Arc<AppState>, AuthContext, I) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
    {
        let service = self.service;
        self.actions.insert(
            name,
            Box::new(move |state, ctx, params| {
                let handler = handler.clone();
                Box::pin(async move {
                    let input: I = decode_args(params.as_ref())?;
                    check_policy(&state, &ctx, service, name).await?;
                    if !LOCAL_ACTIONS.contains(&name) {
                        ensure_bus(&state)?;
                    }
                    let output = handler(state, ctx, input).await?;
                    Ok(Box::new(output) as BoxedOutput)
                })
            }),
        );
    }
}

/// Step 3 of the wrapper: root bypasses, everyone else is evaluated
/// against their attached documents. The decision trace is logged, never
/// returned.
async fn check_policy(
    state: &AppState,
    ctx: &AuthContext,
    service: ServiceTag,
    action: &str,
) -> Result<(), ApiError> {
    let qualified = qualified_action(service, action);
    if ctx.identity == ROOT_IDENTITY {
        debug!(action = %qualified, identity = %ctx.identity, "root bypasses policy");
        return Ok(());
    }
    let documents = state
        .iam
        .get_user_policies(&ctx.account_id, &ctx.identity)
        .await?;
    let decision = evaluate_access(&ctx.identity, &qualified, "*", &documents);
    debug!(action = %qualified, identity = %ctx.identity, ?decision, "policy evaluated");
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(ApiError::new(Code::AccessDenied)),
    }
}

/// Step 4: everything outside the local-only allow-list needs the bus.
fn ensure_bus(state: &AppState) -> Result<(), ApiError> {
    match &state.bus {
        Some(bus) if bus.is_connected() => Ok(()),
        _ => Err(ApiError::with_message(
            Code::ServerInternal,
            "control bus is not connected",
        )),
    }
}

/// The three sub-dispatchers, selected by service tag.
pub struct Dispatcher {
    ec2: ServiceDispatcher,
    iam: ServiceDispatcher,
    account: ServiceDispatcher,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Builds the full registry.
    pub fn new() -> Dispatcher {
        let mut ec2 = ServiceDispatcher::new(ServiceTag::Ec2, Envelope::Ec2);
        actions::ec2::register(&mut ec2);
        let mut iam = ServiceDispatcher::new(ServiceTag::Iam, Envelope::Iam);
        actions::iam::register(&mut iam);
        let mut account = ServiceDispatcher::new(ServiceTag::Account, Envelope::Iam);
        actions::account::register(&mut account);
        Dispatcher { ec2, iam, account }
    }

    /// The sub-dispatcher for a service.
    pub fn sub(&self, tag: ServiceTag) -> &ServiceDispatcher {
        match tag {
            ServiceTag::Ec2 => &self.ec2,
            ServiceTag::Iam => &self.iam,
            ServiceTag::Account => &self.account,
        }
    }

    /// Routes one authenticated request to its handler and renders the
    /// outcome.
    pub async fn dispatch(
        &self,
        state: Arc<AppState>,
        ctx: AuthContext,
        params: QueryMap,
    ) -> Response {
        let request_id = ctx.request_id.clone();
        let Some(tag) = ServiceTag::parse(&ctx.service) else {
            let err = ApiError::with_message(
                Code::UnsupportedOperation,
                format!("unsupported service {:?}", ctx.service),
            );
            return Envelope::Ec2.error_response(&err, &request_id);
        };
        let sub = self.sub(tag);

        let Some(action) = params.get("Action").map(str::to_string) else {
            let err = ApiError::with_message(Code::MissingParameter, "Action is required");
            return sub.envelope.error_response(&err, &request_id);
        };
        let Some(handler) = sub.actions.get(action.as_str()) else {
            let err = ApiError::with_message(
                Code::InvalidAction,
                format!("unknown action {action}"),
            );
            return sub.envelope.error_response(&err, &request_id);
        };

        match handler(state, ctx, Arc::new(params)).await {
            Ok(output) => match sub.envelope.render_ok(&action, &request_id, output.as_ref()) {
                Ok(xml) => xml_response(StatusCode::OK, xml),
                Err(e) => {
                    warn!(action = %action, error = %e, "response rendering failed");
                    sub.envelope.error_response(&e, &request_id)
                }
            },
            Err(e) => {
                if e.code == Code::InternalError || e.code == Code::ServerInternal {
                    warn!(action = %action, error = %e, "action failed");
                }
                sub.envelope.error_response(&e, &request_id)
            }
        }
    }
}
