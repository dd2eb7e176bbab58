#![forbid(unsafe_code)]

//! # Hive Bus
//!
//! The typed request/response layer over the control bus. Three shapes:
//! queue-group unary request/reply, broadcast-and-collect fan-out, and
//! fire-and-forget lifecycle events. Every reply body goes through the
//! error-payload discriminator, so daemons may answer with either a typed
//! success body or `{"code": "<awsCode>", "message": "…"}`.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use hive_types::error::{ApiError, Code};

/// Subjects that form the stable contract with the daemons.
pub mod subjects {
    /// Active-node discovery broadcast.
    pub const NODES_DISCOVER: &str = "hive.nodes.discover";
    /// Queue-group unary prefix for plain EC2 verbs: `ec2.<Action>`.
    pub const EC2_PREFIX: &str = "ec2";
    /// The authoritative stopped-instance set.
    pub const EC2_DESCRIBE_STOPPED: &str = "ec2.DescribeStoppedInstances";
    /// EBS volume attach.
    pub const EBS_MOUNT: &str = "ebs.mount";
    /// EBS volume delete.
    pub const EBS_DELETE: &str = "ebs.delete";
    /// EBS volume detach on a specific node: `ebs.<node>.unmount`.
    pub fn ebs_unmount(node: &str) -> String {
        format!("ebs.{node}.unmount")
    }
    /// EBS snapshot of a specific volume: `ebs.snapshot.<volume>`.
    pub fn ebs_snapshot(volume_id: &str) -> String {
        format!("ebs.snapshot.{volume_id}")
    }
    /// Queue-group unary subject for an EC2 action.
    pub fn ec2_action(action: &str) -> String {
        format!("{EC2_PREFIX}.{action}")
    }
}

/// Unary queue-group calls wait this long for the single reply.
pub const UNARY_TIMEOUT: Duration = Duration::from_secs(30);
/// Broadcast collection window.
pub const FANOUT_WINDOW: Duration = Duration::from_secs(3);
/// Active-node discovery window.
pub const DISCOVERY_WINDOW: Duration = Duration::from_millis(500);
/// Start-up connection retries give up after this long.
pub const CONNECT_DEADLINE: Duration = Duration::from_secs(300);

/// The error payload daemons reply with instead of a success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    /// An AWS-shaped error code.
    pub code: String,
    /// The outward message.
    #[serde(default)]
    pub message: String,
}

/// One raw broadcast reply, with the node identity the daemon stamped on
/// it (absent when the reply was malformed enough to hide it).
#[derive(Debug, Clone)]
pub struct FanoutReply {
    /// The replying node, from the mandatory `node` field.
    pub node: Option<String>,
    /// The raw JSON body.
    pub payload: Vec<u8>,
}

/// The control bus as the dispatcher sees it. Implemented by [`NatsBus`]
/// in production and by in-process mocks in tests.
#[async_trait]
pub trait ControlBus: Send + Sync {
    /// Queue-group unary request/reply.
    async fn request_raw(
        &self,
        subject: String,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, ApiError>;

    /// Broadcast with a fresh inbox; collects replies until `expected`
    /// distinct node identities are in or the window expires. Duplicate
    /// node identities are deduplicated for count purposes only.
    async fn fanout_raw(
        &self,
        subject: String,
        payload: Vec<u8>,
        window: Duration,
        expected: usize,
    ) -> Result<Vec<FanoutReply>, ApiError>;

    /// Fire-and-forget lifecycle event.
    async fn publish(&self, subject: String, payload: Vec<u8>) -> Result<(), ApiError>;

    /// True while the underlying connection is usable.
    fn is_connected(&self) -> bool;
}

/// Discriminates a reply body: an `{"code": …}` payload becomes the
/// corresponding catalogue error (unknown codes are remapped to
/// `InternalError` with a warning), anything else parses as `T`.
pub fn decode_reply<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| ApiError::with_message(Code::InternalError, format!("bad reply: {e}")))?;
    if let Some(err) = as_error_reply(&value) {
        return Err(err);
    }
    serde_json::from_value(value)
        .map_err(|e| ApiError::with_message(Code::InternalError, format!("bad reply: {e}")))
}

fn as_error_reply(value: &serde_json::Value) -> Option<ApiError> {
    let obj = value.as_object()?;
    let code = obj.get("code")?.as_str()?;
    let message = obj
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or_default();
    Some(match Code::parse(code) {
        Some(code) if message.is_empty() => ApiError::new(code),
        Some(code) => ApiError::with_message(code, message),
        None => {
            warn!(code = %code, "daemon replied with an unknown error code");
            ApiError::new(Code::InternalError)
        }
    })
}

/// Typed unary request on a queue-group subject.
pub async fn request<P: Serialize, T: DeserializeOwned>(
    bus: &dyn ControlBus,
    subject: &str,
    payload: &P,
) -> Result<T, ApiError> {
    let body = serde_json::to_vec(payload)
        .map_err(|e| ApiError::with_message(Code::InternalError, e.to_string()))?;
    let reply = bus
        .request_raw(subject.to_string(), body, UNARY_TIMEOUT)
        .await?;
    decode_reply(&reply)
}

/// Typed broadcast: collects per-node replies, discriminates each, logs
/// and drops per-node errors. Succeeds as long as at least one node
/// replied at all; a silent bus is `ServiceUnavailable`.
pub async fn fanout<P: Serialize, T: DeserializeOwned>(
    bus: &dyn ControlBus,
    subject: &str,
    payload: &P,
    expected: usize,
) -> Result<Vec<T>, ApiError> {
    let body = serde_json::to_vec(payload)
        .map_err(|e| ApiError::with_message(Code::InternalError, e.to_string()))?;
    let replies = bus
        .fanout_raw(subject.to_string(), body, FANOUT_WINDOW, expected)
        .await?;
    if replies.is_empty() {
        return Err(ApiError::with_message(
            Code::ServiceUnavailable,
            format!("no nodes replied on {subject}"),
        ));
    }
    let mut out = Vec::with_capacity(replies.len());
    for reply in &replies {
        match decode_reply::<T>(&reply.payload) {
            Ok(value) => out.push(value),
            Err(e) => {
                let node = reply.node.as_deref().unwrap_or("unknown");
                warn!(subject = %subject, node = %node, error = %e,
                    "node contributed an error to the fan-out");
            }
        }
    }
    Ok(out)
}

/// Fire-and-forget typed event.
pub async fn publish_event<P: Serialize>(
    bus: &dyn ControlBus,
    subject: &str,
    payload: &P,
) -> Result<(), ApiError> {
    let body = serde_json::to_vec(payload)
        .map_err(|e| ApiError::with_message(Code::InternalError, e.to_string()))?;
    bus.publish(subject.to_string(), body).await
}

/// Discovers the active daemon count: a bounded broadcast on
/// `hive.nodes.discover`, unique by node identity. The discovered value
/// is authoritative whenever at least one node answered; otherwise the
/// configured fallback applies, floored at 1.
pub async fn discover_nodes(bus: &dyn ControlBus, fallback: usize) -> usize {
    let discovered = match bus
        .fanout_raw(
            subjects::NODES_DISCOVER.to_string(),
            b"{}".to_vec(),
            DISCOVERY_WINDOW,
            usize::MAX,
        )
        .await
    {
        Ok(replies) => {
            let nodes: HashSet<&str> = replies
                .iter()
                .filter_map(|r| r.node.as_deref())
                .collect();
            nodes.len()
        }
        Err(e) => {
            warn!(error = %e, "node discovery failed");
            0
        }
    };
    if discovered >= 1 {
        discovered
    } else {
        fallback.max(1)
    }
}

/// Pulls the node identity out of a raw reply body.
pub(crate) fn reply_node(payload: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(payload).ok()?;
    value
        .as_object()?
        .get("node")?
        .as_str()
        .map(str::to_string)
}

/// The production bus over a NATS connection.
pub struct NatsBus {
    client: async_nats::Client,
}

impl NatsBus {
    /// Wraps an established client.
    pub fn new(client: async_nats::Client) -> NatsBus {
        NatsBus { client }
    }

    /// Connects with capped exponential back-off for up to five minutes,
    /// then gives up so the process can fail loudly.
    pub async fn connect(url: &str) -> Result<NatsBus, ApiError> {
        let start = Instant::now();
        let mut delay = Duration::from_secs(1);
        loop {
            match async_nats::connect(url).await {
                Ok(client) => {
                    info!(url = %url, "control bus connected");
                    return Ok(NatsBus::new(client));
                }
                Err(e) if start.elapsed() + delay < CONNECT_DEADLINE => {
                    warn!(url = %url, error = %e, retry_in = ?delay, "control bus unreachable");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(30));
                }
                Err(e) => {
                    return Err(ApiError::with_message(
                        Code::ServiceUnavailable,
                        format!("control bus unreachable at {url}: {e}"),
                    ))
                }
            }
        }
    }

    /// The raw client, for sharing the connection with JetStream KV.
    pub fn client(&self) -> async_nats::Client {
        self.client.clone()
    }
}

#[async_trait]
impl ControlBus for NatsBus {
    async fn request_raw(
        &self,
        subject: String,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, ApiError> {
        let request = async_nats::Request::new()
            .payload(payload.into())
            .timeout(Some(timeout));
        let message = self
            .client
            .send_request(subject.clone(), request)
            .await
            .map_err(|e| match e.kind() {
                async_nats::RequestErrorKind::TimedOut => ApiError::with_message(
                    Code::ServerInternal,
                    format!("no reply on {subject} within {timeout:?}"),
                ),
                async_nats::RequestErrorKind::NoResponders => ApiError::with_message(
                    Code::ServiceUnavailable,
                    format!("no responders on {subject}"),
                ),
                _ => ApiError::with_message(Code::ServerInternal, e.to_string()),
            })?;
        Ok(message.payload.to_vec())
    }

    async fn fanout_raw(
        &self,
        subject: String,
        payload: Vec<u8>,
        window: Duration,
        expected: usize,
    ) -> Result<Vec<FanoutReply>, ApiError> {
        let inbox = self.client.new_inbox();
        let mut sub = self
            .client
            .subscribe(inbox.clone())
            .await
            .map_err(|e| ApiError::with_message(Code::ServerInternal, e.to_string()))?;
        self.client
            .publish_with_reply(subject.clone(), inbox, payload.into())
            .await
            .map_err(|e| ApiError::with_message(Code::ServerInternal, e.to_string()))?;
        self.client
            .flush()
            .await
            .map_err(|e| ApiError::with_message(Code::ServerInternal, e.to_string()))?;

        let deadline = Instant::now() + window;
        let mut replies = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut counted = 0usize;
        while counted < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let message = match tokio::time::timeout(remaining, sub.next()).await {
                Ok(Some(message)) => message,
                Ok(None) | Err(_) => break,
            };
            let payload = message.payload.to_vec();
            let node = reply_node(&payload);
            // Duplicates only affect the count, never the payload list.
            match &node {
                Some(id) if !seen.insert(id.clone()) => {
                    debug!(subject = %subject, node = %id, "duplicate node in fan-out");
                }
                _ => counted += 1,
            }
            replies.push(FanoutReply { node, payload });
        }
        let _ = sub.unsubscribe().await;
        Ok(replies)
    }

    async fn publish(&self, subject: String, payload: Vec<u8>) -> Result<(), ApiError> {
        self.client
            .publish(subject, payload.into())
            .await
            .map_err(|e| ApiError::with_message(Code::ServerInternal, e.to_string()))
    }

    fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Body {
        answer: i64,
    }

    #[test]
    fn discriminator_surfaces_error_payloads() {
        let err = decode_reply::<Body>(br#"{"code":"NoSuchEntity","message":"ghost"}"#)
            .unwrap_err();
        assert_eq!(err.code, Code::NoSuchEntity);
        assert_eq!(err.message, "ghost");
    }

    #[test]
    fn discriminator_defaults_the_message() {
        let err = decode_reply::<Body>(br#"{"code":"ServiceUnavailable"}"#).unwrap_err();
        assert_eq!(err.code, Code::ServiceUnavailable);
        assert_eq!(err.message, Code::ServiceUnavailable.default_message());
    }

    #[test]
    fn discriminator_remaps_unknown_codes() {
        let err = decode_reply::<Body>(br#"{"code":"EbsGremlins","message":"?"}"#).unwrap_err();
        assert_eq!(err.code, Code::InternalError);
    }

    #[test]
    fn discriminator_passes_success_bodies_through() {
        let body = decode_reply::<Body>(br#"{"answer": 42, "node": "n1"}"#).unwrap();
        assert_eq!(body, Body { answer: 42 });
    }

    #[test]
    fn reply_node_reads_the_mandatory_field() {
        assert_eq!(reply_node(br#"{"node":"n1","x":1}"#), Some("n1".to_string()));
        assert_eq!(reply_node(br#"{"x":1}"#), None);
        assert_eq!(reply_node(b"not json"), None);
    }

    #[test]
    fn subjects_are_bit_exact() {
        assert_eq!(subjects::ec2_action("RunInstances"), "ec2.RunInstances");
        assert_eq!(subjects::ebs_unmount("node-2"), "ebs.node-2.unmount");
        assert_eq!(subjects::ebs_snapshot("vol-1"), "ebs.snapshot.vol-1");
        assert_eq!(subjects::NODES_DISCOVER, "hive.nodes.discover");
    }
}
