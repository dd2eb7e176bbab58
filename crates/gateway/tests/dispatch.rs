//! Dispatcher-level scenarios against the in-memory KV and a scripted
//! control bus.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use hive_bus::{ControlBus, FanoutReply};
use hive_codec::query::QueryMap;
use hive_gateway::auth::AuthContext;
use hive_gateway::AppState;
use hive_iam::crypto::MasterKey;
use hive_iam::kv::MemoryKv;
use hive_iam::IamStore;
use hive_types::api::{qualified_action, ServiceTag};
use hive_types::config::GatewayConfig;
use hive_types::error::{ApiError, Code};

/// A bus whose replies are scripted per subject.
#[derive(Default)]
struct MockBus {
    unary: HashMap<String, Vec<u8>>,
    fanout: HashMap<String, Vec<Vec<u8>>>,
    connected: bool,
}

impl MockBus {
    fn connected() -> MockBus {
        MockBus {
            connected: true,
            ..Default::default()
        }
    }

    fn unary(mut self, subject: &str, reply: &str) -> MockBus {
        self.unary.insert(subject.to_string(), reply.as_bytes().to_vec());
        self
    }

    fn fanout(mut self, subject: &str, replies: &[&str]) -> MockBus {
        self.fanout.insert(
            subject.to_string(),
            replies.iter().map(|r| r.as_bytes().to_vec()).collect(),
        );
        self
    }
}

fn node_of(payload: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(payload)
        .ok()?
        .get("node")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ControlBus for MockBus {
    async fn request_raw(
        &self,
        subject: String,
        _payload: Vec<u8>,
        _timeout: Duration,
    ) -> Result<Vec<u8>, ApiError> {
        self.unary.get(&subject).cloned().ok_or_else(|| {
            ApiError::with_message(Code::ServiceUnavailable, format!("no responders on {subject}"))
        })
    }

    async fn fanout_raw(
        &self,
        subject: String,
        _payload: Vec<u8>,
        _window: Duration,
        _expected: usize,
    ) -> Result<Vec<FanoutReply>, ApiError> {
        Ok(self
            .fanout
            .get(&subject)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|payload| FanoutReply {
                node: node_of(&payload),
                payload,
            })
            .collect())
    }

    async fn publish(&self, _subject: String, _payload: Vec<u8>) -> Result<(), ApiError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

fn state_with(bus: Option<MockBus>) -> Arc<AppState> {
    let iam = Arc::new(IamStore::new(
        Arc::new(MemoryKv::new()),
        MasterKey::generate(),
    ));
    Arc::new(AppState::new(
        iam,
        bus.map(|b| Arc::new(b) as Arc<dyn ControlBus>),
        GatewayConfig::default(),
    ))
}

fn ctx(identity: &str, service: &str) -> AuthContext {
    AuthContext {
        identity: identity.to_string(),
        account_id: "000000000000".to_string(),
        service: service.to_string(),
        region: "ap-southeast-2".to_string(),
        access_key_id: "AKIATESTTESTTEST0000".to_string(),
        request_id: "test-req".to_string(),
    }
}

async fn call(state: &Arc<AppState>, ctx: AuthContext, body: &str) -> (u16, String) {
    let response = state
        .dispatcher
        .dispatch(state.clone(), ctx, QueryMap::parse(body))
        .await;
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn list_users_renders_both_names_in_order() {
    let state = state_with(Some(MockBus::connected()));
    state
        .iam
        .create_user("000000000000", "alice", None, Vec::new())
        .await
        .unwrap();
    state
        .iam
        .create_user("000000000000", "bob", None, Vec::new())
        .await
        .unwrap();

    let (status, body) = call(&state, ctx("root", "iam"), "Action=ListUsers").await;
    assert_eq!(status, 200);
    assert!(body.contains("<ListUsersResult>"));
    let alice = body.find("<UserName>alice</UserName>").unwrap();
    let bob = body.find("<UserName>bob</UserName>").unwrap();
    assert!(alice < bob);
}

#[tokio::test]
async fn describe_instances_aggregates_nodes_and_stopped_set() {
    let bus = MockBus::connected()
        .fanout(
            "hive.nodes.discover",
            &[r#"{"node":"n1"}"#, r#"{"node":"n2"}"#, r#"{"node":"n3"}"#],
        )
        .fanout(
            "ec2.DescribeInstances",
            &[
                r#"{"node":"n1","Reservations":[{"ReservationId":"r-a","Instances":[{"InstanceId":"i-A"}]}]}"#,
                r#"{"node":"n2","Reservations":[{"ReservationId":"r-b","Instances":[{"InstanceId":"i-B"}]}]}"#,
                r#"{"node":"n3","code":"ServiceUnavailable","message":"maintenance"}"#,
            ],
        )
        .unary(
            "ec2.DescribeStoppedInstances",
            r#"{"Reservations":[{"ReservationId":"r-c","Instances":[{"InstanceId":"i-C"}]}]}"#,
        );
    let state = state_with(Some(bus));

    let (status, body) = call(&state, ctx("root", "ec2"), "Action=DescribeInstances").await;
    assert_eq!(status, 200);
    for instance in ["i-A", "i-B", "i-C"] {
        assert!(body.contains(&format!("<instanceId>{instance}</instanceId>")), "{body}");
    }
}

#[tokio::test]
async fn policy_denies_terminate_but_allows_describe() {
    let bus = MockBus::connected()
        .fanout("hive.nodes.discover", &[r#"{"node":"n1"}"#])
        .fanout(
            "ec2.DescribeInstances",
            &[r#"{"node":"n1","Reservations":[]}"#],
        )
        .unary("ec2.DescribeStoppedInstances", r#"{"Reservations":[]}"#);
    let state = state_with(Some(bus));
    let acct = "000000000000";
    state.iam.create_user(acct, "alice", None, Vec::new()).await.unwrap();
    let allow = state
        .iam
        .create_policy(
            acct,
            "allow-ec2",
            None,
            r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":"ec2:*","Resource":"*"}]}"#,
        )
        .await
        .unwrap();
    let deny = state
        .iam
        .create_policy(
            acct,
            "deny-terminate",
            None,
            r#"{"Version":"2012-10-17","Statement":[{"Effect":"Deny","Action":"ec2:TerminateInstances","Resource":"*"}]}"#,
        )
        .await
        .unwrap();
    state.iam.attach_user_policy(acct, "alice", &allow.arn).await.unwrap();
    state.iam.attach_user_policy(acct, "alice", &deny.arn).await.unwrap();

    let (status, body) = call(
        &state,
        ctx("alice", "ec2"),
        "Action=TerminateInstances&InstanceId.1=i-1",
    )
    .await;
    assert_eq!(status, 403);
    assert!(body.contains("<Code>AccessDenied</Code>"));

    let (status, _) = call(&state, ctx("alice", "ec2"), "Action=DescribeInstances").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn ghost_user_gets_the_iam_error_envelope() {
    let state = state_with(Some(MockBus::connected()));
    let (status, body) = call(
        &state,
        ctx("root", "iam"),
        "Action=GetUser&UserName=ghost",
    )
    .await;
    assert_eq!(status, 404);
    assert!(body.contains("<ErrorResponse><Error><Type>Sender</Type><Code>NoSuchEntity</Code>"));
}

#[tokio::test]
async fn unknown_action_and_service_codes() {
    let state = state_with(Some(MockBus::connected()));
    let (status, body) = call(&state, ctx("root", "ec2"), "Action=LaunchRockets").await;
    assert_eq!(status, 400);
    assert!(body.contains("<Code>InvalidAction</Code>"));

    let (status, body) = call(&state, ctx("root", "s3"), "Action=ListBuckets").await;
    assert_eq!(status, 400);
    assert!(body.contains("<Code>UnsupportedOperation</Code>"));

    let (status, body) = call(&state, ctx("root", "ec2"), "Dummy=1").await;
    assert_eq!(status, 400);
    assert!(body.contains("<Code>MissingParameter</Code>"));
}

#[tokio::test]
async fn local_actions_work_without_a_bus_but_others_do_not() {
    let state = state_with(None);

    let (status, body) = call(&state, ctx("root", "ec2"), "Action=DescribeRegions").await;
    assert_eq!(status, 200);
    assert!(body.contains("<regionName>ap-southeast-2</regionName>"));

    let (status, body) = call(&state, ctx("root", "ec2"), "Action=DescribeInstances").await;
    assert_eq!(status, 500);
    assert!(body.contains("<Code>ServerInternal</Code>"));
}

#[tokio::test]
async fn run_instances_round_trips_the_daemon_reply() {
    let bus = MockBus::connected().unary(
        "ec2.RunInstances",
        r#"{"ReservationId":"r-1","OwnerId":"000000000000",
            "Instances":[{"InstanceId":"i-9","ImageId":"ami-0abcdef1234567890",
                          "State":{"Code":0,"Name":"pending"}}]}"#,
    );
    let state = state_with(Some(bus));
    let (status, body) = call(
        &state,
        ctx("root", "ec2"),
        "Action=RunInstances&ImageId=ami-0abcdef1234567890&MinCount=1&MaxCount=1",
    )
    .await;
    assert_eq!(status, 200);
    assert!(body.contains("<RunInstancesResponse"));
    assert!(body.contains("<instanceId>i-9</instanceId>"));
    assert!(body.contains("<name>pending</name>"));
}

#[tokio::test]
async fn detach_volume_routes_to_the_resident_node() {
    let bus = MockBus::connected()
        .unary(
            "ec2.DescribeVolumes",
            r#"{"Volumes":[{"VolumeId":"vol-1","Node":"node-2","State":"in-use"}]}"#,
        )
        .unary(
            "ebs.node-2.unmount",
            r#"{"VolumeId":"vol-1","InstanceId":"i-1","State":"detaching"}"#,
        );
    let state = state_with(Some(bus));
    let (status, body) = call(
        &state,
        ctx("root", "ec2"),
        "Action=DetachVolume&VolumeId=vol-1",
    )
    .await;
    assert_eq!(status, 200);
    assert!(body.contains("<status>detaching</status>"), "{body}");
}

#[tokio::test]
async fn daemon_error_payloads_surface_with_their_code() {
    let bus = MockBus::connected().unary(
        "ec2.RunInstances",
        r#"{"code":"Throttling","message":"slow down"}"#,
    );
    let state = state_with(Some(bus));
    let (status, body) = call(
        &state,
        ctx("root", "ec2"),
        "Action=RunInstances&ImageId=ami-1",
    )
    .await;
    assert_eq!(status, 429);
    assert!(body.contains("<Code>Throttling</Code>"));
    assert!(body.contains("slow down"));
}

#[test]
fn every_registered_action_forms_its_qualified_name() {
    let state = state_with(None);
    for (tag, service) in [
        (ServiceTag::Ec2, "ec2"),
        (ServiceTag::Iam, "iam"),
        (ServiceTag::Account, "account"),
    ] {
        for action in state.dispatcher.sub(tag).action_names() {
            assert_eq!(
                qualified_action(tag, action),
                format!("{service}:{action}")
            );
        }
    }
}
