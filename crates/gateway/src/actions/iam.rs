//! IAM handlers. These run against the IAM store directly; the store's
//! KV rides the control-bus connection, which is why IAM actions sit
//! behind the dispatcher's bus gate like everything else.

use std::sync::Arc;

use hive_types::api::iam::*;
use hive_types::api::Tag;
use hive_types::error::{ApiError, Code};
use hive_types::iam::{AccessKeyRecord, KeyStatus, PolicyRecord, TagPair, UserRecord};

use super::required;
use crate::auth::AuthContext;
use crate::dispatch::ServiceDispatcher;
use crate::AppState;

/// Wires up the IAM registry.
pub(crate) fn register(d: &mut ServiceDispatcher) {
    d.register("CreateUser", create_user);
    d.register("GetUser", get_user);
    d.register("ListUsers", list_users);
    d.register("DeleteUser", delete_user);
    d.register("CreateAccessKey", create_access_key);
    d.register("ListAccessKeys", list_access_keys);
    d.register("UpdateAccessKey", update_access_key);
    d.register("DeleteAccessKey", delete_access_key);
    d.register("CreatePolicy", create_policy);
    d.register("GetPolicy", get_policy);
    d.register("ListPolicies", list_policies);
    d.register("DeletePolicy", delete_policy);
    d.register("GetPolicyVersion", get_policy_version);
    d.register("AttachUserPolicy", attach_user_policy);
    d.register("DetachUserPolicy", detach_user_policy);
    d.register("ListAttachedUserPolicies", list_attached_user_policies);
}

fn user_shape(record: &UserRecord) -> User {
    User {
        path: Some(record.path.clone()),
        user_name: Some(record.user_name.clone()),
        user_id: Some(record.user_id.clone()),
        arn: Some(record.arn.clone()),
        create_date: Some(record.created_at),
        tags: record
            .tags
            .iter()
            .map(|t| Tag {
                key: Some(t.key.clone()),
                value: Some(t.value.clone()),
            })
            .collect(),
    }
}

fn policy_shape(record: &PolicyRecord) -> Policy {
    Policy {
        policy_name: Some(record.policy_name.clone()),
        policy_id: Some(record.policy_id.clone()),
        arn: Some(record.arn.clone()),
        path: Some(record.path.clone()),
        default_version_id: Some(record.default_version_id.clone()),
        attachment_count: None,
        create_date: Some(record.created_at),
        update_date: Some(record.updated_at),
    }
}

fn key_metadata(record: &AccessKeyRecord) -> AccessKeyMetadata {
    AccessKeyMetadata {
        user_name: Some(record.user_name.clone()),
        access_key_id: Some(record.access_key_id.clone()),
        status: Some(record.status.as_str().to_string()),
        create_date: Some(record.created_at),
    }
}

async fn create_user(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: CreateUserInput,
) -> Result<CreateUserOutput, ApiError> {
    let user_name = required(input.user_name, "UserName")?;
    let tags: Vec<TagPair> = input
        .tags
        .into_iter()
        .map(|t| TagPair {
            key: t.key.unwrap_or_default(),
            value: t.value.unwrap_or_default(),
        })
        .collect();
    let record = state
        .iam
        .create_user(&ctx.account_id, &user_name, input.path.as_deref(), tags)
        .await?;
    Ok(CreateUserOutput {
        user: Some(user_shape(&record)),
    })
}

async fn get_user(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: GetUserInput,
) -> Result<GetUserOutput, ApiError> {
    // Absent UserName means the calling identity, like AWS.
    let user_name = input.user_name.unwrap_or_else(|| ctx.identity.clone());
    let record = state.iam.get_user(&ctx.account_id, &user_name).await?;
    Ok(GetUserOutput {
        user: Some(user_shape(&record)),
    })
}

async fn list_users(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: ListUsersInput,
) -> Result<ListUsersOutput, ApiError> {
    let mut users = state.iam.list_users(&ctx.account_id).await?;
    if let Some(prefix) = input.path_prefix.as_deref() {
        users.retain(|u| u.path.starts_with(prefix));
    }
    Ok(ListUsersOutput {
        users: users.iter().map(user_shape).collect(),
        is_truncated: false,
    })
}

async fn delete_user(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: DeleteUserInput,
) -> Result<EmptyOutput, ApiError> {
    let user_name = required(input.user_name, "UserName")?;
    state.iam.delete_user(&ctx.account_id, &user_name).await?;
    Ok(EmptyOutput {})
}

async fn create_access_key(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: CreateAccessKeyInput,
) -> Result<CreateAccessKeyOutput, ApiError> {
    let user_name = input.user_name.unwrap_or_else(|| ctx.identity.clone());
    let (record, secret) = state
        .iam
        .create_access_key(&ctx.account_id, &user_name)
        .await?;
    // The only place the plaintext secret ever leaves the process.
    Ok(CreateAccessKeyOutput {
        access_key: Some(AccessKey {
            user_name: Some(record.user_name.clone()),
            access_key_id: Some(record.access_key_id.clone()),
            status: Some(record.status.as_str().to_string()),
            secret_access_key: Some(secret),
            create_date: Some(record.created_at),
        }),
    })
}

async fn list_access_keys(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: ListAccessKeysInput,
) -> Result<ListAccessKeysOutput, ApiError> {
    let user_name = input.user_name.unwrap_or_else(|| ctx.identity.clone());
    let records = state
        .iam
        .list_access_keys(&ctx.account_id, &user_name)
        .await?;
    Ok(ListAccessKeysOutput {
        access_key_metadata: records.iter().map(key_metadata).collect(),
        is_truncated: false,
    })
}

async fn update_access_key(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: UpdateAccessKeyInput,
) -> Result<EmptyOutput, ApiError> {
    let access_key_id = required(input.access_key_id, "AccessKeyId")?;
    let status_raw = required(input.status, "Status")?;
    let status = KeyStatus::parse(&status_raw).ok_or_else(|| {
        ApiError::with_message(
            Code::InvalidParameter,
            format!("status must be Active or Inactive, got {status_raw:?}"),
        )
    })?;
    state.iam.update_access_key(&access_key_id, status).await?;
    Ok(EmptyOutput {})
}

async fn delete_access_key(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: DeleteAccessKeyInput,
) -> Result<EmptyOutput, ApiError> {
    let access_key_id = required(input.access_key_id, "AccessKeyId")?;
    let user_name = input.user_name.unwrap_or_else(|| ctx.identity.clone());
    state
        .iam
        .delete_access_key(&ctx.account_id, &user_name, &access_key_id)
        .await?;
    Ok(EmptyOutput {})
}

async fn create_policy(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: CreatePolicyInput,
) -> Result<CreatePolicyOutput, ApiError> {
    let policy_name = required(input.policy_name, "PolicyName")?;
    let document = required(input.policy_document, "PolicyDocument")?;
    let record = state
        .iam
        .create_policy(&ctx.account_id, &policy_name, input.path.as_deref(), &document)
        .await?;
    Ok(CreatePolicyOutput {
        policy: Some(policy_shape(&record)),
    })
}

async fn get_policy(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: GetPolicyInput,
) -> Result<GetPolicyOutput, ApiError> {
    let arn = required(input.policy_arn, "PolicyArn")?;
    let record = state.iam.get_policy_by_arn(&arn).await?;
    Ok(GetPolicyOutput {
        policy: Some(policy_shape(&record)),
    })
}

async fn list_policies(
    state: Arc<AppState>,
    ctx: AuthContext,
    _input: ListPoliciesInput,
) -> Result<ListPoliciesOutput, ApiError> {
    let records = state.iam.list_policies(&ctx.account_id).await?;
    Ok(ListPoliciesOutput {
        policies: records.iter().map(policy_shape).collect(),
        is_truncated: false,
    })
}

async fn delete_policy(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: DeletePolicyInput,
) -> Result<EmptyOutput, ApiError> {
    let arn = required(input.policy_arn, "PolicyArn")?;
    let record = state.iam.get_policy_by_arn(&arn).await?;
    state
        .iam
        .delete_policy(&record.account_id, &record.policy_name)
        .await?;
    Ok(EmptyOutput {})
}

async fn get_policy_version(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: GetPolicyVersionInput,
) -> Result<GetPolicyVersionOutput, ApiError> {
    let arn = required(input.policy_arn, "PolicyArn")?;
    let version_id = required(input.version_id, "VersionId")?;
    let record = state.iam.get_policy_by_arn(&arn).await?;
    // Only the default version exists in this revision.
    if version_id != record.default_version_id {
        return Err(ApiError::with_message(
            Code::NoSuchEntity,
            format!("policy version {version_id}"),
        ));
    }
    Ok(GetPolicyVersionOutput {
        policy_version: Some(PolicyVersion {
            document: Some(record.document.clone()),
            version_id: Some(record.default_version_id.clone()),
            is_default_version: true,
            create_date: Some(record.created_at),
        }),
    })
}

async fn attach_user_policy(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: UserPolicyInput,
) -> Result<EmptyOutput, ApiError> {
    let user_name = required(input.user_name, "UserName")?;
    let arn = required(input.policy_arn, "PolicyArn")?;
    state
        .iam
        .attach_user_policy(&ctx.account_id, &user_name, &arn)
        .await?;
    Ok(EmptyOutput {})
}

async fn detach_user_policy(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: UserPolicyInput,
) -> Result<EmptyOutput, ApiError> {
    let user_name = required(input.user_name, "UserName")?;
    let arn = required(input.policy_arn, "PolicyArn")?;
    state
        .iam
        .detach_user_policy(&ctx.account_id, &user_name, &arn)
        .await?;
    Ok(EmptyOutput {})
}

async fn list_attached_user_policies(
    state: Arc<AppState>,
    ctx: AuthContext,
    input: ListAttachedUserPoliciesInput,
) -> Result<ListAttachedUserPoliciesOutput, ApiError> {
    let user_name = required(input.user_name, "UserName")?;
    let attached = state
        .iam
        .list_attached_user_policies(&ctx.account_id, &user_name)
        .await?;
    Ok(ListAttachedUserPoliciesOutput {
        attached_policies: attached
            .into_iter()
            .map(|(name, arn)| AttachedPolicy {
                policy_name: Some(name),
                policy_arn: Some(arn),
            })
            .collect(),
        is_truncated: false,
    })
}
