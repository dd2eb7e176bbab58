//! IAM action shapes. IAM XML keeps TitleCase element names, so these
//! shapes mostly carry no location-name hints.

use chrono::{DateTime, Utc};
use hive_codec::aws_shape;

use super::Tag;

aws_shape! {
    /// One IAM user, as rendered in responses.
    pub struct User {
        path: Option<String> => "Path",
        user_name: Option<String> => "UserName",
        user_id: Option<String> => "UserId",
        arn: Option<String> => "Arn",
        create_date: Option<DateTime<Utc>> => "CreateDate",
        tags: Vec<Tag> => "Tags",
    }
}

aws_shape! {
    /// Parameters of `CreateUser`.
    pub struct CreateUserInput {
        user_name: Option<String> => "UserName",
        path: Option<String> => "Path",
        tags: Vec<Tag> => "Tags",
    }
}

aws_shape! {
    /// Result of `CreateUser`.
    pub struct CreateUserOutput {
        user: Option<User> => "User",
    }
}

aws_shape! {
    /// Parameters of `GetUser`.
    pub struct GetUserInput {
        user_name: Option<String> => "UserName",
    }
}

aws_shape! {
    /// Result of `GetUser`.
    pub struct GetUserOutput {
        user: Option<User> => "User",
    }
}

aws_shape! {
    /// Parameters of `ListUsers`.
    pub struct ListUsersInput {
        path_prefix: Option<String> => "PathPrefix",
        marker: Option<String> => "Marker",
        max_items: Option<i64> => "MaxItems",
    }
}

aws_shape! {
    /// Result of `ListUsers`.
    pub struct ListUsersOutput {
        users: Vec<User> => "Users",
        is_truncated: bool => "IsTruncated",
    }
}

aws_shape! {
    /// Parameters of `DeleteUser`.
    pub struct DeleteUserInput {
        user_name: Option<String> => "UserName",
    }
}

aws_shape! {
    /// The empty result IAM mutations render.
    pub struct EmptyOutput {
    }
}

aws_shape! {
    /// Parameters of `CreateAccessKey`.
    pub struct CreateAccessKeyInput {
        user_name: Option<String> => "UserName",
    }
}

aws_shape! {
    /// One access key with its secret; only `CreateAccessKey` ever fills
    /// `SecretAccessKey`.
    pub struct AccessKey {
        user_name: Option<String> => "UserName",
        access_key_id: Option<String> => "AccessKeyId",
        status: Option<String> => "Status",
        secret_access_key: Option<String> => "SecretAccessKey",
        create_date: Option<DateTime<Utc>> => "CreateDate",
    }
}

aws_shape! {
    /// Result of `CreateAccessKey`.
    pub struct CreateAccessKeyOutput {
        access_key: Option<AccessKey> => "AccessKey",
    }
}

aws_shape! {
    /// Parameters of `ListAccessKeys`.
    pub struct ListAccessKeysInput {
        user_name: Option<String> => "UserName",
        marker: Option<String> => "Marker",
        max_items: Option<i64> => "MaxItems",
    }
}

aws_shape! {
    /// One access key without its secret.
    pub struct AccessKeyMetadata {
        user_name: Option<String> => "UserName",
        access_key_id: Option<String> => "AccessKeyId",
        status: Option<String> => "Status",
        create_date: Option<DateTime<Utc>> => "CreateDate",
    }
}

aws_shape! {
    /// Result of `ListAccessKeys`.
    pub struct ListAccessKeysOutput {
        access_key_metadata: Vec<AccessKeyMetadata> => "AccessKeyMetadata",
        is_truncated: bool => "IsTruncated",
    }
}

aws_shape! {
    /// Parameters of `UpdateAccessKey`.
    pub struct UpdateAccessKeyInput {
        user_name: Option<String> => "UserName",
        access_key_id: Option<String> => "AccessKeyId",
        status: Option<String> => "Status",
    }
}

aws_shape! {
    /// Parameters of `DeleteAccessKey`.
    pub struct DeleteAccessKeyInput {
        user_name: Option<String> => "UserName",
        access_key_id: Option<String> => "AccessKeyId",
    }
}

aws_shape! {
    /// Parameters of `CreatePolicy`.
    pub struct CreatePolicyInput {
        policy_name: Option<String> => "PolicyName",
        path: Option<String> => "Path",
        policy_document: Option<String> => "PolicyDocument",
        description: Option<String> => "Description",
    }
}

aws_shape! {
    /// One managed policy, as rendered in responses.
    pub struct Policy {
        policy_name: Option<String> => "PolicyName",
        policy_id: Option<String> => "PolicyId",
        arn: Option<String> => "Arn",
        path: Option<String> => "Path",
        default_version_id: Option<String> => "DefaultVersionId",
        attachment_count: Option<i64> => "AttachmentCount",
        create_date: Option<DateTime<Utc>> => "CreateDate",
        update_date: Option<DateTime<Utc>> => "UpdateDate",
    }
}

aws_shape! {
    /// Result of `CreatePolicy`.
    pub struct CreatePolicyOutput {
        policy: Option<Policy> => "Policy",
    }
}

aws_shape! {
    /// Parameters of `GetPolicy`.
    pub struct GetPolicyInput {
        policy_arn: Option<String> => "PolicyArn",
    }
}

aws_shape! {
    /// Result of `GetPolicy`.
    pub struct GetPolicyOutput {
        policy: Option<Policy> => "Policy",
    }
}

aws_shape! {
    /// Parameters of `ListPolicies`.
    pub struct ListPoliciesInput {
        scope: Option<String> => "Scope",
        path_prefix: Option<String> => "PathPrefix",
        marker: Option<String> => "Marker",
        max_items: Option<i64> => "MaxItems",
    }
}

aws_shape! {
    /// Result of `ListPolicies`.
    pub struct ListPoliciesOutput {
        policies: Vec<Policy> => "Policies",
        is_truncated: bool => "IsTruncated",
    }
}

aws_shape! {
    /// Parameters of `DeletePolicy`.
    pub struct DeletePolicyInput {
        policy_arn: Option<String> => "PolicyArn",
    }
}

aws_shape! {
    /// Parameters of `GetPolicyVersion`.
    pub struct GetPolicyVersionInput {
        policy_arn: Option<String> => "PolicyArn",
        version_id: Option<String> => "VersionId",
    }
}

aws_shape! {
    /// One stored policy version.
    pub struct PolicyVersion {
        document: Option<String> => "Document",
        version_id: Option<String> => "VersionId",
        is_default_version: bool => "IsDefaultVersion",
        create_date: Option<DateTime<Utc>> => "CreateDate",
    }
}

aws_shape! {
    /// Result of `GetPolicyVersion`.
    pub struct GetPolicyVersionOutput {
        policy_version: Option<PolicyVersion> => "PolicyVersion",
    }
}

aws_shape! {
    /// Parameters of `AttachUserPolicy` / `DetachUserPolicy`.
    pub struct UserPolicyInput {
        user_name: Option<String> => "UserName",
        policy_arn: Option<String> => "PolicyArn",
    }
}

aws_shape! {
    /// Parameters of `ListAttachedUserPolicies`.
    pub struct ListAttachedUserPoliciesInput {
        user_name: Option<String> => "UserName",
        path_prefix: Option<String> => "PathPrefix",
        marker: Option<String> => "Marker",
        max_items: Option<i64> => "MaxItems",
    }
}

aws_shape! {
    /// One attachment as rendered by `ListAttachedUserPolicies`.
    pub struct AttachedPolicy {
        policy_name: Option<String> => "PolicyName",
        policy_arn: Option<String> => "PolicyArn",
    }
}

aws_shape! {
    /// Result of `ListAttachedUserPolicies`.
    pub struct ListAttachedUserPoliciesOutput {
        attached_policies: Vec<AttachedPolicy> => "AttachedPolicies",
        is_truncated: bool => "IsTruncated",
    }
}
