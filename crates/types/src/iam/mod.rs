//! IAM entity records as they are persisted in the KV buckets. These are
//! the store's own shapes; the wire shapes under [`crate::api::iam`] are
//! derived from them per action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The policy-document model and the access decision type.
pub mod policy;

/// The well-known Global account, auto-created on first start.
pub const GLOBAL_ACCOUNT_ID: &str = "000000000000";

/// Stable-ID prefix for IAM users.
pub const USER_ID_PREFIX: &str = "AIDA";
/// Stable-ID prefix for access keys.
pub const ACCESS_KEY_ID_PREFIX: &str = "AKIA";
/// Stable-ID prefix for managed policies.
pub const POLICY_ID_PREFIX: &str = "ANPA";

/// The maximum number of access keys one user may hold.
pub const MAX_ACCESS_KEYS_PER_USER: usize = 2;

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    /// The account accepts requests.
    #[default]
    Active,
    /// The account is suspended; its principals cannot authenticate.
    Suspended,
}

/// A tenant account. The ID is an opaque 12-digit string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// 12-digit account identifier.
    pub account_id: String,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One key/value tag on an IAM entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPair {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// An IAM user, keyed by `(account_id, user_name)`.
///
/// Invariants: the `(account, name)` pair is unique, every entry of
/// `access_keys` resolves in the keys bucket, and every ARN in
/// `attached_policies` resolves in the policies bucket. The ARN and user
/// ID are immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Owning account.
    pub account_id: String,
    /// User name, unique within the account.
    pub user_name: String,
    /// Stable ID, `AIDA…`.
    pub user_id: String,
    /// `arn:aws:iam::<account>:user<path><name>`.
    pub arn: String,
    /// Path component, `/` by default.
    pub path: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// IDs of the access keys this user owns.
    #[serde(default)]
    pub access_keys: Vec<String>,
    /// ARNs of the managed policies attached to this user.
    #[serde(default)]
    pub attached_policies: Vec<String>,
    /// Entity tags.
    #[serde(default)]
    pub tags: Vec<TagPair>,
}

impl UserRecord {
    /// Builds the canonical user ARN.
    pub fn arn_for(account_id: &str, path: &str, user_name: &str) -> String {
        format!("arn:aws:iam::{account_id}:user{path}{user_name}")
    }
}

/// Access-key lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStatus {
    /// The key may sign requests.
    #[default]
    Active,
    /// The key is disabled.
    Inactive,
}

impl KeyStatus {
    /// Wire spelling, as it appears in query inputs and XML outputs.
    pub const fn as_str(self) -> &'static str {
        match self {
            KeyStatus::Active => "Active",
            KeyStatus::Inactive => "Inactive",
        }
    }

    /// Parses the wire spelling.
    pub fn parse(s: &str) -> Option<KeyStatus> {
        match s {
            "Active" => Some(KeyStatus::Active),
            "Inactive" => Some(KeyStatus::Inactive),
            _ => None,
        }
    }
}

/// An access key. Globally keyed by its `AKIA…` ID; the secret is stored
/// encrypted as base64(nonce ‖ ciphertext ‖ tag) under the master key and
/// the plaintext is returned exactly once, at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyRecord {
    /// Globally unique ID, `AKIA…`.
    pub access_key_id: String,
    /// Owning account.
    pub account_id: String,
    /// Owning user.
    pub user_name: String,
    /// Lifecycle status.
    pub status: KeyStatus,
    /// AES-256-GCM ciphertext of the 40-character secret.
    pub encrypted_secret: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A managed policy, keyed by `(account_id, policy_name)`. The document is
/// kept as the literal JSON the caller supplied; only `v1` exists as the
/// default version in this revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Owning account.
    pub account_id: String,
    /// Policy name, unique within the account.
    pub policy_name: String,
    /// Stable ID, `ANPA…`.
    pub policy_id: String,
    /// `arn:aws:iam::<account>:policy<path><name>`.
    pub arn: String,
    /// Path component.
    pub path: String,
    /// Always `"v1"` in this revision.
    pub default_version_id: String,
    /// The literal policy-document JSON.
    pub document: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl PolicyRecord {
    /// Builds the canonical policy ARN.
    pub fn arn_for(account_id: &str, path: &str, policy_name: &str) -> String {
        format!("arn:aws:iam::{account_id}:policy{path}{policy_name}")
    }
}

/// The attachment fan-in for one policy: which users hold it. Keyed by
/// `<account>/<policy_name>` and consulted on policy deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// The policy's ARN.
    pub policy_arn: String,
    /// User names holding the attachment.
    #[serde(default)]
    pub users: Vec<String>,
}

/// The one-shot bootstrap file consumed on first start:
/// `<base>/config/bootstrap.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapRecord {
    /// The root user's access-key ID.
    pub access_key_id: String,
    /// The root secret, already encrypted under the master key.
    pub encrypted_secret: String,
    /// The account the root user is created in.
    pub account_id: String,
}
