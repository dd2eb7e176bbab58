//! The IAM store: CRUD over the five KV buckets, with conditional creates
//! where concurrent multi-node start-up demands them and explicit
//! compensation on the multi-write paths.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use hive_types::error::{ApiError, Code};
use hive_types::iam::policy::PolicyDocument;
use hive_types::iam::{
    AccessKeyRecord, AccountRecord, AccountStatus, AttachmentRecord, KeyStatus, PolicyRecord,
    TagPair, UserRecord, ACCESS_KEY_ID_PREFIX, GLOBAL_ACCOUNT_ID, MAX_ACCESS_KEYS_PER_USER,
    POLICY_ID_PREFIX, USER_ID_PREFIX,
};

use crate::crypto::{self, MasterKey};
use crate::kv::{KeyValue, KvError};

/// Bucket names.
pub const BUCKET_ACCOUNTS: &str = "accounts";
/// Users bucket, keyed `<account>/<user>`.
pub const BUCKET_USERS: &str = "users";
/// Access-keys bucket, keyed globally by key ID.
pub const BUCKET_ACCESS_KEYS: &str = "access_keys";
/// Policies bucket, keyed `<account>/<policy>`.
pub const BUCKET_POLICIES: &str = "policies";
/// Attachment fan-ins, keyed `<account>/<policy>`.
pub const BUCKET_ATTACHMENTS: &str = "attachments";

fn backend_err(e: KvError) -> ApiError {
    ApiError::with_message(Code::InternalError, e.to_string())
}

/// The IAM store. Owns every IAM entity; everything else in the process
/// reads through it.
pub struct IamStore {
    kv: Arc<dyn KeyValue>,
    master_key: MasterKey,
}

impl IamStore {
    /// Builds a store over the given mapping and master key.
    pub fn new(kv: Arc<dyn KeyValue>, master_key: MasterKey) -> IamStore {
        IamStore { kv, master_key }
    }

    /// The master key, for the SigV4 verifier's secret decryption.
    pub fn master_key(&self) -> &MasterKey {
        &self.master_key
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<T>, ApiError> {
        match self.kv.get(bucket, key).await.map_err(backend_err)? {
            None => Ok(None),
            Some(raw) => serde_json::from_slice(&raw).map(Some).map_err(|e| {
                ApiError::with_message(
                    Code::InternalError,
                    format!("corrupt record {bucket}/{key}: {e}"),
                )
            }),
        }
    }

    async fn put_json<T: Serialize>(
        &self,
        bucket: &str,
        key: &str,
        value: &T,
    ) -> Result<(), ApiError> {
        let raw = serde_json::to_vec(value)
            .map_err(|e| ApiError::with_message(Code::InternalError, e.to_string()))?;
        self.kv.put(bucket, key, raw).await.map_err(backend_err)
    }

    async fn create_json<T: Serialize>(
        &self,
        bucket: &str,
        key: &str,
        value: &T,
    ) -> Result<(), KvError> {
        let raw = serde_json::to_vec(value).map_err(|e| KvError::Backend(e.to_string()))?;
        self.kv.create(bucket, key, raw).await
    }

    // --- Accounts ---

    /// Creates the well-known Global account if missing. Idempotent.
    pub async fn ensure_global_account(&self) -> Result<(), ApiError> {
        let record = AccountRecord {
            account_id: GLOBAL_ACCOUNT_ID.to_string(),
            name: "Global".to_string(),
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };
        match self
            .create_json(BUCKET_ACCOUNTS, GLOBAL_ACCOUNT_ID, &record)
            .await
        {
            Ok(()) | Err(KvError::AlreadyExists) => Ok(()),
            Err(e) => Err(backend_err(e)),
        }
    }

    /// Allocates the next sequential 12-digit ID and creates the account.
    pub async fn create_account(&self, name: &str) -> Result<AccountRecord, ApiError> {
        // A lost conditional create means another node took the ID;
        // re-scan and try the successor.
        for _ in 0..8 {
            let keys = self
                .kv
                .keys(BUCKET_ACCOUNTS)
                .await
                .map_err(backend_err)?;
            let next = keys
                .iter()
                .filter_map(|k| k.parse::<u64>().ok())
                .max()
                .unwrap_or(0)
                + 1;
            let record = AccountRecord {
                account_id: format!("{next:012}"),
                name: name.to_string(),
                status: AccountStatus::Active,
                created_at: Utc::now(),
            };
            match self
                .create_json(BUCKET_ACCOUNTS, &record.account_id, &record)
                .await
            {
                Ok(()) => return Ok(record),
                Err(KvError::AlreadyExists) => continue,
                Err(e) => return Err(backend_err(e)),
            }
        }
        Err(ApiError::with_message(
            Code::InternalError,
            "could not allocate an account id",
        ))
    }

    /// Reads one account.
    pub async fn get_account(&self, account_id: &str) -> Result<AccountRecord, ApiError> {
        self.get_json(BUCKET_ACCOUNTS, account_id)
            .await?
            .ok_or_else(|| {
                ApiError::with_message(Code::NoSuchEntity, format!("account {account_id}"))
            })
    }

    /// Lists every account.
    pub async fn list_accounts(&self) -> Result<Vec<AccountRecord>, ApiError> {
        let mut out = Vec::new();
        for key in self.kv.keys(BUCKET_ACCOUNTS).await.map_err(backend_err)? {
            if let Some(record) = self.get_json(BUCKET_ACCOUNTS, &key).await? {
                out.push(record);
            }
        }
        Ok(out)
    }

    // --- Users ---

    fn user_key(account_id: &str, user_name: &str) -> String {
        format!("{account_id}/{user_name}")
    }

    /// Creates a user. `EntityAlreadyExists` on an `(account, name)` clash.
    pub async fn create_user(
        &self,
        account_id: &str,
        user_name: &str,
        path: Option<&str>,
        tags: Vec<TagPair>,
    ) -> Result<UserRecord, ApiError> {
        let path = path.unwrap_or("/");
        let record = UserRecord {
            account_id: account_id.to_string(),
            user_name: user_name.to_string(),
            user_id: crypto::generate_id(USER_ID_PREFIX),
            arn: UserRecord::arn_for(account_id, path, user_name),
            path: path.to_string(),
            created_at: Utc::now(),
            access_keys: Vec::new(),
            attached_policies: Vec::new(),
            tags,
        };
        match self
            .create_json(BUCKET_USERS, &Self::user_key(account_id, user_name), &record)
            .await
        {
            Ok(()) => Ok(record),
            Err(KvError::AlreadyExists) => Err(ApiError::with_message(
                Code::EntityAlreadyExists,
                format!("user {user_name} already exists"),
            )),
            Err(e) => Err(backend_err(e)),
        }
    }

    /// Reads one user.
    pub async fn get_user(
        &self,
        account_id: &str,
        user_name: &str,
    ) -> Result<UserRecord, ApiError> {
        self.get_json(BUCKET_USERS, &Self::user_key(account_id, user_name))
            .await?
            .ok_or_else(|| {
                ApiError::with_message(Code::NoSuchEntity, format!("user {user_name}"))
            })
    }

    /// Lists the account's users in key order.
    pub async fn list_users(&self, account_id: &str) -> Result<Vec<UserRecord>, ApiError> {
        let prefix = format!("{account_id}/");
        let mut out = Vec::new();
        let mut keys = self.kv.keys(BUCKET_USERS).await.map_err(backend_err)?;
        keys.sort();
        for key in keys.into_iter().filter(|k| k.starts_with(&prefix)) {
            if let Some(record) = self.get_json::<UserRecord>(BUCKET_USERS, &key).await? {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Deletes a user. `DeleteConflict` while it still owns access keys.
    pub async fn delete_user(&self, account_id: &str, user_name: &str) -> Result<(), ApiError> {
        let user = self.get_user(account_id, user_name).await?;
        if !user.access_keys.is_empty() {
            return Err(ApiError::with_message(
                Code::DeleteConflict,
                format!("user {user_name} still owns access keys"),
            ));
        }
        // Best-effort: drop the user from policy fan-ins so the policy
        // side never points at a ghost.
        for arn in &user.attached_policies {
            if let Some((acct, name)) = parse_policy_arn(arn) {
                if let Err(e) = self.remove_attachment(&acct, &name, user_name).await {
                    warn!(policy = %arn, error = %e, "detach during user delete failed");
                }
            }
        }
        self.kv
            .delete(BUCKET_USERS, &Self::user_key(account_id, user_name))
            .await
            .map_err(backend_err)
    }

    /// True iff the users bucket has no keys; drives first-start bootstrap.
    pub async fn is_empty(&self) -> Result<bool, ApiError> {
        Ok(self.kv.keys(BUCKET_USERS).await.map_err(backend_err)?.is_empty())
    }

    // --- Access keys ---

    /// Creates an access key for a user, returning the record and the
    /// plaintext secret. The plaintext is never obtainable again.
    pub async fn create_access_key(
        &self,
        account_id: &str,
        user_name: &str,
    ) -> Result<(AccessKeyRecord, String), ApiError> {
        let mut user = self.get_user(account_id, user_name).await?;
        if user.access_keys.len() >= MAX_ACCESS_KEYS_PER_USER {
            return Err(ApiError::with_message(
                Code::LimitExceeded,
                format!("user {user_name} already holds {MAX_ACCESS_KEYS_PER_USER} access keys"),
            ));
        }

        let secret = crypto::generate_secret();
        let record = AccessKeyRecord {
            access_key_id: crypto::generate_id(ACCESS_KEY_ID_PREFIX),
            account_id: account_id.to_string(),
            user_name: user_name.to_string(),
            status: KeyStatus::Active,
            encrypted_secret: crypto::encrypt_secret(&self.master_key, &secret)?,
            created_at: Utc::now(),
        };

        match self
            .create_json(BUCKET_ACCESS_KEYS, &record.access_key_id, &record)
            .await
        {
            Ok(()) => {}
            Err(e) => return Err(backend_err(e)),
        }

        user.access_keys.push(record.access_key_id.clone());
        let user_key = Self::user_key(account_id, user_name);
        if let Err(e) = self.put_json(BUCKET_USERS, &user_key, &user).await {
            // Roll the key entry back so no orphan can authenticate.
            if let Err(rollback) = self
                .kv
                .delete(BUCKET_ACCESS_KEYS, &record.access_key_id)
                .await
            {
                warn!(key = %record.access_key_id, error = %rollback,
                    "rollback of access-key entry failed");
            }
            return Err(e);
        }

        Ok((record, secret))
    }

    /// Looks up an access key by ID. The SigV4 verifier's entry point.
    pub async fn lookup_access_key(&self, access_key_id: &str) -> Result<AccessKeyRecord, ApiError> {
        self.get_json(BUCKET_ACCESS_KEYS, access_key_id)
            .await?
            .ok_or_else(|| ApiError::new(Code::InvalidClientTokenId))
    }

    /// Lists a user's access keys.
    pub async fn list_access_keys(
        &self,
        account_id: &str,
        user_name: &str,
    ) -> Result<Vec<AccessKeyRecord>, ApiError> {
        let user = self.get_user(account_id, user_name).await?;
        let mut out = Vec::new();
        for id in &user.access_keys {
            match self.get_json::<AccessKeyRecord>(BUCKET_ACCESS_KEYS, id).await? {
                Some(record) => out.push(record),
                None => warn!(key = %id, user = %user_name, "user lists an unknown access key"),
            }
        }
        Ok(out)
    }

    /// Flips a key's status.
    pub async fn update_access_key(
        &self,
        access_key_id: &str,
        status: KeyStatus,
    ) -> Result<(), ApiError> {
        let mut record = self
            .get_json::<AccessKeyRecord>(BUCKET_ACCESS_KEYS, access_key_id)
            .await?
            .ok_or_else(|| {
                ApiError::with_message(Code::NoSuchEntity, format!("access key {access_key_id}"))
            })?;
        record.status = status;
        self.put_json(BUCKET_ACCESS_KEYS, access_key_id, &record)
            .await
    }

    /// Deletes a key, then patches the owner. Best-effort consistent: a
    /// failed patch leaves a dangling list entry that `list_access_keys`
    /// tolerates.
    pub async fn delete_access_key(
        &self,
        account_id: &str,
        user_name: &str,
        access_key_id: &str,
    ) -> Result<(), ApiError> {
        let record = self
            .get_json::<AccessKeyRecord>(BUCKET_ACCESS_KEYS, access_key_id)
            .await?
            .ok_or_else(|| {
                ApiError::with_message(Code::NoSuchEntity, format!("access key {access_key_id}"))
            })?;
        if record.account_id != account_id || record.user_name != user_name {
            return Err(ApiError::with_message(
                Code::NoSuchEntity,
                format!("access key {access_key_id}"),
            ));
        }
        self.kv
            .delete(BUCKET_ACCESS_KEYS, access_key_id)
            .await
            .map_err(backend_err)?;

        let mut user = self.get_user(account_id, user_name).await?;
        user.access_keys.retain(|id| id != access_key_id);
        if let Err(e) = self
            .put_json(BUCKET_USERS, &Self::user_key(account_id, user_name), &user)
            .await
        {
            warn!(user = %user_name, error = %e, "patching user after key delete failed");
        }
        Ok(())
    }

    // --- Policies ---

    fn policy_key(account_id: &str, policy_name: &str) -> String {
        format!("{account_id}/{policy_name}")
    }

    /// Validates the document and creates the policy.
    pub async fn create_policy(
        &self,
        account_id: &str,
        policy_name: &str,
        path: Option<&str>,
        document: &str,
    ) -> Result<PolicyRecord, ApiError> {
        PolicyDocument::parse(document)?;
        let path = path.unwrap_or("/");
        let now = Utc::now();
        let record = PolicyRecord {
            account_id: account_id.to_string(),
            policy_name: policy_name.to_string(),
            policy_id: crypto::generate_id(POLICY_ID_PREFIX),
            arn: PolicyRecord::arn_for(account_id, path, policy_name),
            path: path.to_string(),
            default_version_id: "v1".to_string(),
            document: document.to_string(),
            created_at: now,
            updated_at: now,
        };
        match self
            .create_json(
                BUCKET_POLICIES,
                &Self::policy_key(account_id, policy_name),
                &record,
            )
            .await
        {
            Ok(()) => Ok(record),
            Err(KvError::AlreadyExists) => Err(ApiError::with_message(
                Code::EntityAlreadyExists,
                format!("policy {policy_name} already exists"),
            )),
            Err(e) => Err(backend_err(e)),
        }
    }

    /// Reads one policy by name.
    pub async fn get_policy(
        &self,
        account_id: &str,
        policy_name: &str,
    ) -> Result<PolicyRecord, ApiError> {
        self.get_json(BUCKET_POLICIES, &Self::policy_key(account_id, policy_name))
            .await?
            .ok_or_else(|| {
                ApiError::with_message(Code::NoSuchEntity, format!("policy {policy_name}"))
            })
    }

    /// Reads one policy by ARN.
    pub async fn get_policy_by_arn(&self, arn: &str) -> Result<PolicyRecord, ApiError> {
        let (account_id, policy_name) = parse_policy_arn(arn)
            .ok_or_else(|| ApiError::with_message(Code::NoSuchEntity, format!("policy {arn}")))?;
        self.get_policy(&account_id, &policy_name).await
    }

    /// Lists the account's policies in key order.
    pub async fn list_policies(&self, account_id: &str) -> Result<Vec<PolicyRecord>, ApiError> {
        let prefix = format!("{account_id}/");
        let mut keys = self.kv.keys(BUCKET_POLICIES).await.map_err(backend_err)?;
        keys.sort();
        let mut out = Vec::new();
        for key in keys.into_iter().filter(|k| k.starts_with(&prefix)) {
            if let Some(record) = self.get_json::<PolicyRecord>(BUCKET_POLICIES, &key).await? {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Deletes a policy. `DeleteConflict` while attachments remain.
    pub async fn delete_policy(
        &self,
        account_id: &str,
        policy_name: &str,
    ) -> Result<(), ApiError> {
        // Existence check first so a ghost policy is NoSuchEntity.
        self.get_policy(account_id, policy_name).await?;
        let key = Self::policy_key(account_id, policy_name);
        if let Some(att) = self.get_json::<AttachmentRecord>(BUCKET_ATTACHMENTS, &key).await? {
            if !att.users.is_empty() {
                return Err(ApiError::with_message(
                    Code::DeleteConflict,
                    format!("policy {policy_name} is still attached"),
                ));
            }
        }
        self.kv
            .delete(BUCKET_POLICIES, &key)
            .await
            .map_err(backend_err)?;
        self.kv
            .delete(BUCKET_ATTACHMENTS, &key)
            .await
            .map_err(backend_err)
    }

    // --- Attachments ---

    /// Attaches a policy to a user. Idempotent.
    pub async fn attach_user_policy(
        &self,
        account_id: &str,
        user_name: &str,
        policy_arn: &str,
    ) -> Result<(), ApiError> {
        let policy = self.get_policy_by_arn(policy_arn).await?;
        let mut user = self.get_user(account_id, user_name).await?;
        if user.attached_policies.iter().any(|a| a == policy_arn) {
            debug!(user = %user_name, policy = %policy_arn, "attachment already present");
            return Ok(());
        }
        user.attached_policies.push(policy_arn.to_string());
        self.put_json(BUCKET_USERS, &Self::user_key(account_id, user_name), &user)
            .await?;

        let key = Self::policy_key(&policy.account_id, &policy.policy_name);
        let mut att = self
            .get_json::<AttachmentRecord>(BUCKET_ATTACHMENTS, &key)
            .await?
            .unwrap_or(AttachmentRecord {
                policy_arn: policy_arn.to_string(),
                users: Vec::new(),
            });
        if !att.users.iter().any(|u| u == user_name) {
            att.users.push(user_name.to_string());
        }
        self.put_json(BUCKET_ATTACHMENTS, &key, &att).await
    }

    /// Detaches a policy from a user. Detaching an unattached policy is
    /// `NoSuchEntity`.
    pub async fn detach_user_policy(
        &self,
        account_id: &str,
        user_name: &str,
        policy_arn: &str,
    ) -> Result<(), ApiError> {
        let mut user = self.get_user(account_id, user_name).await?;
        let before = user.attached_policies.len();
        user.attached_policies.retain(|a| a != policy_arn);
        if user.attached_policies.len() == before {
            return Err(ApiError::with_message(
                Code::NoSuchEntity,
                format!("policy {policy_arn} is not attached to {user_name}"),
            ));
        }
        self.put_json(BUCKET_USERS, &Self::user_key(account_id, user_name), &user)
            .await?;
        if let Some((acct, name)) = parse_policy_arn(policy_arn) {
            self.remove_attachment(&acct, &name, user_name).await?;
        }
        Ok(())
    }

    async fn remove_attachment(
        &self,
        account_id: &str,
        policy_name: &str,
        user_name: &str,
    ) -> Result<(), ApiError> {
        let key = Self::policy_key(account_id, policy_name);
        if let Some(mut att) = self.get_json::<AttachmentRecord>(BUCKET_ATTACHMENTS, &key).await? {
            att.users.retain(|u| u != user_name);
            self.put_json(BUCKET_ATTACHMENTS, &key, &att).await?;
        }
        Ok(())
    }

    /// The `(name, arn)` pairs of a user's attachments.
    pub async fn list_attached_user_policies(
        &self,
        account_id: &str,
        user_name: &str,
    ) -> Result<Vec<(String, String)>, ApiError> {
        let user = self.get_user(account_id, user_name).await?;
        Ok(user
            .attached_policies
            .iter()
            .map(|arn| {
                let name = parse_policy_arn(arn)
                    .map(|(_, name)| name)
                    .unwrap_or_else(|| arn.clone());
                (name, arn.clone())
            })
            .collect())
    }

    /// The parsed policy documents attached to a user; the evaluator's
    /// input. Documents that no longer parse are skipped with a warning,
    /// which can only narrow access.
    pub async fn get_user_policies(
        &self,
        account_id: &str,
        user_name: &str,
    ) -> Result<Vec<PolicyDocument>, ApiError> {
        let user = self.get_user(account_id, user_name).await?;
        let mut docs = Vec::new();
        for arn in &user.attached_policies {
            let policy = match self.get_policy_by_arn(arn).await {
                Ok(policy) => policy,
                Err(e) => {
                    warn!(policy = %arn, error = %e, "attached policy did not resolve");
                    continue;
                }
            };
            match PolicyDocument::parse(&policy.document) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    warn!(policy = %arn, error = %e, "stored policy document no longer parses");
                }
            }
        }
        Ok(docs)
    }
}

impl IamStore {
    /// Seeds the root user and its access key from the bootstrap record.
    /// Safe under concurrent multi-node start-up: every write is a
    /// conditional create and `key exists` counts as success.
    pub async fn seed_root_user(
        &self,
        bootstrap: &hive_types::iam::BootstrapRecord,
    ) -> Result<(), ApiError> {
        self.ensure_global_account().await?;
        if bootstrap.account_id != GLOBAL_ACCOUNT_ID {
            let record = AccountRecord {
                account_id: bootstrap.account_id.clone(),
                name: "root".to_string(),
                status: AccountStatus::Active,
                created_at: Utc::now(),
            };
            match self
                .create_json(BUCKET_ACCOUNTS, &bootstrap.account_id, &record)
                .await
            {
                Ok(()) | Err(KvError::AlreadyExists) => {}
                Err(e) => return Err(backend_err(e)),
            }
        }

        let user = UserRecord {
            account_id: bootstrap.account_id.clone(),
            user_name: crate::policy::ROOT_IDENTITY.to_string(),
            user_id: crypto::generate_id(USER_ID_PREFIX),
            arn: UserRecord::arn_for(&bootstrap.account_id, "/", crate::policy::ROOT_IDENTITY),
            path: "/".to_string(),
            created_at: Utc::now(),
            access_keys: vec![bootstrap.access_key_id.clone()],
            attached_policies: Vec::new(),
            tags: Vec::new(),
        };
        let user_key = Self::user_key(&bootstrap.account_id, crate::policy::ROOT_IDENTITY);
        match self.create_json(BUCKET_USERS, &user_key, &user).await {
            Ok(()) => {}
            Err(KvError::AlreadyExists) => {
                // A previous partial seed may have written the user
                // without the key reference.
                let mut existing = self
                    .get_user(&bootstrap.account_id, crate::policy::ROOT_IDENTITY)
                    .await?;
                if !existing.access_keys.contains(&bootstrap.access_key_id) {
                    existing.access_keys.push(bootstrap.access_key_id.clone());
                    self.put_json(BUCKET_USERS, &user_key, &existing).await?;
                }
            }
            Err(e) => return Err(backend_err(e)),
        }

        let key_record = AccessKeyRecord {
            access_key_id: bootstrap.access_key_id.clone(),
            account_id: bootstrap.account_id.clone(),
            user_name: crate::policy::ROOT_IDENTITY.to_string(),
            status: KeyStatus::Active,
            encrypted_secret: bootstrap.encrypted_secret.clone(),
            created_at: Utc::now(),
        };
        match self
            .create_json(BUCKET_ACCESS_KEYS, &bootstrap.access_key_id, &key_record)
            .await
        {
            Ok(()) | Err(KvError::AlreadyExists) => Ok(()),
            Err(e) => Err(backend_err(e)),
        }
    }
}

/// Splits a policy ARN into `(account_id, policy_name)`.
pub fn parse_policy_arn(arn: &str) -> Option<(String, String)> {
    let rest = arn.strip_prefix("arn:aws:iam::")?;
    let (account_id, resource) = rest.split_once(':')?;
    let path_and_name = resource.strip_prefix("policy")?;
    let name = path_and_name.rsplit('/').next()?;
    if name.is_empty() {
        return None;
    }
    Some((account_id.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn store() -> IamStore {
        IamStore::new(Arc::new(MemoryKv::new()), MasterKey::generate())
    }

    const ACCT: &str = "000000000000";

    #[tokio::test]
    async fn global_account_creation_is_idempotent() {
        let store = store();
        store.ensure_global_account().await.unwrap();
        store.ensure_global_account().await.unwrap();
        let account = store.get_account(ACCT).await.unwrap();
        assert_eq!(account.name, "Global");
    }

    #[tokio::test]
    async fn account_ids_are_sequential_twelve_digits() {
        let store = store();
        store.ensure_global_account().await.unwrap();
        let a = store.create_account("dev").await.unwrap();
        let b = store.create_account("prod").await.unwrap();
        assert_eq!(a.account_id, "000000000001");
        assert_eq!(b.account_id, "000000000002");
    }

    #[tokio::test]
    async fn duplicate_user_is_entity_already_exists() {
        let store = store();
        store.create_user(ACCT, "alice", None, Vec::new()).await.unwrap();
        let err = store
            .create_user(ACCT, "alice", None, Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, Code::EntityAlreadyExists);
    }

    #[tokio::test]
    async fn user_arn_and_id_have_canonical_shape() {
        let store = store();
        let user = store
            .create_user(ACCT, "alice", Some("/ops/"), Vec::new())
            .await
            .unwrap();
        assert_eq!(user.arn, format!("arn:aws:iam::{ACCT}:user/ops/alice"));
        assert!(user.user_id.starts_with("AIDA"));
    }

    #[tokio::test]
    async fn access_key_limit_is_two() {
        let store = store();
        store.create_user(ACCT, "alice", None, Vec::new()).await.unwrap();
        store.create_access_key(ACCT, "alice").await.unwrap();
        store.create_access_key(ACCT, "alice").await.unwrap();
        let err = store.create_access_key(ACCT, "alice").await.unwrap_err();
        assert_eq!(err.code, Code::LimitExceeded);
    }

    #[tokio::test]
    async fn secret_round_trips_through_the_master_key() {
        let store = store();
        store.create_user(ACCT, "alice", None, Vec::new()).await.unwrap();
        let (record, secret) = store.create_access_key(ACCT, "alice").await.unwrap();
        assert_eq!(secret.len(), 40);
        let looked_up = store.lookup_access_key(&record.access_key_id).await.unwrap();
        let decrypted =
            crypto::decrypt_secret(store.master_key(), &looked_up.encrypted_secret).unwrap();
        assert_eq!(decrypted, secret);
    }

    #[tokio::test]
    async fn unknown_access_key_is_invalid_client_token() {
        let store = store();
        let err = store.lookup_access_key("AKIAUNKNOWNUNKNOWN00").await.unwrap_err();
        assert_eq!(err.code, Code::InvalidClientTokenId);
    }

    #[tokio::test]
    async fn user_with_keys_cannot_be_deleted() {
        let store = store();
        store.create_user(ACCT, "alice", None, Vec::new()).await.unwrap();
        let (record, _) = store.create_access_key(ACCT, "alice").await.unwrap();
        let err = store.delete_user(ACCT, "alice").await.unwrap_err();
        assert_eq!(err.code, Code::DeleteConflict);

        store
            .delete_access_key(ACCT, "alice", &record.access_key_id)
            .await
            .unwrap();
        store.delete_user(ACCT, "alice").await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn update_access_key_flips_status() {
        let store = store();
        store.create_user(ACCT, "alice", None, Vec::new()).await.unwrap();
        let (record, _) = store.create_access_key(ACCT, "alice").await.unwrap();
        store
            .update_access_key(&record.access_key_id, KeyStatus::Inactive)
            .await
            .unwrap();
        let looked_up = store.lookup_access_key(&record.access_key_id).await.unwrap();
        assert_eq!(looked_up.status, KeyStatus::Inactive);
    }

    const DOC: &str = r#"{"Version":"2012-10-17","Statement":[
        {"Effect":"Allow","Action":"ec2:*","Resource":"*"}]}"#;

    #[tokio::test]
    async fn policy_lifecycle_and_attachment_rules() {
        let store = store();
        store.create_user(ACCT, "alice", None, Vec::new()).await.unwrap();
        let policy = store
            .create_policy(ACCT, "ec2-all", None, DOC)
            .await
            .unwrap();
        assert!(policy.policy_id.starts_with("ANPA"));
        assert_eq!(policy.default_version_id, "v1");

        // Idempotent attach.
        store.attach_user_policy(ACCT, "alice", &policy.arn).await.unwrap();
        store.attach_user_policy(ACCT, "alice", &policy.arn).await.unwrap();
        let attached = store
            .list_attached_user_policies(ACCT, "alice")
            .await
            .unwrap();
        assert_eq!(attached, vec![("ec2-all".to_string(), policy.arn.clone())]);

        // Attached policies cannot be deleted.
        let err = store.delete_policy(ACCT, "ec2-all").await.unwrap_err();
        assert_eq!(err.code, Code::DeleteConflict);

        // Detach of an unattached policy is NoSuchEntity.
        store.detach_user_policy(ACCT, "alice", &policy.arn).await.unwrap();
        let err = store
            .detach_user_policy(ACCT, "alice", &policy.arn)
            .await
            .unwrap_err();
        assert_eq!(err.code, Code::NoSuchEntity);

        store.delete_policy(ACCT, "ec2-all").await.unwrap();
    }

    #[tokio::test]
    async fn malformed_document_is_rejected_at_create() {
        let store = store();
        let err = store
            .create_policy(ACCT, "bad", None, r#"{"Version":"2012-10-17","Statement":[]}"#)
            .await
            .unwrap_err();
        assert_eq!(err.code, Code::MalformedPolicyDocument);
    }

    #[tokio::test]
    async fn user_policies_parse_for_the_evaluator() {
        let store = store();
        store.create_user(ACCT, "alice", None, Vec::new()).await.unwrap();
        let policy = store.create_policy(ACCT, "ec2-all", None, DOC).await.unwrap();
        store.attach_user_policy(ACCT, "alice", &policy.arn).await.unwrap();
        let docs = store.get_user_policies(ACCT, "alice").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].statement[0].effect, "Allow");
    }

    #[test]
    fn policy_arns_parse() {
        assert_eq!(
            parse_policy_arn("arn:aws:iam::000000000000:policy/ec2-all"),
            Some(("000000000000".to_string(), "ec2-all".to_string()))
        );
        assert_eq!(
            parse_policy_arn("arn:aws:iam::42:policy/team/deep/name"),
            Some(("42".to_string(), "name".to_string()))
        );
        assert_eq!(parse_policy_arn("arn:aws:s3:::bucket"), None);
    }
}
