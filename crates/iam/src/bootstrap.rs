//! First-start bootstrap: when the users bucket is empty, the one-shot
//! `<base>/config/bootstrap.json` file seeds the root user and is then
//! deleted.

use std::path::Path;

use tracing::{info, warn};

use hive_types::error::{ApiError, Code};
use hive_types::iam::BootstrapRecord;

use crate::store::IamStore;

/// Runs the first-start seed if the store is empty and the bootstrap file
/// exists. The file is removed only after a successful seed, so a crash
/// in between retries on the next start.
pub async fn run_if_needed(store: &IamStore, path: &Path) -> Result<(), ApiError> {
    if !store.is_empty().await? {
        return Ok(());
    }
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "store is empty and no bootstrap file exists");
            return Ok(());
        }
        Err(e) => {
            return Err(ApiError::with_message(
                Code::InternalError,
                format!("cannot read bootstrap file {}: {e}", path.display()),
            ))
        }
    };
    let record: BootstrapRecord = serde_json::from_slice(&raw).map_err(|e| {
        ApiError::with_message(
            Code::InternalError,
            format!("bootstrap file {} is malformed: {e}", path.display()),
        )
    })?;

    store.seed_root_user(&record).await?;
    info!(account = %record.account_id, key = %record.access_key_id, "seeded root user");

    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "could not remove consumed bootstrap file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{self, MasterKey};
    use crate::kv::MemoryKv;
    use std::sync::Arc;

    fn record(key: &MasterKey) -> BootstrapRecord {
        BootstrapRecord {
            access_key_id: "AKIAROOTROOTROOT0000".to_string(),
            encrypted_secret: crypto::encrypt_secret(key, "root-secret-40-chars-aaaaaaaaaaaaaaaaaaa")
                .unwrap(),
            account_id: "000000000000".to_string(),
        }
    }

    #[tokio::test]
    async fn seed_is_idempotent_across_nodes() {
        let master = MasterKey::generate();
        let store = IamStore::new(Arc::new(MemoryKv::new()), master.clone());
        let bootstrap = record(&master);

        // Two nodes race the same seed.
        store.seed_root_user(&bootstrap).await.unwrap();
        store.seed_root_user(&bootstrap).await.unwrap();

        let root = store.get_user("000000000000", "root").await.unwrap();
        assert_eq!(root.access_keys, vec!["AKIAROOTROOTROOT0000"]);
        let key = store.lookup_access_key("AKIAROOTROOTROOT0000").await.unwrap();
        assert_eq!(
            crypto::decrypt_secret(&master, &key.encrypted_secret).unwrap(),
            "root-secret-40-chars-aaaaaaaaaaaaaaaaaaa"
        );
    }

    #[tokio::test]
    async fn bootstrap_file_is_consumed_once() {
        let master = MasterKey::generate();
        let store = IamStore::new(Arc::new(MemoryKv::new()), master.clone());
        let dir = std::env::temp_dir().join(format!("hive-bootstrap-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("bootstrap.json");
        tokio::fs::write(&path, serde_json::to_vec(&record(&master)).unwrap())
            .await
            .unwrap();

        run_if_needed(&store, &path).await.unwrap();
        assert!(!path.exists());
        assert!(!store.is_empty().await.unwrap());

        // Second start: store is populated, absent file is fine.
        run_if_needed(&store, &path).await.unwrap();
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn empty_store_without_file_is_not_fatal() {
        let store = IamStore::new(Arc::new(MemoryKv::new()), MasterKey::generate());
        run_if_needed(&store, Path::new("/nonexistent/bootstrap.json"))
            .await
            .unwrap();
    }
}
