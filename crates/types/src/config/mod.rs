//! Configuration structures for the gateway process, loaded from a TOML
//! file by `hive-node`. Timeouts deliberately do not appear here; they are
//! design constants owned by the crates that enforce them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory for persisted files (`config/master.key`,
    /// `config/bootstrap.json`, PID files).
    pub base_dir: PathBuf,
    /// Front-end settings.
    pub gateway: GatewayConfig,
    /// Control-bus settings.
    pub nats: NatsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_dir: PathBuf::from("/var/lib/hive"),
            gateway: GatewayConfig::default(),
            nats: NatsConfig::default(),
        }
    }
}

impl Config {
    /// Path of the 32-byte master key file.
    pub fn master_key_path(&self) -> PathBuf {
        self.base_dir.join("config").join("master.key")
    }

    /// Path of the one-shot bootstrap file.
    pub fn bootstrap_path(&self) -> PathBuf {
        self.base_dir.join("config").join("bootstrap.json")
    }

    /// Path of the gateway PID file.
    pub fn pid_path(&self) -> PathBuf {
        self.base_dir.join("hive-gatewayd.pid")
    }
}

/// Front-end settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// TLS listen address.
    pub listen_addr: String,
    /// PEM certificate chain; a self-signed pair is generated when unset.
    pub cert_file: Option<PathBuf>,
    /// PEM private key.
    pub key_file: Option<PathBuf>,
    /// The region this gateway answers for.
    pub region: String,
    /// Availability-zone suffixes advertised by `DescribeAvailabilityZones`.
    pub zone_suffixes: Vec<String>,
    /// Fallback daemon count when active-node discovery hears nothing.
    /// Never used below 1.
    pub expected_nodes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            listen_addr: "0.0.0.0:8443".to_string(),
            cert_file: None,
            key_file: None,
            region: "ap-southeast-2".to_string(),
            zone_suffixes: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            expected_nodes: 1,
        }
    }
}

impl GatewayConfig {
    /// True when both PEM paths are configured and exist.
    pub fn has_cert_pair(&self) -> bool {
        fn exists(p: &Option<PathBuf>) -> bool {
            p.as_deref().is_some_and(Path::exists)
        }
        exists(&self.cert_file) && exists(&self.key_file)
    }
}

/// Control-bus settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// Server URL.
    pub url: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        NatsConfig {
            url: "nats://127.0.0.1:4222".to_string(),
        }
    }
}
