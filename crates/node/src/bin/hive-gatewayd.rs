#![forbid(unsafe_code)]

//! The gateway daemon: loads configuration and key material, connects the
//! control bus, seeds IAM on first start, and serves the AWS surface on
//! TLS until signalled.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use hive_bus::NatsBus;
use hive_gateway::{router, server, AppState};
use hive_iam::crypto::MasterKey;
use hive_iam::kv::JetStreamKv;
use hive_iam::{bootstrap, IamStore};
use hive_types::config::Config;

#[derive(Parser, Debug)]
#[clap(name = "hive-gatewayd", about = "Hive AWS-compatible control-plane gateway")]
struct Opts {
    /// Path to the TOML configuration file.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Overrides the configured base directory.
    #[clap(long)]
    base_dir: Option<PathBuf>,

    /// Creates the base directory layout and a master key, then exits.
    #[clap(long)]
    init: bool,

    /// Human-readable logs instead of JSON.
    #[clap(long)]
    pretty_logs: bool,
}

fn load_config(opts: &Opts) -> Result<Config> {
    let mut config = match &opts.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("config {} is not valid TOML", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(base_dir) = &opts.base_dir {
        config.base_dir = base_dir.clone();
    }
    Ok(config)
}

async fn init(config: &Config) -> Result<()> {
    tokio::fs::create_dir_all(config.base_dir.join("config")).await?;
    let key_path = config.master_key_path();
    if key_path.exists() {
        info!(path = %key_path.display(), "master key already present");
        return Ok(());
    }
    MasterKey::generate()
        .save(&key_path)
        .await
        .map_err(|e| anyhow!(e))?;
    info!(path = %key_path.display(), "master key generated");
    Ok(())
}

async fn write_pid_file(config: &Config) -> Result<PathBuf> {
    let path = config.pid_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, std::process::id().to_string()).await?;
    Ok(path)
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();
    hive_telemetry::init_tracing(opts.pretty_logs)?;
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = load_config(&opts)?;
    if opts.init {
        return init(&config).await;
    }

    let master_key = MasterKey::load(&config.master_key_path())
        .await
        .map_err(|e| anyhow!("{e}; run with --init to create one"))?;

    // The IAM buckets ride the same connection as the action subjects, so
    // the bus comes up first and its absence fails the process.
    let bus = NatsBus::connect(&config.nats.url)
        .await
        .map_err(|e| anyhow!(e))?;
    let kv = Arc::new(JetStreamKv::new(bus.client()));
    let iam = Arc::new(IamStore::new(kv, master_key));

    iam.ensure_global_account().await.map_err(|e| anyhow!(e))?;
    bootstrap::run_if_needed(&iam, &config.bootstrap_path())
        .await
        .map_err(|e| anyhow!(e))?;

    let listen_addr = config
        .gateway
        .listen_addr
        .parse()
        .with_context(|| format!("bad listen address {:?}", config.gateway.listen_addr))?;
    let tls = server::tls_config(&config.gateway)?;
    let state = Arc::new(AppState::new(
        iam,
        Some(Arc::new(bus)),
        config.gateway.clone(),
    ));

    let pid_path = write_pid_file(&config).await?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let server = tokio::spawn(server::serve(router(state), listen_addr, tls, shutdown_rx));

    wait_for_signal().await;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    match server.await {
        Ok(result) => result?,
        Err(e) => warn!(error = %e, "server task aborted"),
    }

    if let Err(e) = tokio::fs::remove_file(&pid_path).await {
        warn!(path = %pid_path.display(), error = %e, "pid file not removed");
    }
    Ok(())
}
