//! TLS termination: a plain accept loop handing each connection to the
//! axum router over hyper. A self-signed certificate is generated when no
//! PEM pair is configured, which keeps development setups one-command.

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use hive_types::config::GatewayConfig;

/// Builds the rustls server configuration from the gateway settings.
pub fn tls_config(config: &GatewayConfig) -> anyhow::Result<Arc<rustls::ServerConfig>> {
    let (certs, key) = match (&config.cert_file, &config.key_file) {
        (Some(cert), Some(keyfile)) if config.has_cert_pair() => load_pem(cert, keyfile)?,
        _ => {
            warn!("no certificate configured; generating a self-signed pair");
            self_signed()?
        }
    };
    let mut tls = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("certificate/key pair rejected")?;
    tls.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(Arc::new(tls))
}

fn load_pem(
    cert_path: &Path,
    key_path: &Path,
) -> anyhow::Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let mut cert_reader = BufReader::new(
        File::open(cert_path)
            .with_context(|| format!("cannot open certificate {}", cert_path.display()))?,
    );
    let certs = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .context("certificate file is not PEM")?;
    let mut key_reader = BufReader::new(
        File::open(key_path)
            .with_context(|| format!("cannot open key {}", key_path.display()))?,
    );
    let key = rustls_pemfile::private_key(&mut key_reader)
        .context("key file is not PEM")?
        .context("key file holds no private key")?;
    Ok((certs, key))
}

fn self_signed() -> anyhow::Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let rcgen::CertifiedKey { cert, key_pair } = rcgen::generate_simple_self_signed(vec![
        "localhost".to_string(),
        "hive.local".to_string(),
    ])?;
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    Ok((vec![cert.der().clone()], key))
}

/// Serves the router over TLS until the shutdown signal flips.
pub async fn serve(
    router: Router,
    addr: SocketAddr,
    tls: Arc<rustls::ServerConfig>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    let acceptor = TlsAcceptor::from(tls);
    info!(%addr, "gateway listening");

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                let acceptor = acceptor.clone();
                let service = TowerToHyperService::new(router.clone());
                tokio::spawn(async move {
                    let tls_stream = match acceptor.accept(stream).await {
                        Ok(tls_stream) => tls_stream,
                        Err(e) => {
                            debug!(%peer, error = %e, "tls handshake failed");
                            return;
                        }
                    };
                    let io = TokioIo::new(tls_stream);
                    if let Err(e) = auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await
                    {
                        debug!(%peer, error = %e, "connection closed with error");
                    }
                });
            }
        }
    }
    info!("gateway listener drained");
    Ok(())
}
