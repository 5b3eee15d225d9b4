//! Connection plumbing: certificate resolution and channel construction.
//!
//! The channel factory builds one [`Channel`] per client; the channel is
//! a cheaply clonable handle, shared by every RPC issued through it and
//! never reconfigured after construction.
//!
//! Certificate-load failures are fatal for a TLS-enabled endpoint; there
//! is no silent plaintext fallback.

pub mod env;

use std::path::{Path, PathBuf};

use tonic::transport::{Certificate, Channel, ClientTlsConfig, Identity};
use tracing::info;

use crate::{HermodError, Result};

/// Expected server identity, used as the TLS authority override on
/// client connections.
pub const DOMAIN_NAME: &str = "hello.grpc.io";

/// Locations of the four PEM files for one endpoint role.
#[derive(Debug, Clone)]
pub struct CertPaths {
    /// Root CA certificate used to verify the peer.
    pub root_ca: PathBuf,
    /// Leaf certificate.
    pub cert: PathBuf,
    /// Private key for the leaf certificate.
    pub private_key: PathBuf,
    /// Full certificate chain presented to the peer.
    pub full_chain: PathBuf,
}

impl CertPaths {
    /// Certificate layout for the client role under `base`.
    pub fn client(base: &Path) -> Self {
        Self::under(&base.join("client_certs"))
    }

    /// Certificate layout for the server role under `base`.
    pub fn server(base: &Path) -> Self {
        Self::under(&base.join("server_certs"))
    }

    fn under(dir: &Path) -> Self {
        Self {
            root_ca: dir.join("myssl_root.cer"),
            cert: dir.join("cert.pem"),
            private_key: dir.join("private.key"),
            full_chain: dir.join("full_chain.pem"),
        }
    }
}

async fn read_pem(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        HermodError::Certificate(format!("failed to read {}: {e}", path.display()))
    })
}

/// TLS configuration for a client channel: CA-verified peer with the
/// fixed authority override, presenting our own chain and key.
pub async fn client_tls_config(paths: &CertPaths) -> Result<ClientTlsConfig> {
    let chain = read_pem(&paths.full_chain).await?;
    let key = read_pem(&paths.private_key).await?;
    let ca = read_pem(&paths.root_ca).await?;
    Ok(ClientTlsConfig::new()
        .domain_name(DOMAIN_NAME)
        .identity(Identity::from_pem(chain, key))
        .ca_certificate(Certificate::from_pem(ca)))
}

/// Server identity (chain + key) for a TLS listener.
pub async fn server_identity(paths: &CertPaths) -> Result<Identity> {
    let chain = read_pem(&paths.full_chain).await?;
    let key = read_pem(&paths.private_key).await?;
    Ok(Identity::from_pem(chain, key))
}

/// Build a channel to `host:port`, TLS or plaintext.
pub async fn connect(host: &str, port: &str, tls: bool) -> Result<Channel> {
    if tls {
        let base = env::cert_base_path();
        let paths = CertPaths::client(Path::new(&base));
        let tls_config = client_tls_config(&paths).await?;
        let endpoint = Channel::from_shared(format!("https://{host}:{port}"))
            .map_err(|e| HermodError::Configuration(format!("invalid endpoint: {e}")))?
            .tls_config(tls_config)
            .map_err(|e| HermodError::Transport(format!("TLS configuration rejected: {e}")))?;
        info!(host, port, "connecting with TLS");
        endpoint
            .connect()
            .await
            .map_err(|e| HermodError::Transport(format!("failed to connect to {host}:{port}: {e}")))
    } else {
        info!(host, port, "connecting without TLS");
        Channel::from_shared(format!("http://{host}:{port}"))
            .map_err(|e| HermodError::Configuration(format!("invalid endpoint: {e}")))?
            .connect()
            .await
            .map_err(|e| HermodError::Transport(format!("failed to connect to {host}:{port}: {e}")))
    }
}

/// Build a channel to the environment-resolved backend target.
pub async fn build_channel() -> Result<Channel> {
    connect(&env::backend_host(), &env::backend_port(), env::tls_enabled()).await
}
