//! hermodd — Landing service daemon.
//!
//! Answers the four call patterns from the greeting catalog, or, when a
//! backend is configured, relays every call upstream with tracing
//! headers propagated.

use std::net::SocketAddr;
use std::path::Path;

use clap::Parser;
use tonic::transport::{Server, ServerTlsConfig};
use tracing::{info, warn};

use hermod::conn::{self, CertPaths, env};
use hermod::server::HermodService;
use hermod::server::proto::landing_service_server::LandingServiceServer;
use hermod::shutdown::ShutdownGuard;

/// Landing service daemon.
#[derive(Parser)]
#[command(name = "hermodd")]
#[command(version = hermod::PKG_VERSION)]
#[command(about = "Landing service daemon")]
struct Args {
    /// Port to listen on.
    #[arg(short, long, env = "GRPC_SERVER_PORT", default_value = "9996")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let addr: SocketAddr = format!("[::]:{}", args.port).parse()?;

    let service = if env::has_backend() {
        let backend = env::backend_host();
        let backend_port = env::backend_port();
        info!(%backend, %backend_port, "operating in proxy mode");
        let channel = conn::build_channel().await?;
        HermodService::proxy(channel)
    } else {
        info!("operating in standalone mode");
        HermodService::standalone()
    };

    // Unreadable certificates fail startup; no plaintext fallback.
    let mut builder = if env::tls_enabled() {
        let base = env::cert_base_path();
        let identity = conn::server_identity(&CertPaths::server(Path::new(&base))).await?;
        info!(%addr, version = hermod::version_string(), "hermodd starting with TLS");
        Server::builder().tls_config(ServerTlsConfig::new().identity(identity))?
    } else {
        info!(%addr, version = hermod::version_string(), "hermodd starting");
        Server::builder()
    };

    let guard = ShutdownGuard::default();
    guard
        .register("landing-service", || {
            info!("landing service stopped");
            Ok(())
        })
        .await;

    builder
        .add_service(LandingServiceServer::new(service))
        .serve_with_shutdown(addr, guard.wait())
        .await?;

    if !guard.run_cleanup().await {
        warn!("cleanup finished with errors");
    }
    Ok(())
}
