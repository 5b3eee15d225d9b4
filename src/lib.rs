//! Hermod - Landing service demo over gRPC
//!
//! This crate implements the four gRPC call patterns (unary, server
//! streaming, client streaming, bidirectional streaming) as a
//! client/server pair. The server answers locally from a small greeting
//! catalog, or, when a backend is configured, relays every call to an
//! upstream Landing service while propagating tracing headers.
//!
//! # Client Example
//!
//! ```rust,no_run
//! use hermod::LandingClient;
//! use hermod::server::proto::TalkRequest;
//!
//! #[tokio::main]
//! async fn main() -> hermod::Result<()> {
//!     let client = LandingClient::connect().await?;
//!
//!     let response = client
//!         .talk(TalkRequest {
//!             data: "0".to_string(),
//!             meta: "RUST".to_string(),
//!         })
//!         .await?;
//!
//!     println!("status: {}", response.status);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod conn;
pub mod error;
pub mod retry;
pub mod server;
pub mod shutdown;
pub mod status;
pub mod telemetry;
mod version;

// Re-export main types at crate root
pub use client::LandingClient;
pub use error::{HermodError, Result};
pub use retry::RetryConfig;
pub use server::{HermodService, ServerMode};
pub use version::{PKG_VERSION, version_string};
