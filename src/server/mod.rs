//! gRPC server and shared proto types.
//!
//! This module provides:
//! - Generated protobuf types (`proto`) used by both server and client
//! - The Landing service implementation (`service`)

pub mod service;

/// Re-exported generated proto types.
pub mod proto {
    tonic::include_proto!("hello");
}

pub use service::{HermodService, ServerMode, TRACING_HEADERS};
