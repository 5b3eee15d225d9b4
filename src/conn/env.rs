//! Process-environment resolution for connection settings.
//!
//! Pure lookups with fallback defaults; an absent or empty variable
//! never fails, it resolves to a usable default. Each public function
//! is a thin wrapper over an inner function taking `Option<String>`,
//! so defaulting stays unit-testable without mutating the process
//! environment.

use std::env;

/// Host the server binds and clients target when unset.
pub const DEFAULT_HOST: &str = "localhost";

/// Port the Landing service listens on when unset.
pub const DEFAULT_PORT: &str = "9996";

/// Base directory holding `client_certs/` and `server_certs/`.
pub const DEFAULT_CERT_BASE: &str = "/var/hello_grpc";

/// Server host from `GRPC_SERVER`.
pub fn server_host() -> String {
    or_default(env::var("GRPC_SERVER").ok(), DEFAULT_HOST)
}

/// Server port from `GRPC_SERVER_PORT`.
pub fn server_port() -> String {
    or_default(env::var("GRPC_SERVER_PORT").ok(), DEFAULT_PORT)
}

/// Upstream backend host from `GRPC_HELLO_BACKEND`; the server's own
/// host when unset.
pub fn backend_host() -> String {
    first_set(env::var("GRPC_HELLO_BACKEND").ok(), server_host)
}

/// Upstream backend port from `GRPC_HELLO_BACKEND_PORT`, falling back
/// to the server's own port.
pub fn backend_port() -> String {
    first_set(env::var("GRPC_HELLO_BACKEND_PORT").ok(), server_port)
}

/// Whether a proxy backend is configured.
pub fn has_backend() -> bool {
    env::var("GRPC_HELLO_BACKEND").is_ok_and(|v| !v.is_empty())
}

/// Whether TLS is enabled via `GRPC_HELLO_SECURE`. Only the exact
/// value `"Y"` enables it.
pub fn tls_enabled() -> bool {
    env::var("GRPC_HELLO_SECURE").is_ok_and(|v| v == "Y")
}

/// Certificate base directory from `CERT_BASE_PATH`.
pub fn cert_base_path() -> String {
    or_default(env::var("CERT_BASE_PATH").ok(), DEFAULT_CERT_BASE)
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn first_set(value: Option<String>, fallback: fn() -> String) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or_else(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_resolve_to_defaults() {
        assert_eq!(or_default(None, DEFAULT_HOST), "localhost");
        assert_eq!(or_default(None, DEFAULT_PORT), "9996");
        assert_eq!(or_default(None, DEFAULT_CERT_BASE), "/var/hello_grpc");
    }

    #[test]
    fn empty_values_resolve_to_defaults() {
        assert_eq!(or_default(Some(String::new()), DEFAULT_HOST), "localhost");
    }

    #[test]
    fn set_values_win() {
        assert_eq!(
            or_default(Some("remote".to_string()), DEFAULT_HOST),
            "remote"
        );
        assert_eq!(
            first_set(Some("backend".to_string()), || "own-host".to_string()),
            "backend"
        );
    }

    #[test]
    fn unset_backend_falls_back_to_own_target() {
        assert_eq!(first_set(None, || "own-host".to_string()), "own-host");
    }
}
