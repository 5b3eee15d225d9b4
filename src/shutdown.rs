//! Graceful-shutdown context with LIFO cleanup callbacks.
//!
//! A [`ShutdownGuard`] is passed explicitly to whichever lifecycle owns
//! it; there is no global signal handler. Cleanup callbacks run in
//! reverse registration order, each under the remaining portion of a
//! bounded overall timeout.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{error, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type Cleanup =
    Box<dyn FnOnce() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> + Send>;

/// Shutdown context: signal wait plus bounded LIFO cleanup.
pub struct ShutdownGuard {
    timeout: Duration,
    cleanups: Mutex<Vec<(String, Cleanup)>>,
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ShutdownGuard {
    /// Create a guard with the given overall cleanup timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cleanups: Mutex::new(Vec::new()),
        }
    }

    /// Register a named cleanup callback. Callbacks run LIFO.
    pub async fn register<F>(&self, name: impl Into<String>, cleanup: F)
    where
        F: FnOnce() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>
            + Send
            + 'static,
    {
        self.cleanups
            .lock()
            .await
            .push((name.into(), Box::new(cleanup)));
    }

    /// Resolve when a termination signal arrives: SIGINT everywhere,
    /// SIGTERM additionally on unix.
    pub async fn wait(&self) {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT");
            }
            _ = wait_for_sigterm() => {
                info!("received SIGTERM");
            }
        }
    }

    /// Run all registered callbacks in reverse registration order under
    /// the bounded timeout. Returns true when every callback completed
    /// cleanly in time.
    pub async fn run_cleanup(&self) -> bool {
        let mut cleanups = std::mem::take(&mut *self.cleanups.lock().await);
        let deadline = Instant::now() + self.timeout;
        let mut clean = true;

        while let Some((name, cleanup)) = cleanups.pop() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, tokio::task::spawn_blocking(cleanup)).await {
                Ok(Ok(Ok(()))) => {
                    info!(name = %name, "cleanup completed");
                }
                Ok(Ok(Err(e))) => {
                    error!(name = %name, error = %e, "cleanup failed");
                    clean = false;
                }
                Ok(Err(join_error)) => {
                    error!(name = %name, error = %join_error, "cleanup panicked");
                    clean = false;
                }
                Err(_) => {
                    warn!(name = %name, "cleanup timed out, abandoning remaining callbacks");
                    return false;
                }
            }
        }
        clean
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "failed to register SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    // SIGTERM does not exist here; only SIGINT terminates.
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn cleanups_run_in_reverse_registration_order() {
        let guard = ShutdownGuard::new(Duration::from_secs(5));
        let order = Arc::new(StdMutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = order.clone();
            guard
                .register(label, move || {
                    order.lock().unwrap().push(label);
                    Ok(())
                })
                .await;
        }

        assert!(guard.run_cleanup().await);
        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn failing_cleanup_reports_unclean() {
        let guard = ShutdownGuard::new(Duration::from_secs(5));
        guard.register("bad", || Err("boom".into())).await;
        assert!(!guard.run_cleanup().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_cleanup_hits_the_timeout() {
        let guard = ShutdownGuard::new(Duration::from_millis(20));
        let ran_second = Arc::new(StdMutex::new(false));

        let flag = ran_second.clone();
        guard
            .register("never-reached", move || {
                *flag.lock().unwrap() = true;
                Ok(())
            })
            .await;
        guard
            .register("slow", || {
                std::thread::sleep(Duration::from_millis(200));
                Ok(())
            })
            .await;

        assert!(!guard.run_cleanup().await);
        // The slow callback ate the budget; the earlier one never ran.
        assert!(!*ran_second.lock().unwrap());
    }
}
