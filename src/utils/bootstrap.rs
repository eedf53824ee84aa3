//! Bootstrap utilities for the order-service binaries.
//!
//! Shared initialization code: logging, connection retry, shutdown signal.

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Maximum connection attempts before giving up.
const MAX_CONNECT_ATTEMPTS: usize = 30;

/// Initialize tracing with the ORDER_SERVICE_LOG environment variable.
///
/// Defaults to "info" level if ORDER_SERVICE_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect to a dependency with exponential backoff retry.
///
/// # Arguments
/// * `service_name` - Human-readable name for logging (e.g., "postgres", "nats")
/// * `address` - The address being connected to, for logging
/// * `connect` - Async function that attempts to establish a connection
///
/// # Returns
/// The connection on success, or the last error after max retries.
pub async fn connect_with_retry<T, E, F, Fut>(
    service_name: &str,
    address: &str,
    connect: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let backoff = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(MAX_CONNECT_ATTEMPTS - 1)
        .with_jitter()
        .build();

    connect_with_backoff(service_name, address, backoff, connect).await
}

/// Like [`connect_with_retry`], with the delays between attempts supplied
/// by the caller. One attempt is made per delay, plus the initial one.
pub async fn connect_with_backoff<T, E, F, Fut, B>(
    service_name: &str,
    address: &str,
    backoff: B,
    connect: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: IntoIterator<Item = Duration>,
{
    let mut delays = backoff.into_iter();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match connect().await {
            Ok(conn) => {
                info!(service = service_name, address, attempt, "Connected");
                return Ok(conn);
            }
            Err(e) => match delays.next() {
                Some(delay) => {
                    warn!(
                        service = service_name,
                        address,
                        attempt,
                        error = %e,
                        retry_in_ms = %delay.as_millis(),
                        "Connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(
                        service = service_name,
                        address,
                        attempts = attempt,
                        error = %e,
                        "Connection failed, giving up"
                    );
                    return Err(e);
                }
            },
        }
    }
}

/// Config file path from `--config <path>` / `-c <path>` on the command line.
pub fn parse_config_path() -> Option<String> {
    config_path_from_args(std::env::args().skip(1))
}

fn config_path_from_args(args: impl IntoIterator<Item = String>) -> Option<String> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}

/// Resolve when the process receives Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_connect_succeeds_after_failures() {
        let attempts = AtomicUsize::new(0);

        let result: Result<&str, String> = connect_with_backoff(
            "test",
            "localhost:0",
            vec![Duration::from_millis(1); 5],
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(format!("attempt {} refused", n))
                    } else {
                        Ok("connected")
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_config_path_from_args() {
        let args = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(
            config_path_from_args(args(&["--config", "a.yaml"])),
            Some("a.yaml".to_string())
        );
        assert_eq!(
            config_path_from_args(args(&["-c", "b.yaml"])),
            Some("b.yaml".to_string())
        );
        assert_eq!(
            config_path_from_args(args(&["--config=c.yaml"])),
            Some("c.yaml".to_string())
        );
        assert_eq!(config_path_from_args(args(&["order-uid"])), None);
    }

    #[tokio::test]
    async fn test_connect_gives_up_with_last_error() {
        let attempts = AtomicUsize::new(0);

        let result: Result<(), String> = connect_with_backoff(
            "test",
            "localhost:0",
            vec![Duration::from_millis(1); 2],
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(format!("attempt {} refused", n)) }
            },
        )
        .await;

        assert_eq!(result.unwrap_err(), "attempt 3 refused");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
