//! herm — Landing service demo client.
//!
//! Drives all four call patterns against a Landing server. Connection
//! establishment is retried a bounded number of times with a fixed
//! delay; the unary call additionally runs under the classifier-driven
//! backoff loop.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use rand::Rng;
use tracing::{error, info};

use hermod::client::LandingClient;
use hermod::retry::{RetryConfig, with_backoff};
use hermod::server::proto::TalkRequest;

const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_DELAY: Duration = Duration::from_secs(2);
const ITERATION_DELAY: Duration = Duration::from_millis(200);

/// Landing service demo client.
#[derive(Parser)]
#[command(name = "herm")]
#[command(version = hermod::PKG_VERSION)]
#[command(about = "Landing service demo client")]
struct Args {
    /// Iterations of the four call patterns to run.
    #[arg(short, long, default_value_t = 3)]
    iterations: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!(version = hermod::version_string(), "starting landing client");

    for attempt in 1..=CONNECT_ATTEMPTS {
        info!(attempt, max_attempts = CONNECT_ATTEMPTS, "connecting");
        match run(args.iterations).await {
            Ok(()) => {
                info!("all calls completed");
                return ExitCode::SUCCESS;
            }
            Err(err) => {
                error!(attempt, error = %err, "run failed");
                if attempt < CONNECT_ATTEMPTS {
                    info!(delay_s = CONNECT_DELAY.as_secs(), "retrying connection");
                    tokio::time::sleep(CONNECT_DELAY).await;
                }
            }
        }
    }
    ExitCode::FAILURE
}

/// Connect once and run every call pattern for the requested number of
/// iterations.
async fn run(iterations: u32) -> hermod::Result<()> {
    let client = LandingClient::connect().await?;
    let config = RetryConfig::default();

    for iteration in 1..=iterations {
        info!(iteration, iterations, "starting iteration");

        with_backoff("Talk", &config, || unary_demo(&client)).await?;

        client
            .talk_one_answer_more(TalkRequest {
                data: "0,1,2".to_string(),
                meta: "RUST".to_string(),
            })
            .await?;

        let response = client.talk_more_answer_one(random_requests(3)).await?;
        info!(results = response.results.len(), "client streaming answered");

        client.talk_bidirectional(random_requests(5)).await?;

        if iteration < iterations {
            tokio::time::sleep(ITERATION_DELAY).await;
        }
    }
    Ok(())
}

/// The unary demo call; retried by the backoff loop on transient
/// failures.
async fn unary_demo(client: &LandingClient) -> hermod::Result<()> {
    client
        .talk(TalkRequest {
            data: "0".to_string(),
            meta: "RUST".to_string(),
        })
        .await?;
    Ok(())
}

/// Requests with random catalog indices.
fn random_requests(count: usize) -> Vec<TalkRequest> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| TalkRequest {
            data: rng.random_range(0..6).to_string(),
            meta: "RUST".to_string(),
        })
        .collect()
}
