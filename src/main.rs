use email_gatekeeper::{ClusterHealthMonitor, Config, DefaultValidator};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Email Gatekeeper Entry Point
///
/// Validates every email address given on the command line and prints one
/// JSON result per line, followed by the cache cluster status.
///
/// # Configuration
/// - Environment variables, optionally loaded from a `.env` file
/// - `RUST_LOG` controls log verbosity (default `info`)
///
/// # Example
/// ```text
/// $ email-gatekeeper user@example.com "user@@double.com"
/// {"email":"user@example.com","status":"valid","reason":null}
/// {"email":"user@@double.com","status":"invalid_format","reason":"Email must contain exactly one @ symbol"}
/// {"cluster":{...},"connected":true}
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let validator = DefaultValidator::from_config(&config).await?;

    for email in std::env::args().skip(1) {
        let result = validator.validate(&email).await;
        println!("{}", serde_json::to_string(&result)?);
    }

    let monitor = ClusterHealthMonitor::from_config(&config);
    let status = monitor.cluster_status().await;
    println!(
        "{}",
        json!({
            "cluster": status,
            "connected": status.has_quorum(),
        })
    );

    Ok(())
}
