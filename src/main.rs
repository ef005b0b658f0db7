//! Vertical Velocity harness
//!
//! Loads the plugin into an in-memory host, replays a scenario file and
//! prints the resulting report as JSON.

use std::fs;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vertical_velocity::config::Config;
use vertical_velocity::scenario::Scenario;

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config);

    info!(path = %config.scenario_path.display(), "Loading scenario");
    let text = fs::read_to_string(&config.scenario_path)
        .with_context(|| format!("reading {}", config.scenario_path.display()))?;
    let scenario = Scenario::from_json(&text)?;

    let report = scenario.replay()?;
    info!(
        shots = report.shots.len(),
        deaths = report.deaths.len(),
        "Scenario complete"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
