//! HTTP server for the fleet incentive engine.
//!
//! Configuration directory and bind address come from
//! `INCENTIVE_ENGINE_CONFIG` and `INCENTIVE_ENGINE_ADDR`.

use std::env;
use std::error::Error;

use incentive_engine::api::{AppState, create_router};
use incentive_engine::config::ConfigLoader;
use incentive_engine::telemetry;
use tracing::{info, warn};

const DEFAULT_CONFIG_DIR: &str = "./config/fleet";
const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config_dir =
        env::var("INCENTIVE_ENGINE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let addr = env::var("INCENTIVE_ENGINE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let config = ConfigLoader::load(&config_dir)?;
    telemetry::init(&config.metadata().log_level)?;

    for warning in config.warnings() {
        warn!(
            code = %warning.code,
            severity = %warning.severity,
            "{}",
            warning.message
        );
    }
    info!(
        config_dir = %config_dir,
        name = %config.metadata().name,
        version = %config.metadata().version,
        standing_formulas = config.formulas().len(),
        "Configuration loaded"
    );

    let router = create_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");
    axum::serve(listener, router).await?;

    Ok(())
}
