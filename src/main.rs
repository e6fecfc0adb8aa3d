pub mod api;
pub mod config;
pub mod db;
pub mod storage;
pub mod telemetry;
pub mod user;

use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    telemetry::init_tracing(&config.log_format);

    tracing::info!("starting sharded user store");

    api::server::start_server(config).await
}
