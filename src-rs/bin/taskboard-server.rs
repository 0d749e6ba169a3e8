use std::process::ExitCode;

use taskboard::api::server::init_tracing;
use taskboard::{ServerConfig, TaskServer};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    info!(store = ?config.store, "Starting taskboard server");
    let server = match TaskServer::new(config) {
        Ok(server) => server,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = server.start().await {
        error!("{err}");
        return ExitCode::FAILURE;
    }

    info!("Server shut down");
    ExitCode::SUCCESS
}
