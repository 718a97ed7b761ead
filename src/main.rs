use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use virtual_bookshelf::{config, db, import, server, state::AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "virtual_bookshelf=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // `--import <dir>` loads the ratings dataset and exits
    let args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--import") {
        let Some(dir) = args.get(pos + 1) else {
            tracing::error!("--import needs the directory holding the BX-*.csv files");
            return ExitCode::FAILURE;
        };
        return match import::import_dataset(&db, &PathBuf::from(dir)).await {
            Ok(summary) => {
                tracing::info!("Import finished: {}", summary);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Import failed: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let port = config.port;
    match server::serve(AppState::new(db, config), port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
