//! LabSight — medical report analysis server.

use std::path::PathBuf;
use std::sync::Arc;

use labsight_core::{LabsightConfig, Vocabulary};
use labsight_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("LABSIGHT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("LabSight — medical report analysis server");
    println!();
    println!("Usage: labsight [command]");
    println!();
    println!("Commands:");
    println!("  (none)     Start the server");
    println!("  help       Show this help message");
    println!();
    println!("Environment:");
    println!("  PORT                           Listen port (default 5500)");
    println!("  LABSIGHT_DATA_DIR              Data directory (default ./data)");
    println!("  LABSIGHT_HEADER_FALLBACK       Enable the table header parser");
    println!("  LABSIGHT_FUZZY_THRESHOLD       Header match threshold (default 70)");
    println!("  LABSIGHT_TESSERACT_CMD         Tesseract executable");
    println!("  GEMINI_API_KEY                 Gemini API key");
    println!("  GEMINI_BASE_URL                Gemini API root (default Google)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'labsight help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = LabsightConfig::from_env(&data_dir)?;
    let vocabulary = Vocabulary::load_or_default(config.vocabulary_file.as_deref())?;
    let port = config.port;

    let state = Arc::new(AppState::new(config, vocabulary));
    if state.narrative_provider().is_err() {
        info!("No Gemini API key configured; narrative endpoints will return 503");
    }

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("LabSight server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
