//! casedesk server binary.
//!
//! Start the server with:
//! ```bash
//! cargo run -p casedesk-api -- --port 8080 --seed-rules
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use casedesk_api::{serve, ApiConfig, AppState};
use casedesk_core::{config, default_rules};
use casedesk_intake::{IntakeConfig, IntakeService};
use casedesk_persistence::{FileStore, SupportStore};
use tracing_subscriber::EnvFilter;

/// casedesk - conversational support ticket intake
#[derive(Parser, Debug)]
#[command(name = "casedesk")]
#[command(about = "Support ticket intake server with priority classification and SLA tracking")]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "CASEDESK_HOST")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "8080", env = "CASEDESK_PORT")]
    port: u16,

    /// Data directory for the file store (default: <state dir>/data)
    #[arg(long, env = "CASEDESK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Delay before deferred bot replies, in milliseconds
    #[arg(long, default_value = "3000")]
    typing_delay_ms: u64,

    /// Delay before ticket creation starts, in milliseconds
    #[arg(long, default_value = "800")]
    creation_delay_ms: u64,

    /// Allowed CORS origin (repeatable; default allows any)
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,

    /// Write the default SLA rule set if the store has none
    #[arg(long)]
    seed_rules: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the config directory first, then a local .env
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = match args.verbose {
        0 => "casedesk=info,casedesk_api=info,casedesk_intake=info,tower_http=warn",
        1 => "casedesk=debug,casedesk_api=debug,casedesk_intake=debug,casedesk_persistence=debug,tower_http=info",
        2 => "casedesk=trace,casedesk_api=trace,casedesk_intake=trace,casedesk_persistence=trace,tower_http=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create all directories");
    }

    let data_dir = args.data_dir.clone().unwrap_or_else(config::data_dir);
    let store = Arc::new(FileStore::new(&data_dir));
    tracing::info!(data_dir = %data_dir.display(), "Using file store");

    if args.seed_rules {
        if store.list_sla_rules()?.is_empty() {
            let rules = default_rules();
            store.save_sla_rules(&rules)?;
            tracing::info!(count = rules.len(), "Seeded default SLA rules");
        } else {
            tracing::info!("SLA rules already present, not seeding");
        }
    }

    let intake_config = IntakeConfig::default()
        .with_typing_delay(Duration::from_millis(args.typing_delay_ms))
        .with_creation_delay(Duration::from_millis(args.creation_delay_ms));
    let intake = IntakeService::new(store).with_config(intake_config);

    let mut api_config = ApiConfig::new(args.host, args.port);
    if !args.cors_origins.is_empty() {
        api_config = api_config.with_cors_origins(args.cors_origins);
    }

    println!("\ncasedesk v{}", env!("CARGO_PKG_VERSION"));
    println!("   Listening on http://{}", api_config.bind_address());
    println!("   Data: {}", data_dir.display());
    println!("   Press Ctrl+C to stop\n");

    let state = AppState::new(api_config.clone(), intake);
    serve(api_config, state).await?;

    Ok(())
}
