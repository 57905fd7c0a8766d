use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use device_snapshot::config::{DEFAULT_COLLECTION, DEFAULT_DATABASE};
use device_snapshot::devices::{self, OutputFormat};
use device_snapshot::SnapshotOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Print every document of a Firestore collection as JSON",
    long_about = None
)]
struct Cli {
    /// Service account key file
    #[arg(short, long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: PathBuf,

    /// Collection to read
    #[arg(long, env = "DEVICE_SNAPSHOT_COLLECTION", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Firestore database id
    #[arg(long, env = "DEVICE_SNAPSHOT_DATABASE", default_value = DEFAULT_DATABASE)]
    database: String,

    /// Talk to a local Firestore emulator at HOST:PORT instead of production
    #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
    emulator_host: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

impl Cli {
    fn options(&self) -> SnapshotOptions {
        SnapshotOptions::new(&self.credentials)
            .with_collection(&self.collection)
            .with_database(&self.database)
            .with_emulator_host(self.emulator_host.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = cli.options();

    let client = devices::initialize(&options)
        .await
        .context("failed to connect to Firestore")?;
    let snapshot = devices::fetch_all(&client, &options.collection)
        .await
        .with_context(|| format!("failed to read collection '{}'", options.collection))?;

    let stdout = std::io::stdout();
    devices::report(&snapshot, cli.format, &mut stdout.lock()).context("failed to write report")?;

    info!(documents = snapshot.len(), "done");
    Ok(())
}
