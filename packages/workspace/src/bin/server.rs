use anyhow::Context;
use clap::Parser;
use folio_store::{DocumentStore, FileStore, MemoryStore};
use folio_workspace::{app, ServeOptions, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "folio-server")]
#[command(about = "REST server for Folio documents", long_about = None)]
#[command(version)]
struct Args {
    /// Directory holding folio.config.json; relative paths resolve against it
    #[arg(default_value = ".")]
    root_dir: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Directory of stored documents
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory served at /uploads
    #[arg(long)]
    uploads_dir: Option<PathBuf>,

    /// Keep documents in memory only
    #[arg(long, conflicts_with = "data_dir")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::load(&args.root_dir)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    let data_dir = args.data_dir.or_else(|| config.data_dir(&args.root_dir));
    let uploads_dir = args.uploads_dir.or_else(|| config.uploads_dir(&args.root_dir));

    let store: Arc<dyn DocumentStore> = match data_dir {
        Some(dir) if !args.memory => Arc::new(FileStore::open(dir).await?),
        _ => {
            tracing::warn!("no data directory configured, documents are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let app = app(store, &ServeOptions { uploads_dir });
    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    tracing::info!(%address, "folio server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
