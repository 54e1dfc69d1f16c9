mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{delete, export, list, new, rename, show, ExportArgs, ListArgs, NewArgs, RenameArgs};
use folio_store::{HttpStore, DEFAULT_BASE_URL};
use tracing_subscriber::EnvFilter;

/// Folio CLI - manage documents on a Folio server
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the document API
    #[arg(long, global = true, env = "FOLIO_SERVER", default_value = DEFAULT_BASE_URL)]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored documents
    List(ListArgs),

    /// Print a document as plain text
    Show {
        /// Document id
        id: String,
    },

    /// Render a document to HTML
    Export(ExportArgs),

    /// Create a document
    New(NewArgs),

    /// Change a document's title
    Rename(RenameArgs),

    /// Delete a document
    Delete {
        /// Document id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = HttpStore::new(cli.server);
    let mut out = std::io::stdout();

    let result = match cli.command {
        Command::List(args) => list(&store, args, &mut out).await,
        Command::Show { id } => show(&store, &id, &mut out).await,
        Command::Export(args) => export(&store, args, &mut out).await,
        Command::New(args) => new(&store, args, &mut out).await,
        Command::Rename(args) => rename(&store, args, &mut out).await,
        Command::Delete { id } => delete(&store, &id, &mut out).await,
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
