use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{deserialize_or_default, to_html, to_plain_text, RenderOptions};
use folio_store::{DocumentRecord, DocumentStore};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Document id
    pub id: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit everything on one line
    #[arg(long)]
    pub compact: bool,
}

async fn load<S: DocumentStore>(store: &S, id: &str) -> Result<DocumentRecord> {
    store
        .read(id)
        .await
        .with_context(|| format!("failed to load document {}", id))
}

pub async fn show<S: DocumentStore>(store: &S, id: &str, out: &mut impl Write) -> Result<()> {
    let record = load(store, id).await?;
    let tree = deserialize_or_default(&record.content);

    writeln!(out, "{}", record.title.bold())?;
    writeln!(out)?;
    writeln!(out, "{}", to_plain_text(&tree))?;
    Ok(())
}

pub async fn export<S: DocumentStore>(store: &S, args: ExportArgs, out: &mut impl Write) -> Result<()> {
    let record = load(store, &args.id).await?;
    let tree = deserialize_or_default(&record.content);

    let options = if args.compact {
        RenderOptions::compact()
    } else {
        RenderOptions {
            wrap: true,
            ..RenderOptions::default()
        }
    };
    let html = to_html(&tree, options);

    match args.out {
        Some(path) => {
            tokio::fs::write(&path, &html)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "{} Exported {} to {}", "✓".green(), record.title, path.display())?;
        }
        None => writeln!(out, "{}", html)?,
    }
    Ok(())
}
