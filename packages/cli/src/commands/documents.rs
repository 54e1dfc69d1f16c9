use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{serialize, DocumentTree, Node};
use folio_store::{DocumentDraft, DocumentStore, DEFAULT_TITLE};
use std::io::Write;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Document title
    #[arg(short, long)]
    pub title: Option<String>,

    /// Initial text; each line becomes a paragraph
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Document id
    pub id: String,

    /// New title
    pub title: String,
}

pub async fn list<S: DocumentStore>(store: &S, args: ListArgs, out: &mut impl Write) -> Result<()> {
    let documents = store.list().await.context("failed to list documents")?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&documents)?)?;
        return Ok(());
    }

    if documents.is_empty() {
        writeln!(out, "{}", "No documents".yellow())?;
        return Ok(());
    }

    for document in &documents {
        writeln!(out, "  {}  {}", document.id.cyan(), document.title)?;
    }
    writeln!(out)?;
    writeln!(out, "{} document(s)", documents.len())?;
    Ok(())
}

pub async fn new<S: DocumentStore>(store: &S, args: NewArgs, out: &mut impl Write) -> Result<()> {
    let content = match args.text.as_deref() {
        Some(text) => serialize(&text_tree(text)?)?,
        None => String::new(),
    };
    let title = args
        .title
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let draft = DocumentDraft::new(title, content);

    let record = store.create(draft).await.context("failed to create document")?;
    writeln!(out, "{} Created {} ({})", "✓".green(), record.title.bright_white(), record.id)?;
    Ok(())
}

pub async fn rename<S: DocumentStore>(store: &S, args: RenameArgs, out: &mut impl Write) -> Result<()> {
    let record = store
        .read(&args.id)
        .await
        .with_context(|| format!("failed to load document {}", args.id))?;
    let updated = store
        .update(&record.id, DocumentDraft::new(args.title, record.content))
        .await
        .with_context(|| format!("failed to rename document {}", args.id))?;

    writeln!(out, "{} Renamed {} to {}", "✓".green(), updated.id, updated.title.bright_white())?;
    Ok(())
}

pub async fn delete<S: DocumentStore>(store: &S, id: &str, out: &mut impl Write) -> Result<()> {
    store
        .delete(id)
        .await
        .with_context(|| format!("failed to delete document {}", id))?;
    writeln!(out, "{} Deleted {}", "✓".green(), id)?;
    Ok(())
}

/// One paragraph per line of `text`
fn text_tree(text: &str) -> Result<DocumentTree> {
    if text.is_empty() {
        return Ok(DocumentTree::default());
    }
    Ok(DocumentTree::from_nodes(text.lines().map(Node::paragraph).collect())?)
}
