//! Read-only views of a [`DocumentTree`]: HTML for export and plain text
//! for terminals and search.

use crate::tree::{DocumentTree, Image, Mark, Node, Paragraph, TextRun};

/// Options for HTML rendering
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// One block per line, indented
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
    /// Wrap the blocks in an `<article>` element
    pub wrap: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
            wrap: false,
        }
    }
}

impl RenderOptions {
    pub fn compact() -> Self {
        Self {
            pretty: false,
            ..Self::default()
        }
    }
}

struct Context {
    options: RenderOptions,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new(options: RenderOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn start_line(&mut self) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.buffer.push_str(&self.options.indent);
            }
        }
    }

    fn end_line(&mut self) {
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Render the tree as an HTML fragment
pub fn to_html(tree: &DocumentTree, options: RenderOptions) -> String {
    let mut ctx = Context::new(options);
    let wrap = ctx.options.wrap;

    if wrap {
        ctx.start_line();
        ctx.add("<article>");
        ctx.end_line();
        ctx.indent();
    }

    for node in tree.nodes() {
        match node {
            Node::Paragraph(paragraph) => render_paragraph(paragraph, &mut ctx),
            Node::Image(image) => render_image(image, &mut ctx),
            Node::Unknown(unknown) => {
                tracing::trace!(kind = ?unknown.kind(), "skipping unknown node");
            }
        }
    }

    if wrap {
        ctx.dedent();
        ctx.start_line();
        ctx.add("</article>");
        ctx.end_line();
    }

    ctx.get_output()
}

fn render_paragraph(paragraph: &Paragraph, ctx: &mut Context) {
    ctx.start_line();
    ctx.add("<p>");
    for run in &paragraph.children {
        render_run(run, ctx);
    }
    ctx.add("</p>");
    ctx.end_line();
}

fn render_run(run: &TextRun, ctx: &mut Context) {
    if run.is_empty() {
        return;
    }

    let tags: Vec<&str> = run.marks.iter().map(mark_tag).collect();
    for tag in &tags {
        ctx.add(&format!("<{}>", tag));
    }
    ctx.add(&escape_html(&run.text));
    for tag in tags.iter().rev() {
        ctx.add(&format!("</{}>", tag));
    }
}

fn render_image(image: &Image, ctx: &mut Context) {
    ctx.start_line();
    ctx.add(&format!(
        "<img src=\"{}\" style=\"width: {};\" />",
        escape_html(&image.url),
        image.width
    ));
    ctx.end_line();
}

fn mark_tag(mark: Mark) -> &'static str {
    match mark {
        Mark::Bold => "strong",
        Mark::Italic => "em",
        Mark::Underline => "u",
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Paragraph text one per line; images show as `[image]`
pub fn to_plain_text(tree: &DocumentTree) -> String {
    tree.nodes()
        .iter()
        .filter_map(|node| match node {
            Node::Paragraph(paragraph) => Some(paragraph.text()),
            Node::Image(_) => Some("[image]".to_string()),
            Node::Unknown(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
