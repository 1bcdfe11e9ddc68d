use std::sync::Arc;

use futures_util::future::BoxFuture;
use mirror_core::{Block, BlockKind, Page, PropertyValue, RichText};
use mirror_logging::mirror_debug;

use crate::hooks::{ImageContext, RenderOptions};
use crate::{PageStore, RenderError};

/// Renders one page of the store into document bytes.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, page_id: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError>;
}

/// Markdown renderer over a [`PageStore`]: header from the header hook (or a
/// plain `# Title`), then the page's blocks, one paragraph per block.
pub struct BlockRenderer {
    store: Arc<dyn PageStore>,
}

impl BlockRenderer {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    fn render_children<'a>(
        &'a self,
        parent_id: &'a str,
        depth: usize,
        page: &'a Page,
        options: &'a RenderOptions,
        out: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Result<(), RenderError>> {
        Box::pin(async move {
            let blocks = self.store.block_children(parent_id).await?;
            for block in &blocks {
                let chunk = self.render_block(block, page, options).await?;
                let quoted = matches!(block.kind, BlockKind::Quote(_) | BlockKind::Callout(_));

                if block.has_children && quoted {
                    // Children stay inside the same blockquote.
                    let mut inner = Vec::new();
                    self.render_children(&block.id, 0, page, options, &mut inner)
                        .await?;
                    let mut merged = chunk.unwrap_or_default();
                    if !inner.is_empty() {
                        if !merged.is_empty() {
                            merged.push_str("\n>\n");
                        }
                        merged.push_str(&quote(&inner.join("\n\n")));
                    }
                    if !merged.is_empty() {
                        out.push(indent(&merged, depth));
                    }
                    continue;
                }

                if let Some(chunk) = chunk {
                    out.push(indent(&chunk, depth));
                }
                if block.has_children {
                    let child_depth = if nests_children(&block.kind) {
                        depth + 1
                    } else {
                        depth
                    };
                    self.render_children(&block.id, child_depth, page, options, out)
                        .await?;
                }
            }
            Ok(())
        })
    }

    async fn render_block(
        &self,
        block: &Block,
        page: &Page,
        options: &RenderOptions,
    ) -> Result<Option<String>, RenderError> {
        let chunk = match &block.kind {
            BlockKind::Paragraph(text) => {
                let body = rich_text_to_markdown(text);
                if body.trim().is_empty() && options.skip_empty_paragraphs {
                    return Ok(None);
                }
                body
            }
            BlockKind::Heading1(text) => format!("# {}", rich_text_to_markdown(text)),
            BlockKind::Heading2(text) => format!("## {}", rich_text_to_markdown(text)),
            BlockKind::Heading3(text) => format!("### {}", rich_text_to_markdown(text)),
            BlockKind::BulletedListItem(text) => format!("- {}", rich_text_to_markdown(text)),
            BlockKind::NumberedListItem(text) => format!("1. {}", rich_text_to_markdown(text)),
            BlockKind::ToDo { text, checked } => {
                let mark = if *checked { "x" } else { " " };
                format!("- [{mark}] {}", rich_text_to_markdown(text))
            }
            BlockKind::Quote(text) | BlockKind::Callout(text) => quote(&rich_text_to_markdown(text)),
            BlockKind::Code { text, language } => {
                let lang = match language.as_deref() {
                    None | Some("plain text") => "",
                    Some(lang) => lang,
                };
                let code: String = text.iter().map(|run| run.plain_text.as_str()).collect();
                format!("```{lang}\n{code}\n```")
            }
            BlockKind::Divider => "---".to_string(),
            BlockKind::Image { file, caption } => match &options.overrides.image {
                Some(hook) => {
                    let ctx = ImageContext { page, options };
                    hook.resolve(block, &ctx)
                        .await
                        .map_err(|source| RenderError::Image {
                            block_id: block.id.clone(),
                            source,
                        })?
                        .markdown
                }
                None => {
                    let alt = plain_text(caption);
                    let alt = if alt.is_empty() { "image".to_string() } else { alt };
                    format!("![{alt}]({})", file.url())
                }
            },
            BlockKind::Unsupported(kind) => {
                mirror_debug!("Skipping unsupported block {} of type {}", block.id, kind);
                return Ok(None);
            }
        };
        Ok(Some(chunk))
    }
}

#[async_trait::async_trait]
impl Renderer for BlockRenderer {
    async fn render(&self, page_id: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
        let page = self.store.retrieve_page(page_id).await?;

        let header = match &options.overrides.header {
            Some(hook) => hook.header(&page).map_err(RenderError::Header)?,
            None => default_header(&page),
        };

        let mut chunks = Vec::new();
        if !header.is_empty() {
            chunks.push(header);
        }
        self.render_children(&page.id, 0, &page, options, &mut chunks)
            .await?;

        let mut document = chunks.join("\n\n");
        document.push('\n');
        Ok(document.into_bytes())
    }
}

/// Inline Markdown for a run of rich text: code, bold, italic,
/// strikethrough, then link, innermost first.
pub fn rich_text_to_markdown(runs: &[RichText]) -> String {
    let mut out = String::new();
    for run in runs {
        if run.plain_text.is_empty() {
            continue;
        }
        let mut text = run.plain_text.clone();
        let marks = run.annotations;
        if marks.code {
            text = format!("`{text}`");
        }
        if marks.bold {
            text = format!("**{text}**");
        }
        if marks.italic {
            text = format!("_{text}_");
        }
        if marks.strikethrough {
            text = format!("~~{text}~~");
        }
        if let Some(href) = &run.href {
            text = format!("[{text}]({href})");
        }
        out.push_str(&text);
    }
    out
}

fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|run| run.plain_text.as_str()).collect()
}

fn default_header(page: &Page) -> String {
    page.properties
        .values()
        .find_map(|value| match value {
            PropertyValue::Title(runs) => runs.first().map(|run| format!("# {}", run.plain_text)),
            _ => None,
        })
        .unwrap_or_default()
}

fn nests_children(kind: &BlockKind) -> bool {
    matches!(
        kind,
        BlockKind::BulletedListItem(_) | BlockKind::NumberedListItem(_) | BlockKind::ToDo { .. }
    )
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(chunk: &str, depth: usize) -> String {
    if depth == 0 {
        return chunk.to_string();
    }
    let pad = "  ".repeat(depth);
    chunk
        .lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
