use serde::Deserialize;
use serde_json::{Map, Value};

use crate::property::{payload, RichText};

/// One node of a page's content tree. Children are not embedded; the
/// renderer asks the store for them when `has_children` is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    pub id: String,
    pub has_children: bool,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph(Vec<RichText>),
    Heading1(Vec<RichText>),
    Heading2(Vec<RichText>),
    Heading3(Vec<RichText>),
    BulletedListItem(Vec<RichText>),
    NumberedListItem(Vec<RichText>),
    ToDo {
        text: Vec<RichText>,
        checked: bool,
    },
    Quote(Vec<RichText>),
    Callout(Vec<RichText>),
    Code {
        text: Vec<RichText>,
        language: Option<String>,
    },
    Divider,
    Image {
        file: FileObject,
        caption: Vec<RichText>,
    },
    Unsupported(String),
}

/// Where an image lives: linked from elsewhere, or uploaded to the store
/// (served from a short-lived signed URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileObject {
    External { url: String },
    Uploaded { url: String },
}

impl FileObject {
    pub fn url(&self) -> &str {
        match self {
            FileObject::External { url } | FileObject::Uploaded { url } => url,
        }
    }
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            has_children: false,
            kind,
        }
    }

    pub fn type_name(&self) -> &str {
        match &self.kind {
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::Heading1(_) => "heading_1",
            BlockKind::Heading2(_) => "heading_2",
            BlockKind::Heading3(_) => "heading_3",
            BlockKind::BulletedListItem(_) => "bulleted_list_item",
            BlockKind::NumberedListItem(_) => "numbered_list_item",
            BlockKind::ToDo { .. } => "to_do",
            BlockKind::Quote(_) => "quote",
            BlockKind::Callout(_) => "callout",
            BlockKind::Code { .. } => "code",
            BlockKind::Divider => "divider",
            BlockKind::Image { .. } => "image",
            BlockKind::Unsupported(kind) => kind,
        }
    }
}

#[derive(Deserialize)]
struct RawBlock {
    id: String,
    #[serde(default)]
    has_children: bool,
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Default, Deserialize)]
struct TextPayload {
    #[serde(default)]
    rich_text: Vec<RichText>,
}

#[derive(Default, Deserialize)]
struct ToDoPayload {
    #[serde(default)]
    rich_text: Vec<RichText>,
    #[serde(default)]
    checked: bool,
}

#[derive(Default, Deserialize)]
struct CodePayload {
    #[serde(default)]
    rich_text: Vec<RichText>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Deserialize)]
struct UrlRef {
    url: String,
}

#[derive(Default, Deserialize)]
struct ImagePayload {
    #[serde(rename = "type", default)]
    source: String,
    #[serde(default)]
    external: Option<UrlRef>,
    #[serde(default)]
    file: Option<UrlRef>,
    #[serde(default)]
    caption: Vec<RichText>,
}

impl TryFrom<RawBlock> for Block {
    type Error = String;

    fn try_from(mut raw: RawBlock) -> Result<Self, Self::Error> {
        let rest = &mut raw.rest;
        let text = |rest: &mut Map<String, Value>, key: &str| {
            payload::<TextPayload>(rest, key).map(|p| p.rich_text)
        };
        let kind = match raw.kind.as_str() {
            "paragraph" => text(rest, "paragraph").map(BlockKind::Paragraph),
            "heading_1" => text(rest, "heading_1").map(BlockKind::Heading1),
            "heading_2" => text(rest, "heading_2").map(BlockKind::Heading2),
            "heading_3" => text(rest, "heading_3").map(BlockKind::Heading3),
            "bulleted_list_item" => {
                text(rest, "bulleted_list_item").map(BlockKind::BulletedListItem)
            }
            "numbered_list_item" => {
                text(rest, "numbered_list_item").map(BlockKind::NumberedListItem)
            }
            "quote" => text(rest, "quote").map(BlockKind::Quote),
            "callout" => text(rest, "callout").map(BlockKind::Callout),
            "to_do" => payload::<ToDoPayload>(rest, "to_do").map(|p| BlockKind::ToDo {
                text: p.rich_text,
                checked: p.checked,
            }),
            "code" => payload::<CodePayload>(rest, "code").map(|p| BlockKind::Code {
                text: p.rich_text,
                language: p.language,
            }),
            "divider" => Ok(BlockKind::Divider),
            "image" => {
                let image = payload::<ImagePayload>(rest, "image").map_err(|e| e.to_string())?;
                let file = match (image.source.as_str(), image.external, image.file) {
                    ("external", Some(ext), _) => FileObject::External { url: ext.url },
                    ("file", _, Some(file)) => FileObject::Uploaded { url: file.url },
                    (source, _, _) => {
                        return Err(format!("image block {} has unusable source {source:?}", raw.id))
                    }
                };
                Ok(BlockKind::Image {
                    file,
                    caption: image.caption,
                })
            }
            _ => Ok(BlockKind::Unsupported(raw.kind.clone())),
        }
        .map_err(|e| e.to_string())?;

        Ok(Block {
            id: raw.id,
            has_children: raw.has_children,
            kind,
        })
    }
}
