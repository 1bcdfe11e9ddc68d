use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat};
use mirror_core::{Page, PropertyError};
use serde::Serialize;

use crate::hooks::{HeaderHook, HookError};

/// Front matter of a published post. `aliases` is always empty for now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderMeta {
    pub title: String,
    pub description: String,
    pub date: String,
    pub images: Vec<String>,
    pub aliases: Vec<String>,
}

/// `---\n{yaml}---\n\n# {title}`
pub fn build_front_matter(meta: &HeaderMeta) -> Result<String, HookError> {
    let yaml = serde_yaml::to_string(meta).map_err(|err| HookError::Serialize(err.to_string()))?;
    Ok(format!("---\n{yaml}---\n\n# {title}", title = meta.title))
}

/// Names of the page properties the header is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderProperties {
    pub title: String,
    pub description: String,
    pub images: String,
    pub date: String,
}

impl Default for HeaderProperties {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            description: "Description".to_string(),
            images: "Images".to_string(),
            date: "Release".to_string(),
        }
    }
}

/// Header hook for published posts.
///
/// The title is required. Description, images and date may be absent from
/// the page or empty; present with the wrong type is an error.
#[derive(Debug, Clone, Default)]
pub struct PublishingHeader {
    properties: HeaderProperties,
}

impl PublishingHeader {
    pub fn new(properties: HeaderProperties) -> Self {
        Self { properties }
    }

    pub fn meta(&self, page: &Page) -> Result<HeaderMeta, PropertyError> {
        let names = &self.properties;
        let title = page.title_text(&names.title)?.to_string();
        let description = optional(page.first_rich_text(&names.description))?
            .unwrap_or_default()
            .to_string();
        let images = optional(page.first_rich_text(&names.images))?
            .map(|image| vec![image.to_string()])
            .unwrap_or_default();
        let date = optional(page.date_start(&names.date))?
            .map(format_release_date)
            .unwrap_or_default();

        Ok(HeaderMeta {
            title,
            description,
            date,
            images,
            aliases: Vec::new(),
        })
    }
}

impl HeaderHook for PublishingHeader {
    fn header(&self, page: &Page) -> Result<String, HookError> {
        let meta = self.meta(page)?;
        build_front_matter(&meta)
    }
}

/// RFC 3339 at second precision. A date without a time is midnight UTC; a
/// datetime keeps its offset. Unparseable input is passed through.
fn format_release_date(start: &str) -> String {
    if let Ok(at) = DateTime::parse_from_rfc3339(start) {
        return at.to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    match NaiveDate::parse_from_str(start, "%Y-%m-%d") {
        Ok(day) => day
            .and_time(NaiveTime::MIN)
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Err(_) => start.to_string(),
    }
}

fn optional<T>(result: Result<Option<T>, PropertyError>) -> Result<Option<T>, PropertyError> {
    match result {
        Err(PropertyError::Missing { .. }) => Ok(None),
        other => other,
    }
}
