use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

pub type PageId = String;

/// A page row of a database, as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RichText {
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

/// A typed property value. Kinds this crate does not consume keep their
/// store type name in `Other` so diagnostics can report it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawProperty")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Select(Option<SelectOption>),
    Date(Option<DateValue>),
    Other(String),
}

impl PropertyValue {
    pub fn kind(&self) -> &str {
        match self {
            PropertyValue::Title(_) => "title",
            PropertyValue::RichText(_) => "rich_text",
            PropertyValue::Select(_) => "select",
            PropertyValue::Date(_) => "date",
            PropertyValue::Other(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("property {name:?} is missing")]
    Missing { name: String },
    #[error("property {name:?} has type {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: String,
    },
    #[error("property {name:?} has no text")]
    Empty { name: String },
}

impl Page {
    pub fn property(&self, name: &str) -> Result<&PropertyValue, PropertyError> {
        self.properties.get(name).ok_or_else(|| PropertyError::Missing {
            name: name.to_string(),
        })
    }

    /// Selected option name. `Ok(None)` when the select is unset.
    pub fn select_name(&self, name: &str) -> Result<Option<&str>, PropertyError> {
        match self.property(name)? {
            PropertyValue::Select(option) => Ok(option.as_ref().map(|o| o.name.as_str())),
            other => Err(mismatch(name, "select", other)),
        }
    }

    /// First run of a title property. A title with no runs is an error.
    pub fn title_text(&self, name: &str) -> Result<&str, PropertyError> {
        match self.property(name)? {
            PropertyValue::Title(runs) => runs
                .first()
                .map(|run| run.plain_text.as_str())
                .filter(|text| !text.is_empty())
                .ok_or_else(|| PropertyError::Empty {
                    name: name.to_string(),
                }),
            other => Err(mismatch(name, "title", other)),
        }
    }

    /// First run of a rich-text property, `Ok(None)` when it has no runs.
    pub fn first_rich_text(&self, name: &str) -> Result<Option<&str>, PropertyError> {
        match self.property(name)? {
            PropertyValue::RichText(runs) => Ok(runs.first().map(|run| run.plain_text.as_str())),
            other => Err(mismatch(name, "rich_text", other)),
        }
    }

    pub fn date_start(&self, name: &str) -> Result<Option<&str>, PropertyError> {
        match self.property(name)? {
            PropertyValue::Date(date) => Ok(date.as_ref().map(|d| d.start.as_str())),
            other => Err(mismatch(name, "date", other)),
        }
    }
}

fn mismatch(name: &str, expected: &'static str, found: &PropertyValue) -> PropertyError {
    PropertyError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind().to_string(),
    }
}

/// Wire shape: `{"id": .., "type": "<kind>", "<kind>": <payload>}`.
#[derive(Deserialize)]
struct RawProperty {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// A payload that does not match its declared type is kept as
/// `Other("malformed <kind>")`, so only the pages that read it are affected.
impl From<RawProperty> for PropertyValue {
    fn from(mut raw: RawProperty) -> Self {
        let parsed = match raw.kind.as_str() {
            "title" => payload(&mut raw.rest, "title").map(PropertyValue::Title),
            "rich_text" => payload(&mut raw.rest, "rich_text").map(PropertyValue::RichText),
            "select" => payload(&mut raw.rest, "select").map(PropertyValue::Select),
            "date" => payload(&mut raw.rest, "date").map(PropertyValue::Date),
            _ => return PropertyValue::Other(raw.kind),
        };
        parsed.unwrap_or_else(|_| PropertyValue::Other(format!("malformed {}", raw.kind)))
    }
}

/// Takes `key` out of a flattened object; absent or null yields the default.
pub(crate) fn payload<T: DeserializeOwned + Default>(
    rest: &mut Map<String, Value>,
    key: &str,
) -> Result<T, serde_json::Error> {
    match rest.remove(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn page(properties: Value) -> Page {
        serde_json::from_value(json!({
            "object": "page",
            "id": "p1",
            "last_edited_time": "2024-03-01T10:00:00.000Z",
            "properties": properties,
        }))
        .unwrap()
    }

    #[test]
    fn parses_known_property_kinds() {
        let page = page(json!({
            "Status": {"id": "a", "type": "select", "select": {"id": "x", "name": "online", "color": "green"}},
            "Name": {"id": "title", "type": "title", "title": [{"type": "text", "plain_text": "Hello World"}]},
            "Release": {"id": "b", "type": "date", "date": {"start": "2024-02-29", "end": null}},
            "Tags": {"id": "c", "type": "multi_select", "multi_select": []},
        }));

        assert_eq!(page.select_name("Status").unwrap(), Some("online"));
        assert_eq!(page.title_text("Name").unwrap(), "Hello World");
        assert_eq!(page.date_start("Release").unwrap(), Some("2024-02-29"));
        assert_eq!(page.property("Tags").unwrap().kind(), "multi_select");
    }

    #[test]
    fn null_payloads_are_empty_values() {
        let page = page(json!({
            "Status": {"type": "select", "select": null},
            "Release": {"type": "date", "date": null},
            "Description": {"type": "rich_text", "rich_text": []},
        }));

        assert_eq!(page.select_name("Status").unwrap(), None);
        assert_eq!(page.date_start("Release").unwrap(), None);
        assert_eq!(page.first_rich_text("Description").unwrap(), None);
    }

    #[test]
    fn extraction_reports_shape_errors() {
        let page = page(json!({
            "Name": {"type": "rich_text", "rich_text": []},
            "Empty": {"type": "title", "title": []},
        }));

        assert_eq!(
            page.title_text("Name").unwrap_err(),
            PropertyError::TypeMismatch {
                name: "Name".into(),
                expected: "title",
                found: "rich_text".into(),
            }
        );
        assert_eq!(
            page.title_text("Empty").unwrap_err(),
            PropertyError::Empty {
                name: "Empty".into()
            }
        );
        assert_eq!(
            page.select_name("Status").unwrap_err(),
            PropertyError::Missing {
                name: "Status".into()
            }
        );
    }

    #[test]
    fn malformed_payload_only_affects_its_property() {
        let page = page(json!({
            "Status": {"type": "select", "select": "online"},
            "Name": {"type": "title", "title": [{"plain_text": "Still Fine"}]},
        }));

        assert_eq!(page.property("Status").unwrap().kind(), "malformed select");
        assert!(matches!(
            page.select_name("Status"),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert_eq!(page.title_text("Name").unwrap(), "Still Fine");
    }
}
