use std::fmt;

use chrono::{DateTime, Utc};

use crate::{Ledger, Page, PropertyError, PropertyValue};

/// Which properties decide whether a page is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishGate {
    pub status_property: String,
    pub publishable_status: String,
    pub title_property: String,
}

impl Default for PublishGate {
    fn default() -> Self {
        Self {
            status_property: "Status".to_string(),
            publishable_status: "online".to_string(),
            title_property: "Name".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render { title: String },
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingStatus,
    StatusTypeMismatch { found: String },
    NotPublishable { status: Option<String> },
    MalformedTitle(PropertyError),
    Unchanged { recorded: DateTime<Utc> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingStatus => write!(f, "status property missing"),
            SkipReason::StatusTypeMismatch { found } => {
                write!(f, "status property has type {found}, expected select")
            }
            SkipReason::NotPublishable { status: Some(status) } => {
                write!(f, "status is {status:?}")
            }
            SkipReason::NotPublishable { status: None } => write!(f, "status is unset"),
            SkipReason::MalformedTitle(err) => write!(f, "unusable title: {err}"),
            SkipReason::Unchanged { recorded } => {
                write!(f, "no updates since {}", recorded.to_rfc3339())
            }
        }
    }
}

/// Pure gate for one page: status first, then title, then the ledger.
///
/// Status is checked before the ledger, so an unpublished page is never
/// rendered whatever the ledger holds.
pub fn decide(gate: &PublishGate, ledger: &Ledger, page: &Page) -> Decision {
    let status = match page.properties.get(&gate.status_property) {
        None => return Decision::Skip(SkipReason::MissingStatus),
        Some(PropertyValue::Select(option)) => option.as_ref().map(|o| o.name.as_str()),
        Some(other) => {
            return Decision::Skip(SkipReason::StatusTypeMismatch {
                found: other.kind().to_string(),
            })
        }
    };
    if status != Some(gate.publishable_status.as_str()) {
        return Decision::Skip(SkipReason::NotPublishable {
            status: status.map(str::to_string),
        });
    }

    let title = match page.title_text(&gate.title_property) {
        Ok(title) => title.to_string(),
        Err(err) => return Decision::Skip(SkipReason::MalformedTitle(err)),
    };

    if !ledger.needs_render(&page.id, page.last_edited_time) {
        return Decision::Skip(SkipReason::Unchanged {
            recorded: page.last_edited_time,
        });
    }

    Decision::Render { title }
}
