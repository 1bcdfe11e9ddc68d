//! Mirror core: page model, publish gate and export ledger. No IO.
mod block;
mod decision;
mod ledger;
mod property;
mod slug;

pub use block::{Block, BlockKind, FileObject};
pub use decision::{decide, Decision, PublishGate, SkipReason};
pub use ledger::Ledger;
pub use property::{
    Annotations, DateValue, Page, PageId, PropertyError, PropertyValue, RichText, SelectOption,
};
pub use slug::sanitize_title;
