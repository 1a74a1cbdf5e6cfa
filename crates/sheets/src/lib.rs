//! Spreadsheet access for Postgen.
//!
//! Topics live in a three-column range of a spreadsheet: topic text,
//! status, generated content. This crate reads pending topics out of that
//! range and writes generated posts back.
//!
//! # Sources
//! - [`GoogleSheetsSource`]: Google Sheets API v4
//! - [`MemorySheet`]: in-process grid for tests

pub mod auth;
pub mod google;
pub mod memory;
pub mod range;
pub mod source;
pub mod topic;

// Re-export main types
pub use auth::{StaticToken, TokenFile, TokenProvider};
pub use google::GoogleSheetsSource;
pub use memory::MemorySheet;
pub use range::SheetRange;
pub use source::TopicSource;
pub use topic::{parse_rows, pending_topics, RowId, Topic, TopicStatus, STATUS_GENERATED};
