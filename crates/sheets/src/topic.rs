//! Topic rows and their status.

use std::fmt;

/// Status cell value written once a post has been generated.
pub const STATUS_GENERATED: &str = "Generated";

/// 1-based spreadsheet row number of a topic.
///
/// Derived from the row's position relative to the range anchor, so it is
/// stable across reads as long as rows are not inserted above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u32);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Processing status of a topic row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicStatus {
    #[default]
    Pending,
    Generated,
}

impl TopicStatus {
    /// Interpret a status cell. Anything other than "Generated" is pending.
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim() == STATUS_GENERATED {
            Self::Generated
        } else {
            Self::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// One row of the topic range.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// Topic text, trimmed
    pub text: String,

    /// Sheet row the topic was read from
    pub row: RowId,

    pub status: TopicStatus,

    /// Content cell, if the row already has one
    pub generated_content: Option<String>,
}

impl Topic {
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }
}

/// Turn raw range values into topics.
///
/// `values[i]` is sheet row `anchor_row + i`. Short rows are padded, rows
/// whose topic cell is blank are skipped without shifting the numbering of
/// later rows. Rows numbered past `u32::MAX` are dropped. Both pending and
/// generated topics are returned.
pub fn parse_rows(values: &[Vec<String>], anchor_row: u32) -> Vec<Topic> {
    values
        .iter()
        .enumerate()
        .filter_map(|(offset, cells)| {
            let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or("");

            let text = cell(0).trim();
            if text.is_empty() {
                return None;
            }

            let row = u32::try_from(offset)
                .ok()
                .and_then(|offset| anchor_row.checked_add(offset))?;

            let content = cell(2);
            Some(Topic {
                text: text.to_string(),
                row: RowId(row),
                status: TopicStatus::from_cell(cell(1)),
                generated_content: (!content.trim().is_empty()).then(|| content.to_string()),
            })
        })
        .collect()
}

/// Only the topics that still need a post.
pub fn pending_topics(values: &[Vec<String>], anchor_row: u32) -> Vec<Topic> {
    parse_rows(values, anchor_row)
        .into_iter()
        .filter(Topic::is_pending)
        .collect()
}
