//! The topic source seam.

use crate::topic::{RowId, Topic};
use postgen_core::{AppError, AppResult};

/// A spreadsheet-like store of topics.
///
/// `commit` writes the status and content cells of one row in a single
/// operation and touches nothing else. Committing the same content twice
/// leaves the row unchanged.
#[async_trait::async_trait]
pub trait TopicSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Read the range and return the topics that still need a post, in
    /// row order.
    async fn fetch_pending(&self) -> AppResult<Vec<Topic>>;

    /// Mark `row` as generated and store `content` next to it.
    async fn commit(&self, row: RowId, content: &str) -> AppResult<()>;
}

/// Refuse to mark a row generated without content.
pub(crate) fn ensure_content(row: RowId, content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::Source(format!(
            "Refusing to mark row {} as generated with empty content",
            row
        )));
    }
    Ok(())
}
