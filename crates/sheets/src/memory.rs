//! In-memory topic source.
//!
//! Holds the cells of the topic range as a grid whose first row is the
//! range anchor and whose first three columns are topic, status, content.

use crate::range::SheetRange;
use crate::source::{ensure_content, TopicSource};
use crate::topic::{pending_topics, RowId, Topic, STATUS_GENERATED};
use postgen_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct MemorySheet {
    anchor_row: u32,
    rows: Mutex<Vec<Vec<String>>>,
    commits: AtomicUsize,
}

impl MemorySheet {
    /// Grid anchored at row 2, like the default `A2:C` range.
    pub fn new<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self::anchored(2, rows)
    }

    pub fn with_range<R, C>(range: &SheetRange, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self::anchored(range.anchor_row, rows)
    }

    fn anchored<R, C>(anchor_row: u32, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self {
            anchor_row,
            rows: Mutex::new(rows),
            commits: AtomicUsize::new(0),
        }
    }

    /// Copy of the current grid.
    pub async fn snapshot(&self) -> Vec<Vec<String>> {
        self.rows.lock().await.clone()
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TopicSource for MemorySheet {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_pending(&self) -> AppResult<Vec<Topic>> {
        let rows = self.rows.lock().await;
        Ok(pending_topics(&rows, self.anchor_row))
    }

    async fn commit(&self, row: RowId, content: &str) -> AppResult<()> {
        ensure_content(row, content)?;

        let outside = || AppError::Source(format!("Row {} is outside the sheet", row));
        let idx = row.0.checked_sub(self.anchor_row).ok_or_else(outside)? as usize;

        let mut rows = self.rows.lock().await;
        let cells = rows.get_mut(idx).ok_or_else(outside)?;

        if cells.len() < 3 {
            cells.resize(3, String::new());
        }
        cells[1] = STATUS_GENERATED.to_string();
        cells[2] = content.to_string();

        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
