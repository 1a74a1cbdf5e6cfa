//! A1-notation ranges.
//!
//! The topic range spans at least three columns: topic, status, content.
//! The first row of the range is the anchor that row numbers are derived
//! from.

use crate::topic::RowId;
use postgen_core::{AppError, AppResult};
use std::fmt;

/// Parsed topic range, e.g. `A2:C` or `'Posts Q3'!B5:D200`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    /// Sheet (tab) name, if the range was qualified with one
    pub sheet: Option<String>,

    /// 1-based column holding the topic text
    pub start_column: u32,

    /// 1-based sheet row of the first range row
    pub anchor_row: u32,

    /// 1-based last column of the range
    pub end_column: u32,

    /// Last row, or `None` for an open-ended range
    pub end_row: Option<u32>,
}

impl SheetRange {
    /// Parse an A1 range.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the range is malformed, has no start
    /// row, or is narrower than three columns.
    pub fn parse(input: &str) -> AppResult<Self> {
        let input = input.trim();
        let invalid =
            |reason: &str| AppError::Config(format!("Invalid sheet range '{}': {}", input, reason));

        let (sheet, cells) = match input.rsplit_once('!') {
            Some((sheet, cells)) => {
                let name = unquote_sheet(sheet).ok_or_else(|| invalid("empty sheet name"))?;
                (Some(name), cells)
            }
            None => (None, input),
        };

        let (start, end) = cells
            .split_once(':')
            .ok_or_else(|| invalid("expected START:END, e.g. A2:C"))?;

        let (start_column, start_row) =
            parse_cell(start).ok_or_else(|| invalid("bad start cell"))?;
        let anchor_row = start_row.ok_or_else(|| invalid("start cell needs a row number"))?;
        let (end_column, end_row) = parse_cell(end).ok_or_else(|| invalid("bad end cell"))?;

        if end_column < start_column + 2 {
            return Err(invalid("range needs topic, status and content columns"));
        }
        if matches!(end_row, Some(end) if end < anchor_row) {
            return Err(invalid("end row is above the start row"));
        }

        Ok(Self {
            sheet,
            start_column,
            anchor_row,
            end_column,
            end_row,
        })
    }

    /// Whether `row` lies inside the range.
    pub fn contains_row(&self, row: RowId) -> bool {
        row.0 >= self.anchor_row && self.end_row.map_or(true, |end| row.0 <= end)
    }

    /// A1 range of the status and content cells of `row`, e.g. `B5:C5`.
    pub fn commit_range(&self, row: RowId) -> String {
        let status = column_letters(self.start_column + 1);
        let content = column_letters(self.start_column + 2);
        format!("{}{}{}:{}{}", self.sheet_prefix(), status, row, content, row)
    }

    fn sheet_prefix(&self) -> String {
        match &self.sheet {
            Some(name) if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                format!("{}!", name)
            }
            Some(name) => format!("'{}'!", name.replace('\'', "''")),
            None => String::new(),
        }
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}:{}",
            self.sheet_prefix(),
            column_letters(self.start_column),
            self.anchor_row,
            column_letters(self.end_column)
        )?;
        if let Some(end) = self.end_row {
            write!(f, "{}", end)?;
        }
        Ok(())
    }
}

fn unquote_sheet(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let name = match raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => raw.to_string(),
    };
    (!name.is_empty()).then_some(name)
}

/// Split `AB12` into (column 28, Some(12)); `C` alone yields (3, None).
fn parse_cell(cell: &str) -> Option<(u32, Option<u32>)> {
    let cell = cell.trim();
    let split = cell.find(|c: char| c.is_ascii_digit()).unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);

    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let column = letters.chars().try_fold(0u32, |acc, c| {
        let value = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc.checked_mul(26)?.checked_add(value)
    })?;

    let row = if digits.is_empty() {
        None
    } else {
        match digits.parse::<u32>() {
            Ok(0) | Err(_) => return None,
            Ok(row) => Some(row),
        }
    };

    Some((column, row))
}

/// 1-based column number to letters: 1 -> A, 27 -> AA.
fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}
