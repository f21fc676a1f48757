//! Row sources.
//!
//! A row source is an ordered, finite, lazily produced sequence of rows. The
//! pipeline only ever asks it to scan from the start, handing each row to a
//! visitor; the visitor returns `ControlFlow::Break` to stop the scan before
//! the next row is fetched.

use std::ops::ControlFlow;

use crate::error::Result;
use crate::record::{Line, Record};

/// Visitor invoked once per row, in source order.
pub type Visit<'a, T> = &'a mut dyn FnMut(T) -> ControlFlow<()>;

/// Something that can produce user rows.
pub trait RowSource {
    /// Scan rows decoded field by field.
    fn scan_records(&mut self, visit: Visit<'_, Record>) -> Result<()>;

    /// Scan rows pre-joined by the source into one delimited string each.
    fn scan_lines(&mut self, delimiter: char, visit: Visit<'_, Line>) -> Result<()>;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn scan_records(&mut self, visit: Visit<'_, Record>) -> Result<()> {
        (**self).scan_records(visit)
    }

    fn scan_lines(&mut self, delimiter: char, visit: Visit<'_, Line>) -> Result<()> {
        (**self).scan_lines(delimiter, visit)
    }
}

/// An item type that can travel through the pipeline.
pub trait RowPayload: Send + Sized {
    /// Scan `source` yielding this payload type.
    fn scan<S: RowSource + ?Sized>(
        source: &mut S,
        delimiter: char,
        visit: Visit<'_, Self>,
    ) -> Result<()>;
}

impl RowPayload for Record {
    fn scan<S: RowSource + ?Sized>(
        source: &mut S,
        _delimiter: char,
        visit: Visit<'_, Self>,
    ) -> Result<()> {
        source.scan_records(visit)
    }
}

impl RowPayload for Line {
    fn scan<S: RowSource + ?Sized>(
        source: &mut S,
        delimiter: char,
        visit: Visit<'_, Self>,
    ) -> Result<()> {
        source.scan_lines(delimiter, visit)
    }
}

/// Rows held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    rows: Vec<Record>,
}

impl MemorySource {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }
}

impl FromIterator<Record> for MemorySource {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl RowSource for MemorySource {
    fn scan_records(&mut self, visit: Visit<'_, Record>) -> Result<()> {
        for row in &self.rows {
            if visit(row.clone()).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn scan_lines(&mut self, delimiter: char, visit: Visit<'_, Line>) -> Result<()> {
        for row in &self.rows {
            if visit(row.to_line(delimiter)).is_break() {
                break;
            }
        }
        Ok(())
    }
}
