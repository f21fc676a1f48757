//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use template_streaming::{CancelToken, Line, PipelineError, Record, Result, RowSource, Visit};

pub const HEADER: &str = "| Email | First Name | Last Name | Address | City | Zip |\n\
                          |-------|------------|-----------|---------|------|-----|\n";

pub fn record(i: usize) -> Record {
    Record::new(
        format!("user{i}@example.com"),
        format!("First{i}"),
        format!("Last{i}"),
        format!("{i} Main St"),
        "Springfield",
        format!("{:05}", i % 100_000),
    )
}

pub fn sample_records(n: usize) -> Vec<Record> {
    (0..n).map(record).collect()
}

/// Expected markdown for `records`, built without the template engine.
pub fn expected_markdown(records: &[Record]) -> String {
    let mut out = String::from(HEADER);
    for r in records {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            r.email, r.first_name, r.last_name, r.address, r.city, r.zip
        ));
    }
    out
}

/// Body rows of rendered output, header excluded.
pub fn body_lines(output: &str) -> Vec<&str> {
    output.lines().skip(2).collect()
}

/// In-memory source that counts fetches and can fail or cancel on a row.
#[derive(Debug, Clone)]
pub struct CountingSource {
    rows: usize,
    fetched: Arc<AtomicU64>,
    fail_at: Option<usize>,
    cancel_at: Option<(usize, CancelToken)>,
}

impl CountingSource {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            fetched: Arc::new(AtomicU64::new(0)),
            fail_at: None,
            cancel_at: None,
        }
    }

    /// Fail with `SourceRead` when fetching row `row`.
    pub fn failing_at(mut self, row: usize) -> Self {
        self.fail_at = Some(row);
        self
    }

    /// Cancel `token` while fetching row `row`.
    pub fn cancelling_at(mut self, row: usize, token: CancelToken) -> Self {
        self.cancel_at = Some((row, token));
        self
    }

    /// Handle to the fetch counter, readable while a run is in progress.
    pub fn fetch_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.fetched)
    }

    pub fn fetched(&self) -> u64 {
        self.fetched.load(Ordering::SeqCst)
    }

    fn scan<T>(&mut self, convert: impl Fn(Record) -> T, visit: Visit<'_, T>) -> Result<()> {
        for i in 0..self.rows {
            self.fetched.fetch_add(1, Ordering::SeqCst);
            if let Some((row, token)) = &self.cancel_at
                && *row == i
            {
                token.cancel();
            }
            if self.fail_at == Some(i) {
                return Err(PipelineError::source_read(i as u64, "disk I/O error"));
            }
            if visit(convert(record(i))).is_break() {
                break;
            }
        }
        Ok(())
    }
}

impl RowSource for CountingSource {
    fn scan_records(&mut self, visit: Visit<'_, Record>) -> Result<()> {
        self.scan(|r| r, visit)
    }

    fn scan_lines(&mut self, delimiter: char, visit: Visit<'_, Line>) -> Result<()> {
        self.scan(|r| r.to_line(delimiter), visit)
    }
}

/// Source whose scan panics after `rows` rows.
pub struct PanickingSource {
    pub rows: usize,
}

impl RowSource for PanickingSource {
    fn scan_records(&mut self, visit: Visit<'_, Record>) -> Result<()> {
        for i in 0..self.rows {
            if visit(record(i)).is_break() {
                return Ok(());
            }
        }
        panic!("row decoder exploded");
    }

    fn scan_lines(&mut self, delimiter: char, visit: Visit<'_, Line>) -> Result<()> {
        for i in 0..self.rows {
            if visit(record(i).to_line(delimiter)).is_break() {
                return Ok(());
            }
        }
        panic!("row decoder exploded");
    }
}

/// Sink that accepts `limit` bytes, then fails every write.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub written: Vec<u8>,
    limit: usize,
}

impl FailingSink {
    pub fn after(limit: usize) -> Self {
        Self {
            written: Vec::new(),
            limit,
        }
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() + buf.len() > self.limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that panics on its first write.
#[derive(Debug, Default)]
pub struct PanickingSink;

impl Write for PanickingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        panic!("sink exploded");
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that, on every write, records how far the producer has run ahead
/// of the rows completely written so far.
#[derive(Debug)]
pub struct WatchingSink {
    fetched: Arc<AtomicU64>,
    newlines: u64,
    bytes: usize,
    max_lead: u64,
}

impl WatchingSink {
    pub fn new(fetched: Arc<AtomicU64>) -> Self {
        Self {
            fetched,
            newlines: 0,
            bytes: 0,
            max_lead: 0,
        }
    }

    /// Largest observed difference between fetched and rendered rows.
    pub fn max_lead(&self) -> u64 {
        self.max_lead
    }

    pub fn rows_written(&self) -> u64 {
        self.newlines.saturating_sub(2)
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Write for WatchingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let fetched = self.fetched.load(Ordering::SeqCst);
        let lead = fetched.saturating_sub(self.rows_written());
        self.max_lead = self.max_lead.max(lead);

        self.newlines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        self.bytes += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
