//! Buffered (materialize-then-render) baseline.
//!
//! This crate reads the whole result set into memory before writing the
//! first row, the way a naive report generator would. Peak memory grows
//! linearly with the row count, which is what the streaming pipeline in
//! `template-streaming` avoids. Output is byte-identical to the streaming
//! path for the same rows and template.

pub mod buffered;

pub use buffered::{BufferedSummary, collect_records, materialized_size, render_buffered};
