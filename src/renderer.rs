//! Streaming renderer: the downstream half of a pipeline run.
//!
//! Each popped item is written to the sink before the next pop, so at most
//! one item is held here regardless of how many rows the stream carries.

use std::io::Write;

use tracing::debug;

use crate::channel::{Pop, StreamReceiver};
use crate::error::{PipelineError, Result};
use crate::record::{Line, Record};
use crate::template::RowTemplate;

/// Render a stream of structured records, returning the number of rows.
pub fn render_records<W: Write + ?Sized>(
    rx: StreamReceiver<Record>,
    template: &RowTemplate,
    sink: &mut W,
) -> Result<u64> {
    drain(rx, template, sink, |record, out| template.write_row(record, out))
}

/// Render a stream of pre-formatted lines, returning the number of rows.
///
/// Each line is split on `delimiter` and substituted into the same row
/// pattern as a record would be.
pub fn render_lines<W: Write + ?Sized>(
    rx: StreamReceiver<Line>,
    template: &RowTemplate,
    delimiter: char,
    sink: &mut W,
) -> Result<u64> {
    drain(rx, template, sink, |line, out| {
        template.write_row(&line.split_fields(delimiter)?, out)
    })
}

fn drain<T, W, F>(
    rx: StreamReceiver<T>,
    template: &RowTemplate,
    sink: &mut W,
    mut write_row: F,
) -> Result<u64>
where
    W: Write + ?Sized,
    F: FnMut(&T, &mut W) -> Result<()>,
{
    template.write_header(sink)?;
    let mut rows = 0u64;
    loop {
        match rx.pop() {
            Pop::Item(item) => {
                write_row(&item, sink)?;
                rows += 1;
            }
            Pop::End => break,
            Pop::Aborted => {
                debug!(rows, "renderer saw aborted stream");
                return Err(PipelineError::StreamAborted);
            }
        }
    }
    template.write_footer(sink)?;
    sink.flush()?;
    debug!(rows, "renderer reached end of stream");
    Ok(rows)
}
