//! Materialize every record, then render.

use std::io::Write;
use std::mem;
use std::ops::ControlFlow;

use template_streaming::{Record, Result, RowSource, RowTemplate};
use tracing::info;

/// What a buffered render held and wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferedSummary {
    pub rows: u64,
    /// Estimated bytes held by the materialized result set.
    pub materialized_bytes: usize,
}

/// Read every record of `source` into memory, in source order.
pub fn collect_records<S: RowSource + ?Sized>(source: &mut S) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    source.scan_records(&mut |record| {
        records.push(record);
        ControlFlow::Continue(())
    })?;
    Ok(records)
}

/// Estimated memory held by `records`: the vector, each record and the
/// string contents.
pub fn materialized_size(records: &[Record]) -> usize {
    mem::size_of::<Vec<Record>>()
        + records.len() * mem::size_of::<Record>()
        + records.iter().map(Record::heap_size).sum::<usize>()
}

/// Collect all rows, then render them with `template`.
pub fn render_buffered<S, W>(
    source: &mut S,
    template: &RowTemplate,
    sink: &mut W,
) -> Result<BufferedSummary>
where
    S: RowSource + ?Sized,
    W: Write + ?Sized,
{
    let records = collect_records(source)?;
    let materialized_bytes = materialized_size(&records);
    info!(rows = records.len(), materialized_bytes, "materialized result set");

    template.write_header(sink)?;
    for record in &records {
        template.write_row(record, sink)?;
    }
    template.write_footer(sink)?;
    sink.flush()?;

    Ok(BufferedSummary {
        rows: records.len() as u64,
        materialized_bytes,
    })
}
