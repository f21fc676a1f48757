//! Row producer: the upstream half of a pipeline run.
//!
//! Scans the row source and pushes one payload per row into the channel.
//! The cancellation token is checked before every push and again after it,
//! so once cancellation is observed no further row is fetched. A fetch that
//! was already in flight completes and its row is dropped.

use std::ops::ControlFlow;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::channel::StreamSender;
use crate::error::{PipelineError, Result};
use crate::source::{RowPayload, RowSource};

/// Push every row of `source` into `tx`, returning the number pushed.
///
/// The channel is closed on success and aborted on any failure, exactly
/// once either way.
pub fn produce<T, S>(
    source: &mut S,
    mut tx: StreamSender<T>,
    cancel: &CancelToken,
    delimiter: char,
) -> Result<u64>
where
    T: RowPayload,
    S: RowSource + ?Sized,
{
    let result = if cancel.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        scan_into(source, &tx, cancel, delimiter)
    };

    match &result {
        Ok(pushed) => {
            tx.close();
            debug!(pushed, "producer reached end of rows");
        }
        Err(err) => {
            tx.abort();
            debug!(error = %err, "producer stopped");
        }
    }
    result
}

fn scan_into<T, S>(
    source: &mut S,
    tx: &StreamSender<T>,
    cancel: &CancelToken,
    delimiter: char,
) -> Result<u64>
where
    T: RowPayload,
    S: RowSource + ?Sized,
{
    let mut pushed = 0u64;
    let mut stopped: Option<PipelineError> = None;

    T::scan(source, delimiter, &mut |item| {
        if cancel.is_cancelled() {
            stopped = Some(PipelineError::Cancelled);
            return ControlFlow::Break(());
        }
        if tx.push(item).is_err() {
            stopped = Some(PipelineError::StreamAborted);
            return ControlFlow::Break(());
        }
        pushed += 1;
        if cancel.is_cancelled() {
            stopped = Some(PipelineError::Cancelled);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    })?;

    match stopped {
        Some(err) => Err(err),
        None => Ok(pushed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Pop, bounded};
    use crate::record::{Line, Record};
    use crate::source::MemorySource;

    fn source(n: usize) -> MemorySource {
        (0..n)
            .map(|i| Record::new(format!("u{i}@x.com"), "F", "L", "1 St", "C", "00000"))
            .collect()
    }

    #[test]
    fn test_pushes_all_rows_then_closes() {
        let (tx, rx) = bounded::<Record>(8);
        let pushed = produce(&mut source(5), tx, &CancelToken::new(), '|').unwrap();
        assert_eq!(pushed, 5);
        for i in 0..5 {
            match rx.pop() {
                Pop::Item(r) => assert_eq!(r.email, format!("u{i}@x.com")),
                other => panic!("expected item, got {other:?}"),
            }
        }
        assert_eq!(rx.pop(), Pop::End);
    }

    #[test]
    fn test_empty_source_closes_cleanly() {
        let (tx, rx) = bounded::<Record>(0);
        assert_eq!(produce(&mut source(0), tx, &CancelToken::new(), '|').unwrap(), 0);
        assert_eq!(rx.pop(), Pop::End);
    }

    #[test]
    fn test_lines_mode_pushes_joined_rows() {
        let (tx, rx) = bounded::<Line>(2);
        produce(&mut source(1), tx, &CancelToken::new(), ',').unwrap();
        assert_eq!(rx.pop(), Pop::Item(Line::new("u0@x.com,F,L,1 St,C,00000")));
        assert_eq!(rx.pop(), Pop::End);
    }

    #[test]
    fn test_cancelled_before_start_pushes_nothing() {
        let (tx, rx) = bounded::<Record>(8);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = produce(&mut source(5), tx, &cancel, '|').unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(rx.pop(), Pop::Aborted);
        assert_eq!(rx.monitor().stats().pushed, 0);
    }

    #[test]
    fn test_consumer_gone_aborts() {
        let (tx, rx) = bounded::<Record>(0);
        drop(rx);
        let err = produce(&mut source(3), tx, &CancelToken::new(), '|').unwrap_err();
        assert!(matches!(err, PipelineError::StreamAborted));
    }
}
