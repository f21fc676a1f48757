//! # template-streaming
//!
//! Render a large relational result set into a text table with peak memory
//! that does not grow with the number of rows.
//!
//! ## Overview
//!
//! A run is a two-stage pipeline:
//! - **Row producer**: scans the row source, one row at a time
//! - **Bounded channel**: hands rows over with backpressure
//! - **Streaming renderer**: writes each row as soon as it arrives
//! - **Coordinator**: runs both sides concurrently and reports one outcome
//!
//! Rows travel either as structured [`Record`]s or as pre-formatted
//! [`Line`]s joined by the row source itself; both render identically.
//!
//! ## Example
//!
//! ```
//! use template_streaming::{Coordinator, MemorySource, PipelineConfig, Record};
//!
//! let mut source = MemorySource::new(vec![Record::new(
//!     "a@x.com", "A", "B", "1 St", "C", "00000",
//! )]);
//! let mut out = Vec::<u8>::new();
//!
//! let summary = Coordinator::new(PipelineConfig::default())
//!     .run(&mut source, &mut out)
//!     .unwrap();
//!
//! assert_eq!(summary.rows_rendered, 1);
//! assert!(String::from_utf8(out).unwrap().ends_with("| a@x.com | A | B | 1 St | C | 00000 |\n"));
//! ```

pub mod cancel;
pub mod channel;
pub mod coordinator;
pub mod error;
pub mod producer;
pub mod record;
pub mod renderer;
pub mod source;
pub mod sqlite;
pub mod template;

pub use cancel::CancelToken;
pub use channel::{
    ChannelError, ChannelMonitor, ChannelStats, Pop, StreamReceiver, StreamSender, bounded,
};
pub use coordinator::{Coordinator, PipelineConfig, RunState, RunSummary, StreamMode};
pub use error::{PipelineError, Result};
pub use producer::produce;
pub use record::{DEFAULT_DELIMITER, FIELD_COUNT, Field, FieldValues, Line, Record};
pub use renderer::{render_lines, render_records};
pub use source::{MemorySource, RowPayload, RowSource, Visit};
pub use sqlite::SqliteSource;
pub use template::RowTemplate;
