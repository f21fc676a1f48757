//! SQLite row source backed by `rusqlite`.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, Row, Rows};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::record::{Field, Line, Record};
use crate::source::{RowSource, Visit};

/// Table read when none is configured.
pub const DEFAULT_TABLE: &str = "users";

/// Reads user rows from one SQLite table.
#[derive(Debug)]
pub struct SqliteSource {
    conn: Connection,
    table: String,
}

impl SqliteSource {
    /// Open an existing database file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(PipelineError::source_open)?;
        debug!(path = %path.display(), "opened sqlite row source");
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Query selecting every field as its own column.
    pub fn records_query(&self) -> String {
        let columns = Field::ALL.map(Field::column).join(", ");
        format!("SELECT {columns} FROM {}", quote_ident(&self.table))
    }

    /// Query concatenating every field into one delimited column.
    pub fn lines_query(&self, delimiter: char) -> String {
        let separator = format!(" || {} || ", quote_literal(&delimiter.to_string()));
        let joined = Field::ALL.map(Field::column).join(separator.as_str());
        format!("SELECT ({joined}) FROM {}", quote_ident(&self.table))
    }

    fn scan_with<T>(
        &mut self,
        sql: &str,
        decode: fn(&Row<'_>) -> rusqlite::Result<T>,
        visit: Visit<'_, T>,
    ) -> Result<()> {
        let mut stmt = self.conn.prepare(sql).map_err(PipelineError::source_open)?;
        let rows = stmt.query([]).map_err(PipelineError::source_open)?;
        visit_rows(rows, decode, visit)
    }
}

fn visit_rows<T>(
    mut rows: Rows<'_>,
    decode: fn(&Row<'_>) -> rusqlite::Result<T>,
    visit: Visit<'_, T>,
) -> Result<()> {
    let mut index = 0u64;
    loop {
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(()),
            Err(err) => return Err(PipelineError::source_read(index, err)),
        };
        let item = decode(row).map_err(|err| PipelineError::source_read(index, err))?;
        index += 1;
        if visit(item).is_break() {
            return Ok(());
        }
    }
}

fn decode_record(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        email: row.get(Field::Email.index())?,
        first_name: row.get(Field::FirstName.index())?,
        last_name: row.get(Field::LastName.index())?,
        address: row.get(Field::Address.index())?,
        city: row.get(Field::City.index())?,
        zip: row.get(Field::Zip.index())?,
    })
}

fn decode_line(row: &Row<'_>) -> rusqlite::Result<Line> {
    row.get::<_, String>(0).map(Line::new)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

impl RowSource for SqliteSource {
    fn scan_records(&mut self, visit: Visit<'_, Record>) -> Result<()> {
        let sql = self.records_query();
        self.scan_with(&sql, decode_record, visit)
    }

    fn scan_lines(&mut self, delimiter: char, visit: Visit<'_, Line>) -> Result<()> {
        let sql = self.lines_query(delimiter);
        self.scan_with(&sql, decode_line, visit)
    }
}
