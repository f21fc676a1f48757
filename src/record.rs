//! Row payloads: structured records and pre-formatted lines.
//!
//! A `Record` carries the six user fields decoded individually. A `Line`
//! carries the same six fields already joined by a delimiter, which is what
//! the row source returns when formatting is pushed into its query.

use crate::error::{PipelineError, Result};

/// Number of field slots in a row.
pub const FIELD_COUNT: usize = 6;

/// Default separator between fields of a pre-formatted line.
pub const DEFAULT_DELIMITER: char = '|';

/// One named field slot of a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    FirstName,
    LastName,
    Address,
    City,
    Zip,
}

impl Field {
    /// All fields in column order.
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Email,
        Field::FirstName,
        Field::LastName,
        Field::Address,
        Field::City,
        Field::Zip,
    ];

    /// Column name in the row source, also used as the template slot name.
    pub fn column(self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Address => "address",
            Field::City => "city",
            Field::Zip => "zip",
        }
    }

    /// Human-readable column title used in table headers.
    pub fn title(self) -> &'static str {
        match self {
            Field::Email => "Email",
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::Address => "Address",
            Field::City => "City",
            Field::Zip => "Zip",
        }
    }

    /// Position of this field within a row.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a field by its column name.
    pub fn from_column(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.column() == name)
    }
}

/// Read access to the six field values of a row.
pub trait FieldValues {
    fn value(&self, field: Field) -> &str;
}

/// A structured user row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
}

impl Record {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            address: address.into(),
            city: city.into(),
            zip: zip.into(),
        }
    }

    /// Join the fields into one line, the way the row source does when
    /// formatting is pushed down into its query.
    pub fn to_line(&self, delimiter: char) -> Line {
        let mut text = String::with_capacity(self.text_len() + FIELD_COUNT - 1);
        for (i, field) in Field::ALL.into_iter().enumerate() {
            if i > 0 {
                text.push(delimiter);
            }
            text.push_str(self.value(field));
        }
        Line(text)
    }

    /// Bytes held on the heap by this record's strings.
    pub fn heap_size(&self) -> usize {
        Field::ALL
            .into_iter()
            .map(|f| self.string(f).capacity())
            .sum()
    }

    fn text_len(&self) -> usize {
        Field::ALL.into_iter().map(|f| self.value(f).len()).sum()
    }

    fn string(&self, field: Field) -> &String {
        match field {
            Field::Email => &self.email,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Address => &self.address,
            Field::City => &self.city,
            Field::Zip => &self.zip,
        }
    }
}

impl FieldValues for Record {
    fn value(&self, field: Field) -> &str {
        self.string(field)
    }
}

/// A row pre-joined into a single delimited string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line(String);

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Split the line back into its field values.
    ///
    /// Fails with `Render` unless the delimiter yields exactly
    /// [`FIELD_COUNT`] parts.
    pub fn split_fields(&self, delimiter: char) -> Result<SplitLine<'_>> {
        let mut values = [""; FIELD_COUNT];
        let mut count = 0;
        for part in self.0.split(delimiter) {
            if count < FIELD_COUNT {
                values[count] = part;
            }
            count += 1;
        }
        if count != FIELD_COUNT {
            return Err(PipelineError::Render(format!(
                "expected {FIELD_COUNT} fields separated by '{delimiter}', found {count}"
            )));
        }
        Ok(SplitLine(values))
    }
}

/// Field values borrowed from a [`Line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLine<'a>([&'a str; FIELD_COUNT]);

impl FieldValues for SplitLine<'_> {
    fn value(&self, field: Field) -> &str {
        self.0[field.index()]
    }
}
