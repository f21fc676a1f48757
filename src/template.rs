//! Row template: constant header and footer around a per-row pattern.
//!
//! Template format:
//! ```text
//! | {email} | {first_name} | {last_name} | {address} | {city} | {zip} |
//! ```
//!
//! - `{name}` is replaced by the field whose column name is `name`
//! - `{{` and `}}` produce literal braces
//! - The header and footer are written verbatim, once per run
//!
//! Unknown slot names, unclosed `{` and stray `}` are rejected when the
//! template is parsed, so rendering itself can only fail on the sink.

use std::io::Write;

use crate::error::{PipelineError, Result};
use crate::record::{Field, FieldValues};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(Field),
}

/// A parsed row template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTemplate {
    header: String,
    row: Vec<Segment>,
    footer: String,
}

impl RowTemplate {
    /// Parse a template from its three parts.
    pub fn parse(header: &str, row: &str, footer: &str) -> Result<Self> {
        Ok(Self {
            header: header.to_string(),
            row: parse_row(row)?,
            footer: footer.to_string(),
        })
    }

    /// The markdown table used by the `render-table` tools.
    pub fn markdown() -> Self {
        let mut header = String::from("|");
        let mut rule = String::from("|");
        let mut row = Vec::with_capacity(Field::ALL.len() * 2 + 1);
        for (i, field) in Field::ALL.into_iter().enumerate() {
            header.push_str(&format!(" {} |", field.title()));
            rule.push_str(&"-".repeat(field.title().len() + 2));
            rule.push('|');
            row.push(Segment::Text(if i == 0 { "| " } else { " | " }.to_string()));
            row.push(Segment::Slot(field));
        }
        row.push(Segment::Text(" |\n".to_string()));
        Self {
            header: format!("{header}\n{rule}\n"),
            row,
            footer: String::new(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// Fields referenced by the row pattern, in order of appearance.
    pub fn slots(&self) -> impl Iterator<Item = Field> + '_ {
        self.row.iter().filter_map(|s| match s {
            Segment::Slot(f) => Some(*f),
            Segment::Text(_) => None,
        })
    }

    pub fn write_header<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.header.as_bytes())?;
        Ok(())
    }

    /// Substitute one row into the pattern and write it out.
    pub fn write_row<W, R>(&self, row: &R, out: &mut W) -> Result<()>
    where
        W: Write + ?Sized,
        R: FieldValues + ?Sized,
    {
        for segment in &self.row {
            let text = match segment {
                Segment::Text(text) => text.as_str(),
                Segment::Slot(field) => row.value(*field),
            };
            out.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    pub fn write_footer<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.footer.as_bytes())?;
        Ok(())
    }
}

impl Default for RowTemplate {
    fn default() -> Self {
        Self::markdown()
    }
}

fn parse_row(text: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find(['{', '}']) {
        literal.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            literal.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            literal.push('}');
            rest = after;
        } else if tail.starts_with('}') {
            return Err(PipelineError::Render(format!(
                "unmatched '}}' at byte {}",
                text.len() - tail.len()
            )));
        } else {
            let end = tail.find('}').ok_or_else(|| {
                PipelineError::Render(format!(
                    "unclosed slot at byte {}",
                    text.len() - tail.len()
                ))
            })?;
            let name = tail[1..end].trim();
            let field = Field::from_column(name)
                .ok_or_else(|| PipelineError::Render(format!("unknown field slot '{name}'")))?;
            if !literal.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Slot(field));
            rest = &tail[end + 1..];
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Text(literal));
    }
    Ok(segments)
}
