//! CSV decoding for the metrics files.
//!
//! The files follow the plain delimited-text convention: comma-separated,
//! double quotes around fields containing the delimiter, doubled quotes
//! for embedded quotes. Splitting is hand-rolled (no CSV crate needed for
//! a fixed two-file format).

use std::fs;
use std::io;
use std::path::Path;

/// One decoded data row: ordered column name → value pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<(String, String)>,
}

impl Row {
    /// Value of a named column, if the row has it.
    ///
    /// A row decoded from a line with fewer fields than the header simply
    /// lacks the trailing columns.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Split text into completed lines plus a trailing unterminated fragment.
///
/// CR, LF, and CRLF all terminate a line, so either newline convention works.
/// The fragment (everything after the last terminator) is returned separately
/// so a caller reading incrementally can hold it back until it completes.
pub fn split_lines(text: &str) -> (Vec<&str>, &str) {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }

    (lines, &text[start..])
}

/// Split a CSV line into fields, respecting double-quote escaping.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == ',' {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);

    fields
}

/// Decode data lines against a header line.
///
/// Fields are positionally matched to the header's column names. Empty lines
/// are skipped, as is any line textually identical to the header (ignoring
/// surrounding whitespace) — a producer that recreates its output file
/// rewrites the header mid-stream.
pub fn decode_lines<S: AsRef<str>>(header: &str, lines: &[S]) -> Vec<Row> {
    let names = split_csv_line(header);
    let header_trimmed = header.trim();

    let mut rows = Vec::new();
    for line in lines {
        let line = line.as_ref();
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == header_trimmed {
            continue;
        }

        let fields = split_csv_line(line);
        let columns = names
            .iter()
            .zip(fields)
            .map(|(name, value)| (name.clone(), value))
            .collect();
        rows.push(Row { columns });
    }

    rows
}

/// Decode a whole CSV file at once, first line taken as the header.
///
/// Used by the one-shot export path. A missing file is not an error — the
/// producer may not have started yet — and yields no rows.
pub fn read_rows(path: &Path) -> io::Result<Vec<Row>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    // Whole-file decode: a final line without a terminator still counts.
    let (mut lines, rest) = split_lines(&text);
    if !rest.is_empty() {
        lines.push(rest);
    }

    match lines.split_first() {
        Some((header, data)) => Ok(decode_lines(header, data)),
        None => Ok(Vec::new()),
    }
}
