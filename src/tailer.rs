//! Incremental reader for a growing CSV file.
//!
//! Tracks a byte offset into the file and returns only rows completed since
//! the previous poll, holding back any trailing partial line until its
//! terminator arrives. Detects truncation via file size comparison.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::csv::{self, Row};

/// Reads new rows appended to a CSV file since the last read position.
///
/// The cursor is {byte offset, leftover partial-line buffer, header once
/// seen}. One instance owns one file; state lives only for the session.
pub struct CsvTailer {
    path: PathBuf,
    offset: u64,
    buffer: String,
    header: Option<String>,
}

impl CsvTailer {
    /// Create a tailer for `path`.
    ///
    /// With `start_at_end` set, content already in the file is skipped and
    /// the existing first line is remembered as the header, so the next
    /// appended row decodes immediately. A file that does not exist yet is
    /// fine — the cursor starts at zero and the header is learned from the
    /// first completed line.
    pub fn new(path: PathBuf, start_at_end: bool) -> Self {
        let mut tailer = Self {
            path,
            offset: 0,
            buffer: String::new(),
            header: None,
        };

        if start_at_end
            && let Ok(metadata) = fs::metadata(&tailer.path)
        {
            tailer.offset = metadata.len();
            tailer.header = read_first_line(&tailer.path);
        }

        tailer
    }

    /// Read rows completed since the last call.
    ///
    /// Returns empty (not an error) while the file does not exist. If the
    /// file shrank below the stored offset it was truncated and rewritten;
    /// the cursor resets to zero and the new content replays from the start,
    /// with the rewritten header dropped by the decoder.
    pub fn read_new_rows(&mut self) -> io::Result<Vec<Row>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        if metadata.len() < self.offset {
            self.offset = 0;
            self.buffer.clear();
        }

        // Nothing new to read
        if metadata.len() <= self.offset {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.offset))?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        self.offset = file.stream_position()?;

        if data.is_empty() {
            return Ok(Vec::new());
        }

        let text = format!("{}{}", self.buffer, data);
        let (mut lines, rest) = csv::split_lines(&text);
        self.buffer = rest.to_string();

        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let header = match &self.header {
            Some(header) => header.clone(),
            None => {
                // First completed line of the session is the header, not data.
                let header = lines.remove(0).to_string();
                self.header = Some(header.clone());
                header
            }
        };

        Ok(csv::decode_lines(&header, &lines))
    }
}

/// First line of a file, terminator stripped. `None` if unreadable or empty.
fn read_first_line(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line).ok()?;
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &std::path::Path, text: &str) {
        let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        write!(f, "{}", text).unwrap();
    }

    #[test]
    fn test_reads_rows_from_beginning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, "a,b\n1,2\n3,4\n").unwrap();

        let mut tailer = CsvTailer::new(path, false);
        let rows = tailer.read_new_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("a"), Some("1"));
        assert_eq!(rows[1].get("b"), Some("4"));

        // Second call: nothing new
        assert!(tailer.read_new_rows().unwrap().is_empty());
    }

    #[test]
    fn test_start_at_end_skips_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let mut tailer = CsvTailer::new(path.clone(), true);
        assert!(tailer.read_new_rows().unwrap().is_empty());

        // One appended line yields exactly one row
        append(&path, "3,4\n");
        let rows = tailer.read_new_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some("3"));
    }

    #[test]
    fn test_partial_line_held_until_terminated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, "a,b\n1,").unwrap();

        let mut tailer = CsvTailer::new(path.clone(), false);
        assert!(tailer.read_new_rows().unwrap().is_empty());

        append(&path, "2\n");
        let rows = tailer.read_new_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("b"), Some("2"));
    }

    #[test]
    fn test_polls_partition_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, "a,b\n").unwrap();

        let mut tailer = CsvTailer::new(path.clone(), false);
        let mut collected = Vec::new();

        // Appends split at awkward points, including mid-line
        for chunk in ["1,2\n3,", "4\n", "5,6\n7,8\n", "9,10\n"] {
            append(&path, chunk);
            collected.extend(tailer.read_new_rows().unwrap());
        }

        let whole = crate::csv::read_rows(&path).unwrap();
        assert_eq!(collected, whole);
        assert_eq!(collected.len(), 5);
    }

    #[test]
    fn test_repeated_header_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let mut tailer = CsvTailer::new(path.clone(), false);
        assert_eq!(tailer.read_new_rows().unwrap().len(), 1);

        append(&path, "a,b\n3,4\n");
        let rows = tailer.read_new_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some("3"));
    }

    #[test]
    fn test_missing_file_then_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut tailer = CsvTailer::new(path.clone(), false);
        assert!(tailer.read_new_rows().unwrap().is_empty());

        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert_eq!(tailer.read_new_rows().unwrap().len(), 1);
    }

    #[test]
    fn test_truncated_file_replays_from_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, "a,b\n1,2\n3,4\n5,6\n").unwrap();

        let mut tailer = CsvTailer::new(path.clone(), false);
        assert_eq!(tailer.read_new_rows().unwrap().len(), 3);

        // Rewritten from scratch, shorter, with a fresh header
        std::fs::write(&path, "a,b\n7,8\n").unwrap();
        let rows = tailer.read_new_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some("7"));
    }

    #[test]
    fn test_crlf_terminators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, "a,b\r\n1,2\r\n").unwrap();

        let mut tailer = CsvTailer::new(path, false);
        let rows = tailer.read_new_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("b"), Some("2"));
    }

    #[test]
    fn test_start_at_end_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut tailer = CsvTailer::new(path.clone(), true);
        assert!(tailer.read_new_rows().unwrap().is_empty());

        // File appears later: first line is learned as the header
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        let rows = tailer.read_new_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some("1"));
    }
}
