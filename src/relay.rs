//! Input file resolution and export/follow orchestration.
//!
//! The metrics directory is expected to hold the two CSV files directly.
//! When neither is present, a pointer file may name the directory they
//! actually live in — the producer relocates its output per run and leaves
//! `latest.txt` behind. A directory where nothing resolves is a normal
//! state (the producer has not started), not a fault.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::csv;
use crate::mapper::{self, ParseError};
use crate::sink::ScalarSink;
use crate::tailer::CsvTailer;

/// Per-tick health samples.
pub const HEALTH_FILE: &str = "health_metrics.csv";
/// Per-generation summaries.
pub const GENERATION_FILE: &str = "generation_metrics.csv";
/// Pointer file naming the directory the CSV files actually live in.
pub const POINTER_FILE: &str = "latest.txt";

/// Error type for a relay pass.
#[derive(Debug)]
pub enum RelayError {
    /// Reading an input file failed (other than the file being absent).
    Io(io::Error),
    /// A row could not be mapped onto its series.
    Parse(ParseError),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Io(e) => write!(f, "I/O error: {}", e),
            RelayError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<io::Error> for RelayError {
    fn from(e: io::Error) -> Self {
        RelayError::Io(e)
    }
}

impl From<ParseError> for RelayError {
    fn from(e: ParseError) -> Self {
        RelayError::Parse(e)
    }
}

/// Resolved locations of the two input files.
#[derive(Debug, Clone)]
pub struct MetricsPaths {
    pub health: PathBuf,
    pub generation: PathBuf,
}

fn paths_in(dir: &Path) -> MetricsPaths {
    MetricsPaths {
        health: dir.join(HEALTH_FILE),
        generation: dir.join(GENERATION_FILE),
    }
}

/// Locate the metrics files under `metrics_dir`.
///
/// If neither file exists there, the pointer file is consulted and both
/// paths re-resolve against the directory it names. Failing that, the
/// direct paths are returned unchanged — downstream reads of absent files
/// yield empty row sets.
pub fn resolve_metrics_paths(metrics_dir: &Path) -> MetricsPaths {
    let direct = paths_in(metrics_dir);
    if direct.health.exists() || direct.generation.exists() {
        return direct;
    }

    let pointer = metrics_dir.join(POINTER_FILE);
    match fs::read_to_string(&pointer) {
        Ok(content) => {
            let target = content.trim();
            if target.is_empty() {
                direct
            } else {
                debug!("Following {} to {}", pointer.display(), target);
                paths_in(Path::new(target))
            }
        }
        Err(_) => direct,
    }
}

/// Decode both files in full and emit every row. One-shot export path.
pub fn export_once(sink: &mut dyn ScalarSink, paths: &MetricsPaths) -> Result<(), RelayError> {
    let health_rows = csv::read_rows(&paths.health)?;
    mapper::emit_health_rows(sink, &health_rows)?;

    let generation_rows = csv::read_rows(&paths.generation)?;
    mapper::emit_generation_rows(sink, &generation_rows)?;

    debug!(
        "Exported {} health rows, {} generation rows",
        health_rows.len(),
        generation_rows.len()
    );
    Ok(())
}

/// Continuous-mode state: one tailer per input file.
pub struct Follower {
    health: CsvTailer,
    generation: CsvTailer,
}

impl Follower {
    /// Build tailers for both files, honoring the same `start_at_end` choice.
    pub fn new(paths: &MetricsPaths, start_at_end: bool) -> Self {
        Self {
            health: CsvTailer::new(paths.health.clone(), start_at_end),
            generation: CsvTailer::new(paths.generation.clone(), start_at_end),
        }
    }

    /// Poll both files once, health rows first, and emit what arrived.
    ///
    /// Returns whether anything was emitted, so the caller can flush the
    /// sink only on progress.
    pub fn poll(&mut self, sink: &mut dyn ScalarSink) -> Result<bool, RelayError> {
        let health_rows = self.health.read_new_rows()?;
        mapper::emit_health_rows(sink, &health_rows)?;

        let generation_rows = self.generation.read_new_rows()?;
        mapper::emit_generation_rows(sink, &generation_rows)?;

        let emitted = !health_rows.is_empty() || !generation_rows.is_empty();
        if emitted {
            debug!(
                "Forwarded {} health rows, {} generation rows",
                health_rows.len(),
                generation_rows.len()
            );
        }
        Ok(emitted)
    }
}
