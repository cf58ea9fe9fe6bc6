//! Scalar sink abstraction over the TensorBoard event writer.
//!
//! The backend only needs to accept a (series, value, step) triple and
//! persist it; its storage format is opaque here. Anything satisfying
//! `ScalarSink` works as an output.

use std::fmt;
use std::fs;

use tensorboard_rs::summary_writer::SummaryWriter;

/// Error type for sink construction failures. Fatal at startup.
#[derive(Debug)]
pub struct SinkError {
    pub message: String,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TensorBoard: {}", self.message)
    }
}

impl std::error::Error for SinkError {}

/// Destination for scalar series points.
pub trait ScalarSink {
    /// Record `value` at `step` on the series named `series`.
    fn emit(&mut self, series: &str, value: f64, step: i64);
    /// Make everything emitted so far durable.
    fn flush(&mut self);
    /// Flush and release the output. No emits may follow.
    fn close(&mut self);
}

/// Sink writing TensorBoard event files under a log directory.
pub struct TensorboardSink {
    writer: SummaryWriter,
}

impl TensorboardSink {
    /// Open a sink writing into `logdir`, creating the directory if needed.
    pub fn create(logdir: &str) -> Result<Self, SinkError> {
        fs::create_dir_all(logdir).map_err(|e| SinkError {
            message: format!("cannot create log directory '{}': {}", logdir, e),
        })?;

        Ok(Self {
            writer: SummaryWriter::new(logdir),
        })
    }
}

impl ScalarSink for TensorboardSink {
    fn emit(&mut self, series: &str, value: f64, step: i64) {
        // The event writer's step axis is unsigned
        let step = step.max(0) as usize;
        self.writer.add_scalar(series, value as f32, step);
    }

    fn flush(&mut self) {
        self.writer.flush();
    }

    fn close(&mut self) {
        self.writer.flush();
    }
}

/// Test double capturing emitted points in memory.
#[cfg(test)]
pub(crate) struct RecordingSink {
    pub points: Vec<(String, f64, i64)>,
    pub flushes: usize,
    pub closed: bool,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            flushes: 0,
            closed: false,
        }
    }
}

#[cfg(test)]
impl ScalarSink for RecordingSink {
    fn emit(&mut self, series: &str, value: f64, step: i64) {
        self.points.push((series.to_string(), value, step));
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
