//! Maps decoded CSV rows onto named scalar series.
//!
//! Two row shapes are understood: the per-tick health sample and the
//! per-generation summary. A missing or non-numeric required column is a
//! hard error, propagated so the run stops instead of skipping rows.

use crate::csv::Row;
use crate::sink::ScalarSink;

/// Error type for row mapping failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Emit the per-tick health series for each row.
///
/// Expects columns `step`, `queen_health`, `avg_worker_health`,
/// `nest_blocks`, `mulch_consumed`, `alive_count`, `time_remaining`,
/// `generation`; the step axis is the cumulative tick counter.
pub fn emit_health_rows(sink: &mut dyn ScalarSink, rows: &[Row]) -> Result<(), ParseError> {
    for row in rows {
        let step = int_field(row, "step")?;
        sink.emit("health/queen", num_field(row, "queen_health")?, step);
        sink.emit("health/avg_worker", num_field(row, "avg_worker_health")?, step);
        sink.emit("world/nest_blocks", num_field(row, "nest_blocks")?, step);
        sink.emit("world/mulch_consumed", num_field(row, "mulch_consumed")?, step);
        sink.emit("world/alive_count", num_field(row, "alive_count")?, step);
        sink.emit("time/remaining", num_field(row, "time_remaining")?, step);
        sink.emit("generation/index", num_field(row, "generation")?, step);
    }
    Ok(())
}

/// Emit the per-generation summary series for each row.
///
/// Expects columns `generation`, `best_fitness`, `avg_fitness`,
/// `nest_blocks`; the step axis is the generation counter.
pub fn emit_generation_rows(sink: &mut dyn ScalarSink, rows: &[Row]) -> Result<(), ParseError> {
    for row in rows {
        let step = int_field(row, "generation")?;
        sink.emit("fitness/best", num_field(row, "best_fitness")?, step);
        sink.emit("fitness/avg", num_field(row, "avg_fitness")?, step);
        sink.emit("world/nest_blocks_per_gen", num_field(row, "nest_blocks")?, step);
    }
    Ok(())
}

/// Raw value of a required column.
fn raw_field<'a>(row: &'a Row, column: &str) -> Result<&'a str, ParseError> {
    row.get(column)
        .ok_or_else(|| ParseError::new(format!("missing column '{}'", column)))
}

/// Required column parsed as a float.
fn num_field(row: &Row, column: &str) -> Result<f64, ParseError> {
    let raw = raw_field(row, column)?;
    raw.trim()
        .parse()
        .map_err(|_| ParseError::new(format!("invalid number '{}' in column '{}'", raw, column)))
}

/// Required column parsed as an integer step.
fn int_field(row: &Row, column: &str) -> Result<i64, ParseError> {
    let raw = raw_field(row, column)?;
    raw.trim()
        .parse()
        .map_err(|_| ParseError::new(format!("invalid integer '{}' in column '{}'", raw, column)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::decode_lines;
    use crate::sink::RecordingSink;

    const HEALTH_HEADER: &str =
        "step,queen_health,avg_worker_health,nest_blocks,mulch_consumed,alive_count,time_remaining,generation";

    #[test]
    fn test_health_row_emits_seven_points() {
        let rows = decode_lines(HEALTH_HEADER, &["3,80.5,61.2,4,12.0,9,120.0,2"]);
        let mut sink = RecordingSink::new();

        emit_health_rows(&mut sink, &rows).unwrap();

        assert_eq!(
            sink.points,
            vec![
                ("health/queen".to_string(), 80.5, 3),
                ("health/avg_worker".to_string(), 61.2, 3),
                ("world/nest_blocks".to_string(), 4.0, 3),
                ("world/mulch_consumed".to_string(), 12.0, 3),
                ("world/alive_count".to_string(), 9.0, 3),
                ("time/remaining".to_string(), 120.0, 3),
                ("generation/index".to_string(), 2.0, 3),
            ]
        );
    }

    #[test]
    fn test_generation_row_emits_three_points() {
        let rows = decode_lines("generation,best_fitness,avg_fitness,nest_blocks", &["5,0.91,0.4,7"]);
        let mut sink = RecordingSink::new();

        emit_generation_rows(&mut sink, &rows).unwrap();

        assert_eq!(
            sink.points,
            vec![
                ("fitness/best".to_string(), 0.91, 5),
                ("fitness/avg".to_string(), 0.4, 5),
                ("world/nest_blocks_per_gen".to_string(), 7.0, 5),
            ]
        );
    }

    #[test]
    fn test_missing_column_is_an_error() {
        // Short row: trailing columns absent
        let rows = decode_lines(HEALTH_HEADER, &["3,80.5"]);
        let mut sink = RecordingSink::new();

        let err = emit_health_rows(&mut sink, &rows).unwrap_err();
        assert!(err.message.contains("missing column"));
    }

    #[test]
    fn test_non_numeric_value_is_an_error() {
        let rows = decode_lines("generation,best_fitness,avg_fitness,nest_blocks", &["5,high,0.4,7"]);
        let mut sink = RecordingSink::new();

        let err = emit_generation_rows(&mut sink, &rows).unwrap_err();
        assert!(err.message.contains("best_fitness"));
    }

    #[test]
    fn test_non_integer_step_is_an_error() {
        let rows = decode_lines(HEALTH_HEADER, &["3.5,80.5,61.2,4,12.0,9,120.0,2"]);
        let mut sink = RecordingSink::new();

        assert!(emit_health_rows(&mut sink, &rows).is_err());
    }

    #[test]
    fn test_values_tolerate_surrounding_whitespace() {
        let rows = decode_lines("generation,best_fitness,avg_fitness,nest_blocks", &["5, 0.91 ,0.4,7"]);
        let mut sink = RecordingSink::new();

        emit_generation_rows(&mut sink, &rows).unwrap();
        assert_eq!(sink.points[0].1, 0.91);
    }
}
