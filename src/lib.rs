//! tbtail - CSV metrics to TensorBoard relay library.
//!
//! This library provides the building blocks for the `tbtail` binary:
//! - `csv` — row decoding against a header line
//! - `tailer` — incremental reader for growing CSV files
//! - `mapper` — row-to-series translation for the two known row shapes
//! - `sink` — scalar sink abstraction over the TensorBoard event writer
//! - `relay` — input file resolution and export/follow orchestration

pub mod csv;
pub mod mapper;
pub mod relay;
pub mod sink;
pub mod tailer;
