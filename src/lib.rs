//! Core telemetry pipeline for classroom beacon data.
//!
//! Raw snapshots of cadet (participant) and sector (zone beacon) records
//! flow through zoned-time normalization, a watermark gate that discards
//! redundant pushes, per-batch device classification, meeting-log
//! correlation, and derived-field enrichment. Chart renderers consume the
//! result exclusively through the plot variable contract in [`plot`].

pub mod config;
pub mod meetings;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod plot;
pub mod store;
mod utils;
