#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Discovery and batch analysis of operator location logs.
//!
//! [`classify::classify`] groups the files under an input root by base
//! name and [`pipeline::Analyzer`] turns every group that has a location
//! log into an HTML report with map images.

pub mod classify;
pub mod pipeline;
pub mod progress;

use std::path::PathBuf;

use loc_analyze_geography::ProjectionError;
use loc_analyze_parse::ReadError;
use loc_analyze_parse::sections::SectionError;
use loc_analyze_report::ReportError;

pub use pipeline::{Analyzer, BatchSummary, GroupOutcome, GroupReport, LogAnalysis, SkipReason};

/// Errors that can occur while discovering or processing file groups.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A directory is missing or cannot be accessed.
    #[error("file system error on {path}: {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input root is not a directory.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    /// A location log could not be read or decoded.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// A location log does not have the expected section layout.
    #[error("malformed location log {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: SectionError,
    },

    /// The report could not be assembled or written.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// The coordinate transformation could not be set up.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}
