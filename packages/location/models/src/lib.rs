#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types shared by every stage of the location log analysis.
//!
//! A location log is a call-detail style text export produced by an
//! operator. Each file carries a header line, a section of per-event
//! metadata lines and a section of per-location statistics lines. The
//! types here describe what the parsers extract from those sections and
//! what the aggregation stage derives from them.
//!
//! Fields that the source format omits inconsistently are modelled as
//! [`Option`]: an absent field is never conflated with an empty string or
//! with zero.

pub mod config;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// All companion files sharing one base name under an input root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGroup {
    /// File name without its extension (e.g. `"79161234567"`).
    pub base_name: String,
    /// Recognized extension (without the dot) -> first path seen with it.
    pub files: BTreeMap<String, PathBuf>,
}

impl FileGroup {
    /// Creates an empty group for `base_name`.
    #[must_use]
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            files: BTreeMap::new(),
        }
    }

    /// Records a file with the given extension. The first path seen for an
    /// extension wins.
    pub fn insert(&mut self, extension: impl Into<String>, path: PathBuf) {
        self.files.entry(extension.into()).or_insert(path);
    }

    /// The set of extensions present in this group.
    #[must_use]
    pub fn extensions(&self) -> BTreeSet<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn has_extension(&self, extension: &str) -> bool {
        self.files.contains_key(extension)
    }

    /// Path of the file carrying `extension`, if the group has one.
    #[must_use]
    pub fn path_for(&self, extension: &str) -> Option<&Path> {
        self.files.get(extension).map(PathBuf::as_path)
    }
}

/// One line of the event-metadata section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Event date/time, verbatim from the first tab field.
    pub timestamp: String,
    /// Digits following `=` in the second tab field. `Some("")` when the
    /// `=` is present without digits, `None` when there is no `=` at all.
    pub numeric_param: Option<String>,
    /// Operator code preceding the cell identifiers.
    pub operator_code: Option<String>,
    /// Numeric part of the cell identifier (before the hyphen).
    pub cell_major: Option<String>,
    /// Alphanumeric part of the cell identifier (after the hyphen).
    pub cell_minor: Option<String>,
    /// Free-text address (text before the last `(` of the final field).
    pub address: String,
}

/// One line of the location-statistics section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStatRecord {
    pub event_count: f64,
    /// Share of all events, in percent.
    pub percentage: f64,
    pub operator_code: Option<String>,
    pub cell_major: Option<String>,
    pub cell_minor: Option<String>,
    pub address: String,
    /// Raw latitude in compact sexagesimal notation.
    pub latitude_dms: Option<String>,
    /// Raw longitude in compact sexagesimal notation.
    pub longitude_dms: Option<String>,
    /// Latitude in decimal degrees, `0.0` when missing or unparseable.
    pub latitude_dd: f64,
    /// Longitude in decimal degrees, `0.0` when missing or unparseable.
    pub longitude_dd: f64,
    /// Antenna bearing.
    pub azimuth: Option<String>,
}

impl Default for LocationStatRecord {
    fn default() -> Self {
        Self {
            event_count: 0.0,
            percentage: 0.0,
            operator_code: None,
            cell_major: None,
            cell_minor: None,
            address: String::new(),
            latitude_dms: None,
            longitude_dms: None,
            latitude_dd: 0.0,
            longitude_dd: 0.0,
            azimuth: None,
        }
    }
}

/// Grouping key for aggregated locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationKey {
    pub address: String,
    pub latitude_dd: f64,
    pub longitude_dd: f64,
}

/// Statistics summed over every record sharing one [`LocationKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedLocation {
    #[serde(flatten)]
    pub key: LocationKey,
    /// Sum of `event_count` over the group.
    pub event_count: f64,
    /// Sum of `percentage` over the group.
    pub percentage: f64,
    /// Number of statistics lines merged into this location.
    pub record_count: usize,
}

impl AggregatedLocation {
    #[must_use]
    pub fn address(&self) -> &str {
        &self.key.address
    }

    #[must_use]
    pub const fn latitude_dd(&self) -> f64 {
        self.key.latitude_dd
    }

    #[must_use]
    pub const fn longitude_dd(&self) -> f64 {
        self.key.longitude_dd
    }
}

/// A map image written for one ranked location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMap {
    /// Zero-based rank of the location the image belongs to.
    pub location_index: usize,
    pub image_path: PathBuf,
}
