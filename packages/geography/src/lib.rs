#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate normalization for location log fixes.
//!
//! Operators report antenna positions in a compact sexagesimal notation
//! (`"55-45-12-N"`). [`dms`] turns those into decimal degrees and
//! [`projection`] moves decimal degrees into the projected Web Mercator
//! frame the map renderer works in.

pub mod dms;
pub mod projection;

pub use dms::{Dms, FormatError, dms_to_dd};
pub use projection::{ProjectionError, WebMercator};
