#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parsing for operator location logs.
//!
//! A location log is a single-byte Cyrillic text file with a fixed
//! three-part layout:
//!
//! ```text
//! <header line>
//! <event metadata, one tab-separated line per event>
//!
//! <location statistics, one free-form line per cell>
//! ```
//!
//! separated by entirely empty lines. [`read_log`] decodes the file,
//! [`sections::split_sections`] cuts it into its parts and
//! [`events::parse_events`] / [`stats::parse_stats`] turn each part into
//! records.
//!
//! The parsers are pure: lines in, records out. A malformed line never
//! aborts its section; it is reported in [`Parsed::skipped`] and parsing
//! moves on to the next line. Field-level problems that still leave a
//! usable record end up in [`Parsed::warnings`].

pub mod events;
pub mod sections;
pub mod stats;

use std::path::{Path, PathBuf};

use loc_analyze_geography::FormatError;

/// A line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// An event line with too few tab-separated fields.
    #[error("line {line}: expected at least {expected} tab-separated fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A statistics line that does not start with `<count> (`.
    #[error("line {line}: statistics line does not start with an event count: '{text}'")]
    MissingEventCount { line: usize, text: String },
}

impl ParseError {
    /// One-based line number in the source file.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::FieldCount { line, .. } | Self::MissingEventCount { line, .. } => *line,
        }
    }
}

/// A problem with one field of a record that was still produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldWarning {
    /// A coordinate could not be converted; its decimal value stays `0`.
    #[error("line {line}: {source}")]
    Coordinate { line: usize, source: FormatError },

    /// A numeric field did not parse; it defaults to `0`.
    #[error("line {line}: invalid {field} '{value}'")]
    Number {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Output of one section parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    /// One record per accepted line, in file order.
    pub records: Vec<T>,
    /// Lines that were dropped.
    pub skipped: Vec<ParseError>,
    /// Field-level problems in records that were kept.
    pub warnings: Vec<FieldWarning>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Errors from reading a location log off disk.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configured encoding label is not known.
    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),
}

/// Reads a location log and decodes it with the named encoding.
///
/// The logs are written in a legacy single-byte code page (normally
/// `windows-1251`); reading them as UTF-8 would corrupt every Cyrillic
/// address. Returns the file's lines without their terminators.
///
/// # Errors
///
/// Returns [`ReadError::UnknownEncoding`] if `encoding` is not a WHATWG
/// label and [`ReadError::Io`] if the file cannot be read.
pub fn read_log(path: &Path, encoding: &str) -> Result<Vec<String>, ReadError> {
    let encoding = encoding_rs::Encoding::for_label(encoding.as_bytes())
        .ok_or_else(|| ReadError::UnknownEncoding(encoding.to_string()))?;

    let bytes = std::fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes);
    if had_errors {
        log::warn!(
            "{} contains bytes that are not valid {}; they were replaced",
            path.display(),
            encoding.name()
        );
    }

    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    Ok(text.lines().map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_windows_1251() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("100.loc");
        // "Москва" in windows-1251
        let (encoded, _, _) = encoding_rs::WINDOWS_1251.encode("header\n\nМосква (\n");
        std::fs::write(&path, &*encoded).unwrap();

        let lines = read_log(&path, "windows-1251").unwrap();
        assert_eq!(lines, ["header", "", "Москва ("]);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("100.loc");
        std::fs::write(&path, b"a\r\n\r\nb\r\n").unwrap();

        assert_eq!(read_log(&path, "cp1251").unwrap(), ["a", "", "b"]);
    }

    #[test]
    fn rejects_unknown_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("100.loc");
        std::fs::write(&path, b"a").unwrap();

        assert!(matches!(
            read_log(&path, "klingon"),
            Err(ReadError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_log(&dir.path().join("absent.loc"), "windows-1251"),
            Err(ReadError::Io { .. })
        ));
    }
}
