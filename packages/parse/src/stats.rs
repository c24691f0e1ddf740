//! Location statistics lines.
//!
//! A statistics line reads, left to right:
//!
//! ```text
//! 42 (12.5%) - K7712-3A1F - Moscow, Tverskaya 1 (55-45-36-N, 37-36-0-E, 120 - ...
//! ```
//!
//! event count, percentage, cell clause, address, latitude, longitude and
//! azimuth. Everything after the leading `<count> (` is optional. The line
//! is consumed by a fixed sequence of anchored sub-matchers; each one
//! either matches at the current position and advances past its text, or
//! leaves the position untouched and its field at the default.

use std::sync::LazyLock;

use loc_analyze_geography::dms_to_dd;
use loc_analyze_location_models::LocationStatRecord;
use regex::{Captures, Regex};

use crate::sections::RawSection;
use crate::{FieldWarning, ParseError, Parsed};

macro_rules! anchored {
    ($pattern:literal) => {
        LazyLock::new(|| Regex::new(concat!("^", $pattern)).expect("valid regex"))
    };
}

static HEAD_RE: LazyLock<Regex> = anchored!(r"(?P<count>\d+)\s+\(");
static PERCENTAGE_RE: LazyLock<Regex> = anchored!(r"(?P<percentage>\d+(?:\.\w*)?)");
static PERCENT_CLOSE_RE: LazyLock<Regex> = anchored!(r"%\)");
static CELL_RE: LazyLock<Regex> =
    anchored!(r"\s+-\s(?P<operator>\D)(?P<major>\d*)-(?P<minor>\w*)\s*-");
/// Greedy: the address runs to the last `(` on the line.
static ADDRESS_RE: LazyLock<Regex> = anchored!(r"\s*(?P<address>.*)\(");
static LATITUDE_RE: LazyLock<Regex> = anchored!(r"(?P<lat>\w*),");
static LONGITUDE_RE: LazyLock<Regex> = anchored!(r"\s*(?P<lon>\w*),");
static AZIMUTH_RE: LazyLock<Regex> = anchored!(r"\s+(?P<azimuth>\d*)\s+-");

/// Walks a line left to right, one sub-matcher at a time.
struct Cursor<'h> {
    rest: &'h str,
}

impl<'h> Cursor<'h> {
    const fn new(line: &'h str) -> Self {
        Self { rest: line }
    }

    /// Applies `re` at the current position. On a match the cursor moves
    /// past the matched text.
    fn take(&mut self, re: &Regex) -> Option<Captures<'h>> {
        let rest: &'h str = self.rest;
        let caps = re.captures(rest)?;
        let end = caps.get(0).map_or(0, |m| m.end());
        self.rest = &rest[end..];
        Some(caps)
    }
}

fn group(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().to_owned())
}

/// Parses every line of the location-statistics section.
///
/// Whitespace-only lines are ignored.
#[must_use]
pub fn parse_stats(section: &RawSection<'_>) -> Parsed<LocationStatRecord> {
    let mut parsed = Parsed::default();

    for (i, line) in section.lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_stat_line(line, section.line_number(i), &mut parsed.warnings) {
            Ok(record) => parsed.records.push(record),
            Err(e) => parsed.skipped.push(e),
        }
    }

    log::debug!(
        "Parsed {} statistics records ({} skipped, {} field warnings)",
        parsed.records.len(),
        parsed.skipped.len(),
        parsed.warnings.len()
    );

    parsed
}

/// Parses a single statistics line.
///
/// Field problems that still leave a usable record (an unparseable
/// percentage, a malformed coordinate) are pushed onto `warnings` and the
/// field keeps its default.
///
/// # Errors
///
/// Returns [`ParseError::MissingEventCount`] if the line does not start
/// with `<count> (`.
pub fn parse_stat_line(
    line: &str,
    line_number: usize,
    warnings: &mut Vec<FieldWarning>,
) -> Result<LocationStatRecord, ParseError> {
    let mut cursor = Cursor::new(line);

    let Some(head) = cursor.take(&HEAD_RE) else {
        return Err(ParseError::MissingEventCount {
            line: line_number,
            text: line.to_owned(),
        });
    };

    let mut number = |field: &'static str, value: Option<String>| -> f64 {
        let Some(value) = value else {
            return 0.0;
        };
        value.parse().unwrap_or_else(|_| {
            warnings.push(FieldWarning::Number {
                line: line_number,
                field,
                value,
            });
            0.0
        })
    };

    let event_count = number("event count", group(&head, "count"));
    let percentage = number(
        "percentage",
        cursor
            .take(&PERCENTAGE_RE)
            .and_then(|caps| group(&caps, "percentage")),
    );
    cursor.take(&PERCENT_CLOSE_RE);

    let mut record = LocationStatRecord {
        event_count,
        percentage,
        ..LocationStatRecord::default()
    };

    if let Some(caps) = cursor.take(&CELL_RE) {
        record.operator_code = group(&caps, "operator");
        record.cell_major = group(&caps, "major");
        record.cell_minor = group(&caps, "minor");
    }
    if let Some(caps) = cursor.take(&ADDRESS_RE) {
        record.address = group(&caps, "address").unwrap_or_default();
    }
    record.latitude_dms = cursor
        .take(&LATITUDE_RE)
        .and_then(|caps| group(&caps, "lat"))
        .filter(|lat| !lat.is_empty());
    record.longitude_dms = cursor
        .take(&LONGITUDE_RE)
        .and_then(|caps| group(&caps, "lon"))
        .filter(|lon| !lon.is_empty());
    record.azimuth = cursor
        .take(&AZIMUTH_RE)
        .and_then(|caps| group(&caps, "azimuth"));

    record.latitude_dd = decimal(record.latitude_dms.as_deref(), line_number, warnings);
    record.longitude_dd = decimal(record.longitude_dms.as_deref(), line_number, warnings);

    Ok(record)
}

/// Decimal degrees for a raw coordinate, `0.0` when absent or malformed.
fn decimal(dms: Option<&str>, line_number: usize, warnings: &mut Vec<FieldWarning>) -> f64 {
    match dms_to_dd(dms) {
        Ok(dd) => dd.unwrap_or(0.0),
        Err(source) => {
            warnings.push(FieldWarning::Coordinate {
                line: line_number,
                source,
            });
            0.0
        }
    }
}
