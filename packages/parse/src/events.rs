//! Event metadata lines.
//!
//! Each line is tab-separated:
//!
//! ```text
//! 12.03.2021 10:15:02<TAB>dur=35<TAB>cell=K7712-3A1F<TAB>...<TAB>Moscow, Tverskaya 1 (55-45-36-N, ...)
//! ```
//!
//! Only the timestamp is taken verbatim; the other fields are picked out
//! of their tab field with small patterns and stay `None` when the
//! pattern does not match.

use std::sync::LazyLock;

use loc_analyze_location_models::EventRecord;
use regex::Regex;

use crate::sections::RawSection;
use crate::{ParseError, Parsed};

/// Minimum number of tab-separated fields in an event line.
pub const MIN_FIELDS: usize = 3;

/// Digits after the first `=`. `=` without digits captures an empty string.
static NUMERIC_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=(?P<param>\d*)").expect("valid regex"));

/// `=<operator><major>-<minor>` after the first `=`.
static CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=(?:(?P<operator>\D*)(?P<major>\d*)-(?P<minor>\w*))?").expect("valid regex")
});

/// Everything up to the last `(` of the field.
static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<address>.*)\(").expect("valid regex"));

/// Parses every line of the event-metadata section.
#[must_use]
pub fn parse_events(section: &RawSection<'_>) -> Parsed<EventRecord> {
    let mut parsed = Parsed::default();

    for (i, line) in section.lines.iter().enumerate() {
        match parse_event_line(line, section.line_number(i)) {
            Ok(record) => parsed.records.push(record),
            Err(e) => parsed.skipped.push(e),
        }
    }

    log::debug!(
        "Parsed {} event records ({} skipped)",
        parsed.records.len(),
        parsed.skipped.len()
    );

    parsed
}

/// Parses a single event line. `line_number` is only used for errors.
///
/// # Errors
///
/// Returns [`ParseError::FieldCount`] if the line has fewer than
/// [`MIN_FIELDS`] tab-separated fields.
pub fn parse_event_line(line: &str, line_number: usize) -> Result<EventRecord, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let &[timestamp, param_field, cell_field, ..] = fields.as_slice() else {
        return Err(ParseError::FieldCount {
            line: line_number,
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    };
    let address_field = fields[fields.len() - 1];

    let numeric_param = NUMERIC_PARAM_RE
        .captures(param_field)
        .and_then(|caps| caps.name("param"))
        .map(|m| m.as_str().to_owned());

    let cell = CELL_RE.captures(cell_field);
    let cell_group = |name: &str| {
        cell.as_ref()
            .and_then(|caps| caps.name(name))
            .map(|m| m.as_str().to_owned())
    };

    let address = ADDRESS_RE
        .captures(address_field)
        .and_then(|caps| caps.name("address"))
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default();

    Ok(EventRecord {
        timestamp: timestamp.to_owned(),
        numeric_param,
        operator_code: cell_group("operator"),
        cell_major: cell_group("major"),
        cell_minor: cell_group("minor"),
        address,
    })
}
