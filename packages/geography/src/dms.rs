//! Degrees-minutes-seconds parsing.
//!
//! The notation is four tokens separated by runs of non-digits: degrees,
//! minutes, seconds and a trailing direction letter. Splitting on the
//! non-digit runs always yields exactly four pieces for well-formed input
//! (`"40-30-0-N"` splits into `["40", "30", "0", ""]`).

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static NON_DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d]+").expect("valid regex"));

/// A coordinate string that is not in the expected sexagesimal layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Splitting on non-digit runs did not give four tokens.
    #[error("expected 4 tokens in coordinate '{input}', found {found}")]
    TokenCount { input: String, found: usize },

    /// A degree, minute or second token is not a number.
    #[error("invalid {component} '{token}' in coordinate '{input}'")]
    Component {
        input: String,
        component: &'static str,
        token: String,
    },
}

/// A parsed sexagesimal coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
    /// Direction letter (`N`, `S`, `E`, `W`), if the input carried one.
    pub hemisphere: Option<char>,
}

impl Dms {
    /// Decimal degrees: `degrees + minutes / 60 + seconds / 3600`.
    ///
    /// The hemisphere is NOT applied as a sign: southern and western fixes
    /// come out positive.
    // TODO: apply the sign once the operator confirms how S/W fixes are
    // encoded in the exports.
    #[must_use]
    pub fn to_decimal(&self) -> f64 {
        self.degrees + self.minutes / 60.0 + self.seconds / 3600.0
    }
}

impl FromStr for Dms {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = NON_DIGIT_RE.split(s).collect();
        let [degrees, minutes, seconds, _direction] = tokens.as_slice() else {
            return Err(FormatError::TokenCount {
                input: s.to_string(),
                found: tokens.len(),
            });
        };

        let component = |name: &'static str, token: &str| {
            token.parse::<f64>().map_err(|_| FormatError::Component {
                input: s.to_string(),
                component: name,
                token: token.to_string(),
            })
        };

        Ok(Self {
            degrees: component("degrees", *degrees)?,
            minutes: component("minutes", *minutes)?,
            seconds: component("seconds", *seconds)?,
            hemisphere: s.chars().rev().find(|c| c.is_alphabetic()),
        })
    }
}

/// Converts an optional sexagesimal string into decimal degrees.
///
/// `None` and empty input yield `Ok(None)`; callers that need a number
/// decide their own default.
///
/// # Errors
///
/// Returns [`FormatError`] if the input is present but malformed.
pub fn dms_to_dd(input: Option<&str>) -> Result<Option<f64>, FormatError> {
    match input {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<Dms>().map(|dms| Some(dms.to_decimal())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn converts_half_degree() {
        assert!(close(dms_to_dd(Some("40-30-0-N")).unwrap().unwrap(), 40.5));
    }

    #[test]
    fn converts_minutes_and_seconds() {
        let dd = dms_to_dd(Some("55-45-36-N")).unwrap().unwrap();
        assert!(close(dd, 55.0 + 45.0 / 60.0 + 36.0 / 3600.0));
    }

    #[test]
    fn accepts_any_non_digit_separator() {
        let a = "37d37m12sE".parse::<Dms>().unwrap();
        let b = "37_37_12_E".parse::<Dms>().unwrap();
        assert!(close(a.to_decimal(), b.to_decimal()));
        assert_eq!(a.hemisphere, Some('E'));
    }

    #[test]
    fn hemisphere_does_not_change_sign() {
        let north = dms_to_dd(Some("33-52-0-N")).unwrap().unwrap();
        let south = dms_to_dd(Some("33-52-0-S")).unwrap().unwrap();
        assert!(close(north, south));
        assert!(south > 0.0);
    }

    #[test]
    fn sweeps_valid_components() {
        for d in [0_u32, 1, 45, 89, 179] {
            for m in [0_u32, 15, 59] {
                for s in [0_u32, 30, 59] {
                    let input = format!("{d}-{m}-{s}-W");
                    let expected = f64::from(d) + f64::from(m) / 60.0 + f64::from(s) / 3600.0;
                    assert!(close(dms_to_dd(Some(&input)).unwrap().unwrap(), expected));
                }
            }
        }
    }

    #[test]
    fn absent_and_empty_are_none() {
        assert_eq!(dms_to_dd(None), Ok(None));
        assert_eq!(dms_to_dd(Some("")), Ok(None));
    }

    #[test]
    fn rejects_wrong_token_count() {
        assert!(matches!(
            dms_to_dd(Some("554512N")),
            Err(FormatError::TokenCount { found: 2, .. })
        ));
        assert!(matches!(
            dms_to_dd(Some("40-30-0")),
            Err(FormatError::TokenCount { found: 3, .. })
        ));
    }

    #[test]
    fn rejects_leading_letter() {
        assert!(matches!(
            dms_to_dd(Some("N40-30-0")),
            Err(FormatError::Component {
                component: "degrees",
                ..
            })
        ));
    }
}
