//! Small HTML writing helpers.

use std::borrow::Cow;
use std::fmt::{self, Write};

/// Escapes text for use in element content and quoted attributes.
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Whole numbers without a fractional part, everything else as is.
#[must_use]
pub fn number(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Writes a table with a leading zero-based row index column. Cells are
/// escaped.
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn write_table<W, R>(out: &mut W, headers: &[&str], rows: R) -> fmt::Result
where
    W: Write,
    R: IntoIterator<Item = Vec<String>>,
{
    out.write_str("<table>\n<thead><tr><th></th>")?;
    for header in headers {
        write!(out, "<th>{}</th>", escape(header))?;
    }
    out.write_str("</tr></thead>\n<tbody>\n")?;

    for (i, row) in rows.into_iter().enumerate() {
        write!(out, "<tr><th>{i}</th>")?;
        for cell in &row {
            write!(out, "<td>{}</td>", escape(cell))?;
        }
        out.write_str("</tr>\n")?;
    }

    out.write_str("</tbody>\n</table>\n")
}
