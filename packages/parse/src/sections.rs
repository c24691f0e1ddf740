//! Blank-line section splitting.
//!
//! A well-formed log has exactly two entirely empty lines. The first one
//! closes the event-metadata section and the second one opens the
//! location-statistics section. Line 0 is a header and is not parsed.

/// The two parsed parts of a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Events,
    Stats,
}

impl SectionKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Events => "event metadata",
            Self::Stats => "location statistics",
        }
    }
}

/// A contiguous run of lines belonging to one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSection<'a> {
    /// Zero-based index of `lines[0]` in the whole file.
    pub first_line: usize,
    pub lines: &'a [String],
}

impl RawSection<'_> {
    /// One-based file line number of the `index`-th line of the section.
    #[must_use]
    pub const fn line_number(&self, index: usize) -> usize {
        self.first_line + index + 1
    }
}

/// The parseable parts of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSections<'a> {
    pub header: &'a str,
    pub events: RawSection<'a>,
    pub stats: RawSection<'a>,
}

/// Why a file could not be cut into sections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionError {
    #[error("expected 2 blank-line boundaries, found {found}")]
    TooFewBoundaries { found: usize },

    #[error("the {} section is empty", .kind.label())]
    EmptySection { kind: SectionKind },
}

/// Returns, for every entirely empty line, the index of the line that
/// follows it.
///
/// Inputs with fewer than two lines have no section structure and yield
/// an empty list.
#[must_use]
pub fn blank_line_boundaries<S: AsRef<str>>(lines: &[S]) -> Vec<usize> {
    if lines.len() <= 1 {
        return Vec::new();
    }

    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.as_ref().is_empty())
        .map(|(i, _)| i + 1)
        .collect()
}

/// Splits a log's lines into its event and statistics sections.
///
/// Events are `lines[1 .. b0 - 1]` and statistics `lines[b1 ..]` where
/// `b0`, `b1` are the first two [`blank_line_boundaries`]. Any further
/// blank lines stay inside the statistics section.
///
/// # Errors
///
/// Returns [`SectionError::TooFewBoundaries`] when there are fewer than two
/// blank lines and [`SectionError::EmptySection`] when either section has
/// no lines.
pub fn split_sections(lines: &[String]) -> Result<LogSections<'_>, SectionError> {
    let boundaries = blank_line_boundaries(lines);
    let &[first, second, ..] = boundaries.as_slice() else {
        return Err(SectionError::TooFewBoundaries {
            found: boundaries.len(),
        });
    };

    let events_end = first - 1;
    let events = lines.get(1..events_end).unwrap_or_default();
    let stats = &lines[second..];

    if events.is_empty() {
        return Err(SectionError::EmptySection {
            kind: SectionKind::Events,
        });
    }
    if stats.is_empty() {
        return Err(SectionError::EmptySection {
            kind: SectionKind::Stats,
        });
    }

    Ok(LogSections {
        header: lines[0].as_str(),
        events: RawSection {
            first_line: 1,
            lines: events,
        },
        stats: RawSection {
            first_line: second,
            lines: stats,
        },
    })
}
