#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTML reports for analyzed location logs.
//!
//! One self-contained document per file group: a summary table of the top
//! ranked locations, then a section per location with its map image, a
//! pop-up chronology of the events recorded at that address and the
//! statistics lines that contributed to it.

pub mod html;
pub mod resources;

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use loc_analyze_location_models::{AggregatedLocation, EventRecord, LocationStatRecord, RenderedMap};

pub use resources::Resources;

use crate::html::{escape, number, write_table};

/// Errors that can occur while assembling or writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A resource or the report file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Formatting the document failed.
    #[error("failed to format report: {0}")]
    Format(#[from] fmt::Error),
}

const TITLE: &str = "Анализ местоположений";

const SUMMARY_HEADERS: &[&str] = &["Адрес", "Широта", "Долгота", "Кол-во событий тех.", "%"];

const EVENT_HEADERS: &[&str] = &["Дата и время", "Параметр", "Оператор", "Сота", "Сектор", "Адрес"];

const STATS_HEADERS: &[&str] = &[
    "Кол-во событий",
    "%",
    "Оператор",
    "Сота",
    "Сектор",
    "Адрес",
    "Широта",
    "Долгота",
    "Широта (DD)",
    "Долгота (DD)",
    "Азимут",
];

/// Everything that goes into one group's report.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    /// Base name of the file group, used in the title and file name.
    pub base_name: &'a str,
    /// Ranked locations that get a section, best first.
    pub top: &'a [AggregatedLocation],
    pub events: &'a [EventRecord],
    pub stats: &'a [LocationStatRecord],
    /// Images that were produced. A location without an entry gets a
    /// placeholder instead of a map.
    pub maps: &'a [RenderedMap],
}

impl ReportInput<'_> {
    fn map_for(&self, index: usize) -> Option<&RenderedMap> {
        self.maps.iter().find(|m| m.location_index == index)
    }
}

/// File name of the report for `base_name`.
#[must_use]
pub fn report_file_name(base_name: &str) -> String {
    format!("loc_analyze_{base_name}.html")
}

/// Builds the HTML document.
///
/// # Errors
///
/// Returns [`ReportError::Format`] if formatting fails.
pub fn build_report(input: &ReportInput<'_>, resources: &Resources) -> Result<String, ReportError> {
    let mut out = String::new();

    writeln!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{TITLE}: {}</title>\n<style>\n{}\n</style>\n</head>\n<body>",
        escape(input.base_name),
        resources.style
    )?;
    writeln!(out, "<h1>{TITLE} объекта {}.</h1>", escape(input.base_name))?;

    write_summary(&mut out, input)?;

    out.push_str("<br><hr>\n");
    out.push_str(
        "<h3>Ниже представлены снимки карт указанных местоположений. \
         Также представлена подробная информация (см. последние цифры ID).</h3>\n",
    );

    for (index, location) in input.top.iter().enumerate() {
        write_location(&mut out, input, index, location)?;
    }

    out.push_str(&resources.script_element());
    out.push_str("\n</body>\n</html>\n");

    Ok(out)
}

fn write_summary(out: &mut String, input: &ReportInput<'_>) -> fmt::Result {
    writeln!(
        out,
        "<p>В таблице представлены {} местоположений с наибольшим количеством событий:</p>\n<p>",
        input.top.len()
    )?;
    write_table(
        out,
        SUMMARY_HEADERS,
        input.top.iter().map(|location| {
            vec![
                location.address().to_string(),
                location.latitude_dd().to_string(),
                location.longitude_dd().to_string(),
                number(location.event_count),
                number(location.percentage),
            ]
        }),
    )?;
    out.write_str("</p>\n")
}

fn write_location(
    out: &mut String,
    input: &ReportInput<'_>,
    index: usize,
    location: &AggregatedLocation,
) -> fmt::Result {
    let address = location.address();

    writeln!(
        out,
        "<section class='location' id='location{index}'>\n<p>{index} - {} - {} событий. \
         <a href=\"javascript:PopUpShow('#chronology{index}')\">Хронология по этому МП.</a></p>",
        escape(address),
        number(location.event_count)
    )?;

    writeln!(
        out,
        "<div class='b-popup' id='chronology{index}'><div class='wrapper'><div class='b-popup-content'>\n\
         <a href=\"javascript:PopUpHide('#chronology{index}')\">Скрыть</a><br>\n<div class='popup_internal'>"
    )?;
    write_table(
        out,
        EVENT_HEADERS,
        input
            .events
            .iter()
            .filter(|event| event.address == address)
            .map(event_row),
    )?;
    out.write_str("</div></div></div></div>\n")?;

    match input.map_for(index) {
        Some(map) => {
            let href = map
                .image_path
                .file_name()
                .map_or_else(|| map.image_path.to_string_lossy(), |name| name.to_string_lossy());
            let href = escape(&href);
            writeln!(
                out,
                "<a target='_blank' href=\"{href}\"><img src=\"{href}\" alt=\"Location\"></a>"
            )?;
        }
        None => {
            out.write_str("<p class='map-placeholder'>Карта для этого местоположения недоступна.</p>\n")?;
        }
    }

    out.write_str("<h4>Кол-во событий :</h4>\n")?;
    write_table(
        out,
        STATS_HEADERS,
        input
            .stats
            .iter()
            .filter(|record| record.address == address)
            .map(stats_row),
    )?;

    out.write_str("<br><hr width='50%'><br>\n</section>\n")
}

fn optional(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn event_row(event: &EventRecord) -> Vec<String> {
    vec![
        event.timestamp.clone(),
        optional(event.numeric_param.as_ref()),
        optional(event.operator_code.as_ref()),
        optional(event.cell_major.as_ref()),
        optional(event.cell_minor.as_ref()),
        event.address.clone(),
    ]
}

fn stats_row(record: &LocationStatRecord) -> Vec<String> {
    vec![
        number(record.event_count),
        number(record.percentage),
        optional(record.operator_code.as_ref()),
        optional(record.cell_major.as_ref()),
        optional(record.cell_minor.as_ref()),
        record.address.clone(),
        optional(record.latitude_dms.as_ref()),
        optional(record.longitude_dms.as_ref()),
        record.latitude_dd.to_string(),
        record.longitude_dd.to_string(),
        optional(record.azimuth.as_ref()),
    ]
}

/// Builds the report and writes it to `output_dir`, replacing any earlier
/// report for the same group. Returns the path written.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the file cannot be written.
pub fn write_report(
    output_dir: &Path,
    input: &ReportInput<'_>,
    resources: &Resources,
) -> Result<PathBuf, ReportError> {
    let html = build_report(input, resources)?;
    let path = output_dir.join(report_file_name(input.base_name));

    std::fs::write(&path, html).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;

    log::info!("Wrote report {}", path.display());

    Ok(path)
}
