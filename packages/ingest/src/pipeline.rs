//! The per-group analysis pipeline and the batch runner.
//!
//! For every eligible file group the location log is decoded, cut into
//! sections and parsed, the statistics are aggregated and ranked, the top
//! locations are projected and rendered and finally the HTML report is
//! written. Problems are contained at the narrowest level possible: a bad
//! line is skipped, a failed map leaves a placeholder, a failed group is
//! counted and the batch moves on.

use std::path::{Path, PathBuf};

use loc_analyze_analytics::{Ranking, aggregate};
use loc_analyze_geography::WebMercator;
use loc_analyze_location_models::config::AnalyzeConfig;
use loc_analyze_location_models::{
    AggregatedLocation, EventRecord, FileGroup, LocationStatRecord, RenderedMap,
};
use loc_analyze_parse::events::parse_events;
use loc_analyze_parse::sections::{SectionError, SectionKind, split_sections};
use loc_analyze_parse::stats::parse_stats;
use loc_analyze_parse::{Parsed, read_log};
use loc_analyze_render::{MapRenderer, RenderRequest, image_file_name};
use loc_analyze_report::{ReportInput, Resources, write_report};
use serde::Serialize;

use crate::IngestError;
use crate::classify::classify;
use crate::progress::ProgressCallback;

/// Everything parsed and derived from one location log.
#[derive(Debug, Clone)]
pub struct LogAnalysis {
    pub header: String,
    pub events: Parsed<EventRecord>,
    pub stats: Parsed<LocationStatRecord>,
    pub ranking: Ranking,
}

/// Splits, parses and ranks the decoded lines of a location log.
///
/// # Errors
///
/// Returns a [`SectionError`] when the file does not have the expected
/// section layout.
pub fn analyze_lines(lines: &[String]) -> Result<LogAnalysis, SectionError> {
    let sections = split_sections(lines)?;
    let events = parse_events(&sections.events);
    let stats = parse_stats(&sections.stats);
    let ranking = aggregate(&stats.records);

    Ok(LogAnalysis {
        header: sections.header.to_string(),
        events,
        stats,
        ranking,
    })
}

/// Reads and analyzes a single location log.
///
/// # Errors
///
/// Returns [`IngestError::Read`] if the file cannot be read or decoded and
/// [`IngestError::Malformed`] if its layout is wrong.
pub fn analyze_log(path: &Path, encoding: &str) -> Result<LogAnalysis, IngestError> {
    let lines = read_log(path, encoding)?;
    analyze_lines(&lines).map_err(|source| IngestError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Why a group produced no report without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The group has companion files but no location log.
    MissingLog,
    /// The location log does not have the expected section layout.
    Malformed(SectionError),
}

/// Counters and outputs for one processed group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub base_name: String,
    pub log_path: PathBuf,
    pub report_path: PathBuf,
    pub events_parsed: usize,
    pub stats_parsed: usize,
    pub skipped_lines: usize,
    pub field_warnings: usize,
    /// Distinct locations after aggregation.
    pub locations: usize,
    pub maps: Vec<RenderedMap>,
    /// Top locations whose map could not be produced.
    pub failed_maps: usize,
    /// Top locations without an address, which are never rendered.
    pub unaddressed: usize,
}

/// Result of one group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Reported(GroupReport),
    Skipped(SkipReason),
}

/// Totals for a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reports: Vec<GroupReport>,
}

/// Runs the pipeline with a fixed configuration and map renderer.
pub struct Analyzer<R> {
    config: AnalyzeConfig,
    renderer: R,
    resources: Resources,
    projection: WebMercator,
    output_dir: Option<PathBuf>,
}

impl<R: MapRenderer> Analyzer<R> {
    /// Creates an analyzer. Reports and images are written to `output_dir`
    /// when given, otherwise next to each location log.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Report`] if a report resource exists but
    /// cannot be read, and [`IngestError::Projection`] if the projection
    /// cannot be set up.
    pub fn new(
        config: AnalyzeConfig,
        renderer: R,
        output_dir: Option<PathBuf>,
    ) -> Result<Self, IngestError> {
        let resources = Resources::load(&config.report.resources_dir)?;
        let projection = WebMercator::new()?;

        Ok(Self {
            config,
            renderer,
            resources,
            projection,
            output_dir,
        })
    }

    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Classifies `root` and processes every group in base-name order.
    ///
    /// Individual group failures are logged and counted; they never stop
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::FileSystem`] or [`IngestError::NotADirectory`]
    /// if `root` cannot be walked.
    pub fn run_batch(
        &self,
        root: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<BatchSummary, IngestError> {
        let groups = classify(root, &self.config.discovery)?;
        log::info!("Processing {} file groups from {}", groups.len(), root.display());

        progress.set_total(groups.len() as u64);
        let mut summary = BatchSummary::default();

        for group in &groups {
            progress.set_message(group.base_name.clone());

            match self.process_group(group) {
                Ok(GroupOutcome::Reported(report)) => {
                    summary.processed += 1;
                    summary.reports.push(report);
                }
                Ok(GroupOutcome::Skipped(reason)) => {
                    summary.skipped += 1;
                    match reason {
                        SkipReason::MissingLog => log::info!(
                            "{}: no .{} file, skipping",
                            group.base_name,
                            self.config.discovery.log_extension
                        ),
                        SkipReason::Malformed(e) => {
                            log::warn!(
                                "{}: malformed location log, skipping: {e}",
                                group.base_name
                            );
                        }
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    log::error!("{}: {e}", group.base_name);
                }
            }

            progress.inc(1);
        }

        progress.finish(format!(
            "{} reported, {} skipped, {} failed",
            summary.processed, summary.skipped, summary.failed
        ));
        log::info!(
            "Batch complete: {} reported, {} skipped, {} failed",
            summary.processed,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    /// Runs the whole pipeline for one group.
    ///
    /// # Errors
    ///
    /// Returns an [`IngestError`] when the location log cannot be read, the
    /// output directory cannot be created or the report cannot be written.
    pub fn process_group(&self, group: &FileGroup) -> Result<GroupOutcome, IngestError> {
        let discovery = &self.config.discovery;
        let Some(log_path) = group.path_for(&discovery.log_extension) else {
            return Ok(GroupOutcome::Skipped(SkipReason::MissingLog));
        };

        let base = group.base_name.as_str();
        log::info!("{base}: processing {}", log_path.display());

        let lines = read_log(log_path, &discovery.encoding)?;
        let analysis = match analyze_lines(&lines) {
            Ok(analysis) => analysis,
            Err(e) => return Ok(GroupOutcome::Skipped(SkipReason::Malformed(e))),
        };

        log_issues(base, SectionKind::Events, &analysis.events);
        log_issues(base, SectionKind::Stats, &analysis.stats);

        let output_dir = self.output_dir_for(log_path)?;
        let top = analysis.ranking.top(self.config.render.top_n);
        let maps = self.render_maps(base, top, &output_dir);

        let report_path = write_report(
            &output_dir,
            &ReportInput {
                base_name: base,
                top,
                events: &analysis.events.records,
                stats: &analysis.stats.records,
                maps: &maps.rendered,
            },
            &self.resources,
        )?;

        Ok(GroupOutcome::Reported(GroupReport {
            base_name: base.to_string(),
            log_path: log_path.to_path_buf(),
            report_path,
            events_parsed: analysis.events.records.len(),
            stats_parsed: analysis.stats.records.len(),
            skipped_lines: analysis.events.skipped.len() + analysis.stats.skipped.len(),
            field_warnings: analysis.events.warnings.len() + analysis.stats.warnings.len(),
            locations: analysis.ranking.len(),
            maps: maps.rendered,
            failed_maps: maps.failed,
            unaddressed: maps.unaddressed,
        }))
    }

    fn output_dir_for(&self, log_path: &Path) -> Result<PathBuf, IngestError> {
        let Some(dir) = &self.output_dir else {
            return Ok(log_path
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf));
        };

        std::fs::create_dir_all(dir).map_err(|source| IngestError::FileSystem {
            path: dir.clone(),
            source,
        })?;
        Ok(dir.clone())
    }

    /// Renders a map for every top location that has an address. Failures
    /// are logged and counted.
    fn render_maps(&self, base: &str, top: &[AggregatedLocation], output_dir: &Path) -> MapResults {
        let render = &self.config.render;
        let no_address = self.config.report.no_address_label.as_str();
        let mut results = MapResults::default();

        for (index, location) in top.iter().enumerate() {
            // Addresses keep the space before their coordinates.
            if location.address().trim() == no_address {
                log::info!("{base}: location {index} has no address, not rendering a map");
                results.unaddressed += 1;
                continue;
            }

            let center = match self
                .projection
                .project(location.latitude_dd(), location.longitude_dd())
            {
                Ok(center) => center,
                Err(e) => {
                    log::warn!("{base}: cannot project location {index}: {e}");
                    results.failed += 1;
                    continue;
                }
            };

            let output = output_dir.join(image_file_name(
                base,
                index,
                render.half_width_m,
                &render.image_extension,
            ));
            let request = RenderRequest {
                center,
                half_width_m: render.half_width_m,
                width: render.width,
                height: render.height,
                marker_icon: &render.marker_icon,
                output: &output,
            };

            match self.renderer.render(&request) {
                Ok(()) => results.rendered.push(RenderedMap {
                    location_index: index,
                    image_path: output,
                }),
                Err(e) => {
                    log::warn!(
                        "{base}: map for location {index} ('{}') failed: {e}",
                        location.address().trim()
                    );
                    results.failed += 1;
                }
            }
        }

        results
    }
}

#[derive(Debug, Default)]
struct MapResults {
    rendered: Vec<RenderedMap>,
    failed: usize,
    unaddressed: usize,
}

fn log_issues<T>(base: &str, kind: SectionKind, parsed: &Parsed<T>) {
    for e in &parsed.skipped {
        log::warn!("{base}: skipped {} line: {e}", kind.label());
    }
    for w in &parsed.warnings {
        log::warn!("{base}: {w}");
    }
    log::debug!(
        "{base}: {} {} records",
        parsed.records.len(),
        kind.label()
    );
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fmt::Write as _;

    use loc_analyze_render::RenderError;

    use super::*;
    use crate::progress::NullProgress;

    /// Writes a stub file for every request and remembers the outputs.
    /// Requests whose file name contains `fail_marker` fail.
    #[derive(Default)]
    struct RecordingRenderer {
        fail_marker: Option<&'static str>,
        requests: RefCell<Vec<PathBuf>>,
    }

    impl MapRenderer for RecordingRenderer {
        fn render(&self, request: &RenderRequest<'_>) -> Result<(), RenderError> {
            self.requests.borrow_mut().push(request.output.to_path_buf());

            let name = request
                .output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.fail_marker.is_some_and(|marker| name.contains(marker)) {
                return Err(RenderError::InvalidRequest(format!("refusing {name}")));
            }

            std::fs::write(request.output, b"map").unwrap();
            Ok(())
        }
    }

    fn write_1251(path: &Path, text: &str) {
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1251.encode(text);
        assert!(!had_errors);
        std::fs::write(path, &*bytes).unwrap();
    }

    const TWO_LOCATIONS: &str = "\
Детализация 79161234567
12.03.2021 10:15:02\tdur=35\tcell=K7712-3A1F\tout\tТверская 1 (55_45_36_N, 37_36_0_E)
12.03.2021 10:20:00\tdur=12\tcell=K7712-3A1F\tout\tТверская 1 (55_45_36_N, 37_36_0_E)
12.03.2021 11:00:00\tdur=5\tcell=K7713-1B\tin\tDepot 2 (55_50_0_N, 37_40_0_E)

Итого 3 события

2 (66.67%) - K7712-3A1F - Тверская 1 (55_45_36_N, 37_36_0_E, 120 - x
malformed statistics line
1 (33.33%) - K7713-1B - Depot 2 (55_50_0_N, 37_40_0_E, 45 - y
";

    fn six_locations() -> String {
        let mut text = String::from("header\nt\tdur=1\tcell=K1-A\tStreet 0 (\n\n\n");
        for i in 0..6 {
            writeln!(
                text,
                "{} (10%) - K{i}-A - Street {i} (55_{i}_0_N, 37_{i}_0_E, 0 - z",
                60 - i
            )
            .unwrap();
        }
        text
    }

    fn analyzer(
        renderer: RecordingRenderer,
        output: Option<PathBuf>,
    ) -> Analyzer<RecordingRenderer> {
        let mut config = AnalyzeConfig::default();
        config.report.resources_dir = PathBuf::from("/nonexistent-resources");
        Analyzer::new(config, renderer, output).unwrap()
    }

    #[test]
    fn analyzes_synthetic_log_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_1251(&dir.path().join("79161234567.loc"), TWO_LOCATIONS);
        std::fs::write(dir.path().join("79161234567.inf"), b"").unwrap();

        let analyzer = analyzer(RecordingRenderer::default(), None);
        let summary = analyzer.run_batch(dir.path(), &NullProgress).unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 0);
        let report = &summary.reports[0];
        assert_eq!(report.events_parsed, 3);
        assert_eq!(report.stats_parsed, 2);
        assert_eq!(report.skipped_lines, 1);
        assert_eq!(report.locations, 2);
        assert_eq!(report.maps.len(), 2);

        assert_eq!(report.report_path, dir.path().join("loc_analyze_79161234567.html"));
        let html = std::fs::read_to_string(&report.report_path).unwrap();
        assert!(html.contains("Тверская 1"));
        assert!(html.contains("Depot 2"));
        assert!(html.contains("79161234567_0_2000.png"));
        assert!(html.contains("79161234567_1_2000.png"));
        assert!(dir.path().join("79161234567_0_2000.png").exists());
    }

    #[test]
    fn ranking_puts_busiest_location_first() {
        let lines: Vec<String> = TWO_LOCATIONS.lines().map(str::to_owned).collect();
        let analysis = analyze_lines(&lines).unwrap();

        assert_eq!(analysis.header, "Детализация 79161234567");
        assert_eq!(analysis.ranking.locations[0].address(), "Тверская 1 ");
        assert!((analysis.ranking.locations[0].latitude_dd() - 55.76).abs() < 1e-9);
        assert_eq!(analysis.stats.skipped.len(), 1);
    }

    #[test]
    fn groups_without_log_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("100.inf"), b"").unwrap();
        std::fs::write(dir.path().join("100.bil"), b"").unwrap();

        let analyzer = analyzer(RecordingRenderer::default(), None);
        let summary = analyzer.run_batch(dir.path(), &NullProgress).unwrap();

        assert_eq!(summary.processed, 0);
        assert_eq!(summary.skipped, 1);
        assert!(!dir.path().join("loc_analyze_100.html").exists());
    }

    #[test]
    fn malformed_log_is_skipped_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        write_1251(&dir.path().join("100.loc"), "header\nonly one blank\n\nstats\n");
        write_1251(&dir.path().join("200.loc"), TWO_LOCATIONS);

        let analyzer = analyzer(RecordingRenderer::default(), None);
        let summary = analyzer.run_batch(dir.path(), &NullProgress).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.reports[0].base_name, "200");
    }

    #[test]
    fn top_render_failure_leaves_placeholder_and_other_maps() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        write_1251(&dir.path().join("300.loc"), &six_locations());

        let renderer = RecordingRenderer {
            fail_marker: Some("_0_"),
            ..RecordingRenderer::default()
        };
        let analyzer = analyzer(renderer, Some(out.clone()));
        let summary = analyzer.run_batch(dir.path(), &NullProgress).unwrap();

        let report = &summary.reports[0];
        assert_eq!(report.locations, 6);
        assert_eq!(report.failed_maps, 1);
        assert_eq!(report.maps.len(), 4);
        assert_eq!(analyzer.renderer().requests.borrow().len(), 5);

        for index in 1..5 {
            assert!(out.join(format!("300_{index}_2000.png")).exists());
        }
        assert!(!out.join("300_0_2000.png").exists());
        assert!(!out.join("300_5_2000.png").exists());

        let html = std::fs::read_to_string(out.join("loc_analyze_300.html")).unwrap();
        assert_eq!(html.matches("map-placeholder'>").count(), 1);
        assert!(html.contains("Street 0 "));
    }

    #[test]
    fn locations_without_address_are_not_rendered() {
        let dir = tempfile::tempdir().unwrap();
        write_1251(
            &dir.path().join("400.loc"),
            "header\nt\tdur=1\tcell=K1-A\tx (\n\n\n\
             5 (50%) - K1-A - No address (,\n\
             3 (30%) - K2-B - Street (55_0_0_N, 37_0_0_E,\n",
        );

        let analyzer = analyzer(RecordingRenderer::default(), None);
        let summary = analyzer.run_batch(dir.path(), &NullProgress).unwrap();

        let report = &summary.reports[0];
        assert_eq!(report.unaddressed, 1);
        assert_eq!(report.maps.len(), 1);
        assert_eq!(report.maps[0].location_index, 1);
        assert_eq!(analyzer.renderer().requests.borrow().len(), 1);
    }

    #[test]
    fn missing_root_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(RecordingRenderer::default(), None);

        assert!(matches!(
            analyzer.run_batch(&dir.path().join("absent"), &NullProgress),
            Err(IngestError::FileSystem { .. })
        ));
    }

    #[test]
    fn inspect_reports_malformed_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("100.loc");
        write_1251(&path, "header\nno blank lines\n");

        assert!(matches!(
            analyze_log(&path, "windows-1251"),
            Err(IngestError::Malformed { .. })
        ));
    }
}
