#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and ranking of location statistics.
//!
//! Statistics lines that describe the same physical location are merged
//! into one [`AggregatedLocation`] and the locations are ranked by how many
//! events they account for. The top of the ranking drives map rendering
//! and the report.

use std::collections::HashMap;

use loc_analyze_location_models::{AggregatedLocation, LocationKey, LocationStatRecord};
use serde::Serialize;

/// Aggregated locations ordered by descending event count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub locations: Vec<AggregatedLocation>,
}

impl Ranking {
    /// The first `n` locations (fewer if the ranking is shorter).
    #[must_use]
    pub fn top(&self, n: usize) -> &[AggregatedLocation] {
        &self.locations[..n.min(self.locations.len())]
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Total events over every location.
    #[must_use]
    pub fn total_events(&self) -> f64 {
        self.locations.iter().map(|l| l.event_count).sum()
    }
}

/// Exact identity of a [`LocationKey`]. Coordinates compare bit for bit so
/// that `0.0` placeholders from unparseable coordinates never merge with
/// real fixes at the same address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeyBits {
    address: String,
    latitude: u64,
    longitude: u64,
}

impl KeyBits {
    fn of(record: &LocationStatRecord) -> Self {
        Self {
            address: record.address.clone(),
            latitude: record.latitude_dd.to_bits(),
            longitude: record.longitude_dd.to_bits(),
        }
    }
}

/// Groups statistics records by `(address, latitude_dd, longitude_dd)` and
/// ranks the groups.
///
/// Groups are emitted in the order their key is first seen and then
/// stable-sorted by summed event count, highest first, so ties keep input
/// order.
// Exact-tuple grouping splits a location whose coordinates were written
// two different ways. Kept as is until the operators settle on one
// notation.
#[must_use]
pub fn aggregate(records: &[LocationStatRecord]) -> Ranking {
    let mut index: HashMap<KeyBits, usize> = HashMap::new();
    let mut locations: Vec<AggregatedLocation> = Vec::new();

    for record in records {
        let slot = *index.entry(KeyBits::of(record)).or_insert_with(|| {
            locations.push(AggregatedLocation {
                key: LocationKey {
                    address: record.address.clone(),
                    latitude_dd: record.latitude_dd,
                    longitude_dd: record.longitude_dd,
                },
                event_count: 0.0,
                percentage: 0.0,
                record_count: 0,
            });
            locations.len() - 1
        });

        let location = &mut locations[slot];
        location.event_count += record.event_count;
        location.percentage += record.percentage;
        location.record_count += 1;
    }

    locations.sort_by(|a, b| b.event_count.total_cmp(&a.event_count));

    log::debug!(
        "Aggregated {} statistics records into {} locations",
        records.len(),
        locations.len()
    );

    Ranking { locations }
}

#[cfg(test)]
mod tests {
    use loc_analyze_location_models::config::DEFAULT_TOP_N;

    use super::*;

    fn record(address: &str, lat: f64, lon: f64, count: f64, pct: f64) -> LocationStatRecord {
        LocationStatRecord {
            event_count: count,
            percentage: pct,
            address: address.to_string(),
            latitude_dd: lat,
            longitude_dd: lon,
            ..LocationStatRecord::default()
        }
    }

    #[test]
    fn merges_identical_keys() {
        let ranking = aggregate(&[
            record("A", 55.0, 37.0, 3.0, 30.0),
            record("B", 56.0, 38.0, 2.0, 20.0),
            record("A", 55.0, 37.0, 4.0, 40.0),
        ]);

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking.locations[0].address(), "A");
        assert_eq!(ranking.locations[0].event_count, 7.0);
        assert_eq!(ranking.locations[0].percentage, 70.0);
        assert_eq!(ranking.locations[0].record_count, 2);
    }

    #[test]
    fn conserves_totals() {
        let records = [
            record("A", 1.0, 1.0, 5.0, 10.0),
            record("B", 2.0, 2.0, 7.0, 14.0),
            record("A", 1.0, 1.0, 1.0, 2.0),
            record("C", 0.0, 0.0, 9.0, 18.0),
        ];
        let ranking = aggregate(&records);

        let input_count: f64 = records.iter().map(|r| r.event_count).sum();
        let input_pct: f64 = records.iter().map(|r| r.percentage).sum();
        let output_pct: f64 = ranking.locations.iter().map(|l| l.percentage).sum();

        assert_eq!(ranking.total_events(), input_count);
        assert_eq!(output_pct, input_pct);
    }

    #[test]
    fn same_address_different_coordinates_stay_apart() {
        let ranking = aggregate(&[
            record("Depot", 0.0, 0.0, 1.0, 1.0),
            record("Depot", 55.5, 37.5, 2.0, 2.0),
        ]);

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking.locations[0].latitude_dd(), 55.5);
        assert_eq!(ranking.locations[1].latitude_dd(), 0.0);
    }

    #[test]
    fn ranks_descending_and_keeps_tie_order() {
        let ranking = aggregate(&[
            record("low", 1.0, 1.0, 1.0, 0.0),
            record("tie-first", 2.0, 2.0, 5.0, 0.0),
            record("high", 3.0, 3.0, 9.0, 0.0),
            record("tie-second", 4.0, 4.0, 5.0, 0.0),
        ]);

        let order: Vec<&str> = ranking.locations.iter().map(AggregatedLocation::address).collect();
        assert_eq!(order, ["high", "tie-first", "tie-second", "low"]);
        assert!(
            ranking
                .locations
                .windows(2)
                .all(|w| w[0].event_count >= w[1].event_count)
        );
    }

    #[test]
    fn top_is_clamped_to_ranking_length() {
        let ranking = aggregate(&[
            record("A", 1.0, 1.0, 1.0, 1.0),
            record("B", 2.0, 2.0, 2.0, 2.0),
        ]);

        assert_eq!(ranking.top(DEFAULT_TOP_N).len(), 2);
        assert_eq!(ranking.top(1)[0].address(), "B");
        assert!(ranking.top(0).is_empty());
    }

    #[test]
    fn empty_input_gives_empty_ranking() {
        let ranking = aggregate(&[]);
        assert!(ranking.is_empty());
        assert_eq!(ranking.total_events(), 0.0);
    }
}
