use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use common::{Observation, Series, TimeLevel};
use tracing::{debug, info, warn};

/// Input row before its timestamp has been parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub entity_id: String,
    pub timestamp: String,
    pub value: f64,
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a `%Y-%m-%d` date (midnight) or a date with a time of day.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Parse timestamps, dropping rows whose timestamp cannot be read.
///
/// Returns the parsed observations and the number of dropped rows.
pub fn parse_observations<I>(rows: I) -> (Vec<Observation>, usize)
where
    I: IntoIterator<Item = RawObservation>,
{
    let mut parsed = Vec::new();
    let mut dropped = 0usize;
    for row in rows {
        match parse_timestamp(&row.timestamp) {
            Some(ts) => parsed.push(Observation::new(row.entity_id, ts, row.value)),
            None => {
                dropped += 1;
                debug!(entity = %row.entity_id, timestamp = %row.timestamp, "Unparseable timestamp");
            }
        }
    }
    if dropped > 0 {
        warn!(dropped, "Dropped rows with unparseable timestamps");
    }
    (parsed, dropped)
}

/// Build one dense series per entity on the `level` grid.
///
/// Each grid starts at the entity's first timestamp and runs up to the
/// latest timestamp of any entity. Missing periods are filled with 0,
/// duplicate timestamps are summed, and observations that do not fall on
/// the entity's grid are discarded. Output is sorted by entity id.
pub fn fill_time_grid(observations: &[Observation], level: TimeLevel) -> Vec<Series> {
    let Some(global_max) = observations.iter().map(|o| o.timestamp).max() else {
        return Vec::new();
    };

    let mut by_entity: BTreeMap<&str, BTreeMap<NaiveDateTime, f64>> = BTreeMap::new();
    for obs in observations {
        *by_entity
            .entry(obs.entity_id.as_str())
            .or_default()
            .entry(obs.timestamp)
            .or_insert(0.0) += obs.value;
    }

    let mut filled_total = 0usize;
    let series: Vec<Series> = by_entity
        .into_iter()
        .filter_map(|(entity_id, points)| {
            let (&anchor, _) = points.iter().next()?;
            let timestamps = grid(anchor, global_max, level);
            let mut matched = 0usize;
            let values: Vec<f64> = timestamps
                .iter()
                .map(|ts| match points.get(ts) {
                    Some(v) => {
                        matched += 1;
                        *v
                    }
                    None => 0.0,
                })
                .collect();

            if matched < points.len() {
                debug!(
                    entity = entity_id,
                    off_grid = points.len() - matched,
                    "Discarded observations off the time grid"
                );
            }
            filled_total += timestamps.len() - matched;

            Some(Series {
                entity_id: entity_id.to_string(),
                timestamps,
                values,
            })
        })
        .collect();

    info!(
        entities = series.len(),
        rows = series.iter().map(Series::len).sum::<usize>(),
        filled = filled_total,
        end = %global_max,
        "Normalized time grid"
    );

    series
}

fn grid(anchor: NaiveDateTime, end: NaiveDateTime, level: TimeLevel) -> Vec<NaiveDateTime> {
    let mut out = Vec::new();
    let mut k = 0u32;
    while let Some(ts) = level.advance(anchor, k) {
        if ts > end {
            break;
        }
        out.push(ts);
        k += 1;
    }
    out
}
