//! Distance scoring and best-match selection.
//!
//! Each joined pair is scored with the squared Euclidean distance between
//! the trip's start station and the site, in raw degrees. Pairs are then
//! partitioned by `ride_id` and only the closest candidate of each
//! partition is kept.
//!
//! Ordering inside a partition is a strict total order:
//! 1. computable distances before null distances (a null never wins),
//! 2. ascending distance,
//! 3. site name, county, latitude, longitude (nulls first) for exact ties.

use crate::models::{MatchedTrip, SiteDayAggregate, TripRecord};
use crate::processor::join::JoinedPair;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Squared latitude/longitude difference; null when any coordinate is
/// missing or the result is not a number
pub fn squared_distance(trip: &TripRecord, site: &SiteDayAggregate) -> Option<f64> {
    let d_lat = trip.start_station_latitude? - site.site_latitude?;
    let d_lon = trip.start_station_longitude? - site.site_longitude?;
    let distance = d_lat * d_lat + d_lon * d_lon;

    (!distance.is_nan()).then_some(distance)
}

fn compare_optional(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Secondary order used when two sites are exactly equidistant
pub fn site_tie_break(a: &SiteDayAggregate, b: &SiteDayAggregate) -> Ordering {
    a.local_site_name
        .cmp(&b.local_site_name)
        .then_with(|| a.county.cmp(&b.county))
        .then_with(|| compare_optional(a.site_latitude, b.site_latitude))
        .then_with(|| compare_optional(a.site_longitude, b.site_longitude))
}

/// Rank two scored candidates of the same ride; `Less` means `a` ranks first
fn rank_order(a: (f64, &SiteDayAggregate), b: (f64, &SiteDayAggregate)) -> Ordering {
    a.0.total_cmp(&b.0).then_with(|| site_tie_break(a.1, b.1))
}

/// Keep the rank-1 candidate of every ride, returned in `ride_id` order.
///
/// Pairs whose distance is null are never selected, so a ride whose every
/// candidate lacks coordinates has no match.
pub fn select_closest(pairs: &[JoinedPair<'_>]) -> Vec<MatchedTrip> {
    let mut best: HashMap<i64, (&TripRecord, &SiteDayAggregate, f64)> = HashMap::new();

    for pair in pairs {
        let Some(distance) = squared_distance(pair.trip, pair.site) else {
            continue;
        };

        best.entry(pair.trip.ride_id)
            .and_modify(|current| {
                if rank_order((distance, pair.site), (current.2, current.1)) == Ordering::Less {
                    *current = (pair.trip, pair.site, distance);
                }
            })
            .or_insert((pair.trip, pair.site, distance));
    }

    let mut matches: Vec<MatchedTrip> = best
        .into_values()
        .map(|(trip, site, distance)| MatchedTrip::from_parts(trip, site, distance))
        .collect();
    matches.sort_by_key(|m| m.ride_id);
    matches
}
