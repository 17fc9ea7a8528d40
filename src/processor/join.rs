//! Date-keyed join of trips against site/day aggregates.
//!
//! Every trip is paired with every aggregate observed on the trip's start
//! date. Trips without a start date, or with no same-date aggregate, produce
//! no pairs. Aggregates are bucketed by date once so each trip only visits
//! its own date's candidates; within a date the candidate set is complete.

use crate::models::{SiteDayAggregate, TripRecord};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Site/day aggregates bucketed by calendar date
#[derive(Debug, Default, Clone)]
pub struct SiteDateIndex {
    by_date: HashMap<NaiveDate, Vec<SiteDayAggregate>>,
    undated: usize,
}

impl SiteDateIndex {
    /// Build the index; aggregates without a date can never match and are
    /// only counted
    pub fn new(aggregates: Vec<SiteDayAggregate>) -> Self {
        let mut by_date: HashMap<NaiveDate, Vec<SiteDayAggregate>> = HashMap::new();
        let mut undated = 0;

        for aggregate in aggregates {
            match aggregate.date {
                Some(date) => by_date.entry(date).or_default().push(aggregate),
                None => undated += 1,
            }
        }

        Self { by_date, undated }
    }

    /// Aggregates observed on `date`
    pub fn candidates(&self, date: NaiveDate) -> &[SiteDayAggregate] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct dates with at least one aggregate
    pub fn date_count(&self) -> usize {
        self.by_date.len()
    }

    /// Number of aggregates whose date could not be parsed
    pub fn undated_count(&self) -> usize {
        self.undated
    }
}

/// One trip paired with one same-date site aggregate
#[derive(Debug, Clone, Copy)]
pub struct JoinedPair<'a> {
    pub trip: &'a TripRecord,
    pub site: &'a SiteDayAggregate,
}

/// Inner equi-join of trips and aggregates on calendar date.
///
/// A trip with N same-date aggregates yields N pairs; nothing is
/// deduplicated here.
pub fn join_on_date<'a>(trips: &'a [TripRecord], index: &'a SiteDateIndex) -> Vec<JoinedPair<'a>> {
    trips
        .iter()
        .filter_map(move |trip| trip.date_key().map(|date| (trip, index.candidates(date))))
        .flat_map(|(trip, sites)| sites.iter().map(move |site| JoinedPair { trip, site }))
        .collect()
}
