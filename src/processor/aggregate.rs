//! Site/day aggregation of air-quality readings.
//!
//! Readings are grouped by (site name, county, date, latitude, longitude)
//! and reduced to the mean pm2.5 concentration and mean AQI of each group.
//! Null inputs are skipped by the means; a group with no usable value gets
//! a null mean.

use crate::models::{AirQualityReading, SiteDayAggregate};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

/// Hashable form of the grouping key; coordinates are compared by bit
/// pattern with negative zero folded into zero
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    local_site_name: Option<String>,
    county: Option<String>,
    date: Option<NaiveDate>,
    site_latitude: Option<u64>,
    site_longitude: Option<u64>,
}

impl GroupKey {
    fn of(reading: &AirQualityReading) -> Self {
        Self {
            local_site_name: reading.local_site_name.clone(),
            county: reading.county.clone(),
            date: reading.date,
            site_latitude: coordinate_bits(reading.site_latitude),
            site_longitude: coordinate_bits(reading.site_longitude),
        }
    }
}

fn coordinate_bits(value: Option<f64>) -> Option<u64> {
    value.map(|v| if v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() })
}

#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

struct Group {
    template: SiteDayAggregate,
    pm25: MeanAccumulator,
    aqi: MeanAccumulator,
}

/// Collapse readings into one aggregate per distinct site/day key.
///
/// Output order is the order in which each key is first seen.
pub fn aggregate_site_days(readings: &[AirQualityReading]) -> Vec<SiteDayAggregate> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for reading in readings {
        let slot = *index.entry(GroupKey::of(reading)).or_insert_with(|| {
            groups.push(Group {
                template: SiteDayAggregate {
                    local_site_name: reading.local_site_name.clone(),
                    county: reading.county.clone(),
                    date: reading.date,
                    site_latitude: reading.site_latitude,
                    site_longitude: reading.site_longitude,
                    avg_pm25: None,
                    avg_aqi: None,
                },
                pm25: MeanAccumulator::default(),
                aqi: MeanAccumulator::default(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.pm25.push(reading.pm25_concentration);
        group.aqi.push(reading.air_quality_index);
    }

    debug!(
        "Aggregated {} readings into {} site-day groups",
        readings.len(),
        groups.len()
    );

    groups
        .into_iter()
        .map(|group| SiteDayAggregate {
            avg_pm25: group.pm25.mean(),
            avg_aqi: group.aqi.mean(),
            ..group.template
        })
        .collect()
}
