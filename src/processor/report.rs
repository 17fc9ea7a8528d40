//! Match reporting.
//!
//! Per-site ride counts and the console preview of matched trips. Nothing
//! here is persisted.

use crate::models::{MatchedTrip, SiteMatchCount};
use colored::*;
use std::collections::HashMap;

/// Count matched trips per site name.
///
/// Ordered by descending count, then site name (unnamed sites first).
pub fn site_match_counts(matches: &[MatchedTrip]) -> Vec<SiteMatchCount> {
    let mut counts: HashMap<Option<&str>, usize> = HashMap::new();
    for matched in matches {
        *counts.entry(matched.local_site_name.as_deref()).or_default() += 1;
    }

    let mut report: Vec<SiteMatchCount> = counts
        .into_iter()
        .map(|(name, ride_count)| SiteMatchCount {
            local_site_name: name.map(str::to_string),
            ride_count,
        })
        .collect();
    report.sort_by(|a, b| {
        b.ride_count
            .cmp(&a.ride_count)
            .then_with(|| a.local_site_name.cmp(&b.local_site_name))
    });
    report
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "null".to_string())
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| format!("{v:.4}"))
}

/// Render one matched trip as a single preview line
pub fn format_match_line(matched: &MatchedTrip) -> String {
    format!(
        "ride {} | {} | start {} ({}, {}) | site {} / {} ({}, {}) | pm2.5 {} | aqi {} | d² {:.6}",
        matched.ride_id,
        matched
            .trip_start_timestamp
            .map_or_else(|| "null".to_string(), |t| t.to_string()),
        text(&matched.start_station_id),
        number(matched.start_station_latitude),
        number(matched.start_station_longitude),
        text(&matched.local_site_name),
        text(&matched.county),
        number(matched.site_latitude),
        number(matched.site_longitude),
        number(matched.avg_pm25),
        number(matched.avg_aqi),
        matched.squared_distance
    )
}

/// Print up to `limit` matched trips
pub fn print_match_preview(matches: &[MatchedTrip], limit: usize) {
    if limit == 0 {
        return;
    }

    println!(
        "\n{} (showing {} of {})",
        "Matched trips".bright_green().bold(),
        matches.len().min(limit),
        matches.len()
    );
    for matched in matches.iter().take(limit) {
        println!("  {}", format_match_line(matched));
    }
}

/// Print up to `limit` per-site counts
pub fn print_site_counts(counts: &[SiteMatchCount], limit: usize) {
    if limit == 0 {
        return;
    }

    println!(
        "\n{} (showing {} of {})",
        "Rides per site".bright_green().bold(),
        counts.len().min(limit),
        counts.len()
    );
    for count in counts.iter().take(limit) {
        println!(
            "  {} {}",
            format!("{:<40}", text(&count.local_site_name)).bright_cyan(),
            count.ride_count.to_string().bright_white().bold()
        );
    }
}
