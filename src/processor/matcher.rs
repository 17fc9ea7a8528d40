//! Partitioned join + ranking.
//!
//! The trip set is split into contiguous partitions and each partition is
//! joined and ranked on the blocking pool. Every ride lives in exactly one
//! partition, so merging the partition outputs and sorting by `ride_id`
//! gives the same result for any partition count.

use crate::error::{JoinError, Result};
use crate::models::{MatchedTrip, TripRecord};
use crate::processor::join::{SiteDateIndex, join_on_date};
use crate::processor::ranking::select_closest;

use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;
use tracing::debug;

/// Result of matching one or more partitions
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Best match per ride, sorted by `ride_id`
    pub matches: Vec<MatchedTrip>,
    /// Number of (trip, site) pairs produced by the date join
    pub candidate_pairs: usize,
}

/// Join and rank a single partition synchronously
pub fn match_partition(trips: &[TripRecord], index: &SiteDateIndex) -> MatchOutcome {
    let pairs = join_on_date(trips, index);
    let matches = select_closest(&pairs);
    MatchOutcome {
        candidate_pairs: pairs.len(),
        matches,
    }
}

/// Join and rank all trips across `partitions` concurrent blocking tasks
pub async fn match_trips(
    trips: Vec<TripRecord>,
    index: Arc<SiteDateIndex>,
    partitions: usize,
) -> Result<MatchOutcome> {
    if trips.is_empty() {
        return Ok(MatchOutcome::default());
    }

    let partitions = partitions.max(1);
    let partition_size = trips.len().div_ceil(partitions);
    let chunks: Vec<Vec<TripRecord>> = trips
        .chunks(partition_size)
        .map(|chunk| chunk.to_vec())
        .collect();
    let chunk_count = chunks.len();

    debug!(
        "Matching {} trips across {} partitions of up to {} trips",
        trips.len(),
        chunk_count,
        partition_size
    );

    let outcomes: Vec<MatchOutcome> = stream::iter(chunks.into_iter().enumerate())
        .map(|(partition, chunk)| {
            let index = Arc::clone(&index);
            async move {
                let outcome = task::spawn_blocking(move || match_partition(&chunk, &index))
                    .await
                    .map_err(|e| JoinError::ProcessingFailed {
                        path: PathBuf::from(format!("partition-{partition}")),
                        reason: format!("Matching task failed: {}", e),
                    })?;
                debug!(
                    "Partition {} produced {} pairs and {} matches",
                    partition,
                    outcome.candidate_pairs,
                    outcome.matches.len()
                );
                Ok::<_, JoinError>(outcome)
            }
        })
        .buffer_unordered(chunk_count)
        .try_collect()
        .await?;

    let mut merged = MatchOutcome::default();
    for outcome in outcomes {
        merged.candidate_pairs += outcome.candidate_pairs;
        merged.matches.extend(outcome.matches);
    }
    merged.matches.sort_by_key(|m| m.ride_id);

    Ok(merged)
}
