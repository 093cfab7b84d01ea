//! Aggregated pilot statistics.

use serde::{Deserialize, Serialize};

/// Counters recomputed from a pilot's full participation history.
///
/// Overwritten wholesale on every aggregation pass, which keeps the
/// aggregator idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PilotStatistics {
    /// Races entered
    pub race_count: u32,

    /// First-place finishes
    pub wins: u32,

    /// Finishes in places 1-3
    pub podiums: u32,

    /// Finishes in places 1-5
    pub top5: u32,

    /// Finishes in places 1-10
    pub top10: u32,

    /// `podiums / race_count * 100`, rounded to 2 decimals
    pub podium_percentage: f64,
}
