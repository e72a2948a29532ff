use serde::Deserialize;

/// Options applied while a call tree is frozen from measured records.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Largest accepted `|total - (self + children)|` per edge, relative to
    /// the edge's total time (absolute below a total of 1).
    pub time_tolerance: f64,
    /// Reject edges that break `total_time == self_time + children_time`.
    pub validate_time_identity: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            time_tolerance: 1e-9,
            validate_time_identity: true,
        }
    }
}

/// Options for the ranked method list.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Hottest method first. `false` yields the raw ascending ranking order.
    pub descending: bool,
    /// Drop methods whose total time is below this share (0-100) of the
    /// tree's total time.
    pub min_percent: f64,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            descending: true,
            min_percent: 0.0,
        }
    }
}
