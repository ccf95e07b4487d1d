//! Report configuration
//!
//! Tunables that would otherwise hide as module-level constants. They are
//! passed explicitly into the aggregator and document builder so tests can
//! vary them per case.

use serde::{Deserialize, Serialize};

/// Configuration for aggregation and document assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Weekly intensity-minutes goal drawn as a reference line in the
    /// weekly chart
    pub weekly_intensity_goal_minutes: f64,
    /// Row cap for the ranked top-activity tables
    pub top_n: usize,
    /// Weight applied to vigorous intensity minutes when combining them
    /// with moderate minutes into a single daily total
    pub vigorous_weight: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            weekly_intensity_goal_minutes: 200.0,
            top_n: 10,
            vigorous_weight: 2.0,
        }
    }
}
