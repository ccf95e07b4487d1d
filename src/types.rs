//! Core types for the report pipeline
//!
//! This module defines the data structures that flow through each stage:
//! normalized input records, the per-year aggregate, the year-over-year
//! comparison, and the final report document consumed by the renderer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One exercise session, normalized from a raw export record.
///
/// `duration_s` is always present and non-negative; every other numeric
/// field is absent rather than fabricated when the source lacks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Source activity id, used for deduplication
    pub id: Option<i64>,
    /// Free-text activity name
    pub name: Option<String>,
    /// Sport/exercise kind (e.g. "running", "lap_swimming")
    pub type_key: String,
    /// Local calendar date the activity started on
    pub date: NaiveDate,
    /// Duration in seconds (>= 0)
    pub duration_s: f64,
    /// Distance in meters; absent for non-distance activities
    pub distance_m: Option<f64>,
    /// Calories burned
    pub calories: Option<f64>,
    /// Elevation gain in meters
    pub elevation_gain_m: Option<f64>,
    /// Average heart rate (bpm)
    pub avg_hr: Option<f64>,
    /// Maximum heart rate (bpm)
    pub max_hr: Option<f64>,
}

/// One calendar day's health snapshot. All metrics optional; at most one
/// record per date survives normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyHealthRecord {
    pub date: NaiveDate,
    pub steps: Option<f64>,
    /// Weighted intensity minutes (moderate + weighted vigorous)
    pub intensity_minutes: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub sleep_score: Option<f64>,
    pub deep_sleep_hours: Option<f64>,
    pub light_sleep_hours: Option<f64>,
    pub rem_sleep_hours: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    /// Overnight heart-rate variability (ms)
    pub hrv: Option<f64>,
    /// Average stress level for the day (0-100)
    pub stress_avg: Option<f64>,
    /// Peak stress level for the day
    pub stress_max: Option<f64>,
    /// Average respiration rate during sleep (breaths/min)
    pub sleep_respiration: Option<f64>,
    pub weight_kg: Option<f64>,
    pub body_age: Option<f64>,
}

impl DailyHealthRecord {
    /// An empty snapshot for `date`
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            steps: None,
            intensity_minutes: None,
            sleep_hours: None,
            sleep_score: None,
            deep_sleep_hours: None,
            light_sleep_hours: None,
            rem_sleep_hours: None,
            resting_heart_rate: None,
            hrv: None,
            stress_avg: None,
            stress_max: None,
            sleep_respiration: None,
            weight_kg: None,
            body_age: None,
        }
    }
}

/// Overall activity KPI totals for one year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityOverview {
    pub total_activities: usize,
    /// Count of distinct dates with at least one activity
    pub active_days: usize,
    pub total_distance_km: f64,
    pub total_duration_h: f64,
    pub total_calories: f64,
    pub total_elevation_gain_m: f64,
}

/// Health KPI totals for one year. Daily averages divide by days with the
/// metric recorded, never by days in the year; a sleep-only or weigh-in-only
/// date does not dilute the step or intensity averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthOverview {
    /// Days with any daily-health record
    pub recorded_days: usize,
    /// Days with a positive sleep duration
    pub sleep_recorded_days: usize,
    pub total_steps: f64,
    pub avg_daily_steps: f64,
    pub avg_resting_heart_rate: Option<f64>,
    pub total_intensity_minutes: f64,
    pub avg_daily_intensity_minutes: f64,
    pub avg_sleep_hours: Option<f64>,
    pub avg_sleep_score: Option<f64>,
    pub avg_deep_sleep_hours: Option<f64>,
    pub avg_light_sleep_hours: Option<f64>,
    pub avg_rem_sleep_hours: Option<f64>,
}

/// Heart-rate-variability stats over the days that recorded HRV
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HrvStats {
    pub recorded_days: usize,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Stress stats over the days that recorded stress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StressStats {
    pub recorded_days: usize,
    pub avg_daily_stress: Option<f64>,
    pub max_stress_peak: Option<f64>,
}

/// Sleep-respiration stats over the days that recorded it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RespirationStats {
    pub recorded_days: usize,
    pub avg_sleep_respiration: Option<f64>,
}

/// Advanced health section: recovery and stress metrics that many exports
/// lack entirely. Every field degrades to absent, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthAdvanced {
    pub hrv: HrvStats,
    pub stress: StressStats,
    pub respiration: RespirationStats,
}

/// Unit a pace value is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceUnit {
    MinPerKm,
    MinPer100m,
}

impl PaceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaceUnit::MinPerKm => "min/km",
            PaceUnit::MinPer100m => "min/100m",
        }
    }
}

/// Derived KPIs for a single sport group (running or swimming)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportMetrics {
    pub count: usize,
    pub total_distance_km: f64,
    pub total_duration_h: f64,
    pub total_calories: f64,
    /// Average pace in `pace_unit` minutes; absent when total distance or
    /// duration is zero
    pub avg_pace: Option<f64>,
    /// Pace formatted as `m:ss <unit>`, or "N/A" when undefined
    pub pace_display: String,
    pub pace_unit: PaceUnit,
}

impl SportMetrics {
    /// Zeroed metrics for a sport with no activities
    pub fn empty(pace_unit: PaceUnit) -> Self {
        Self {
            count: 0,
            total_distance_km: 0.0,
            total_duration_h: 0.0,
            total_calories: 0.0,
            avg_pace: None,
            pace_display: "N/A".to_string(),
            pace_unit,
        }
    }
}

/// Per-sport-type aggregate. The containing vec is ordered by descending
/// count, ties broken by first-seen type, so output is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    pub type_key: String,
    pub count: usize,
    pub total_duration_h: f64,
    pub total_distance_km: f64,
    pub total_calories: f64,
    /// Estimated share of the year's intensity minutes attributed to this
    /// type (see aggregator for the estimation ladder)
    pub intensity_minutes: f64,
}

/// Fixed-length monthly series (index 0 = January). Months with no data
/// are explicit zeros so chart axes stay 12 wide; the fixed-size arrays
/// make the 12-length invariant structural, even through deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub activity_count: [u32; 12],
    pub distance_km: [f64; 12],
    pub steps: [f64; 12],
    pub sleep_hours: [f64; 12],
    pub intensity_minutes: [f64; 12],
}

impl Default for MonthlySeries {
    fn default() -> Self {
        Self {
            activity_count: [0; 12],
            distance_km: [0.0; 12],
            steps: [0.0; 12],
            sleep_hours: [0.0; 12],
            intensity_minutes: [0.0; 12],
        }
    }
}

/// Sparse date-keyed series for calendar heatmaps. Keys are ISO dates;
/// dates with no data are absent, never zero, so a rest day and a missing
/// record stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub duration_h_by_date: BTreeMap<String, f64>,
    pub calories_by_date: BTreeMap<String, f64>,
    pub steps_by_date: BTreeMap<String, f64>,
    pub intensity_minutes_by_date: BTreeMap<String, f64>,
    pub resting_heart_rate_by_date: BTreeMap<String, f64>,
    pub weight_kg_by_date: BTreeMap<String, f64>,
    pub body_age_by_date: BTreeMap<String, f64>,
}

/// Per-ISO-week intensity minutes against a fixed weekly goal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyIntensitySeries {
    /// Week labels "W01".."Wnn"
    pub labels: Vec<String>,
    pub actual_minutes: Vec<f64>,
    pub goal_minutes: f64,
}

/// One row of a ranked top-activity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopActivityRow {
    pub date: NaiveDate,
    pub name: String,
    pub type_key: String,
    pub distance_km: f64,
    pub duration_h: f64,
}

/// Ranked top-N tables, descending by distance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopTables {
    pub overall: Vec<TopActivityRow>,
    pub running: Vec<TopActivityRow>,
    pub swimming: Vec<TopActivityRow>,
}

/// The complete per-year computed summary, produced once by the aggregator
/// and immutable thereafter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearAggregate {
    pub year: i32,
    pub activity_overview: ActivityOverview,
    pub health_overview: HealthOverview,
    pub health_advanced: HealthAdvanced,
    pub running: SportMetrics,
    pub swimming: SportMetrics,
    pub type_analysis: Vec<TypeBreakdown>,
    pub monthly: MonthlySeries,
    pub daily: DailySeries,
    pub weekly_intensity: WeeklyIntensitySeries,
    pub tables: TopTables,
}

/// One comparable metric paired across two years.
///
/// `pct_change` is absent (serialized `null`) when the previous value is
/// zero; it is never an infinity or a misleading 0%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub section: String,
    pub key: String,
    pub label: String,
    pub unit: String,
    pub previous: f64,
    pub current: f64,
    pub delta: f64,
    pub pct_change: Option<f64>,
}

/// Month-aligned intensity-minutes comparison card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyIntensityCard {
    /// Calendar month 1-12
    pub month: u32,
    /// Zero-padded month label ("01".."12")
    pub label: String,
    pub current_minutes: f64,
    pub previous_minutes: f64,
    pub delta_minutes: f64,
    pub pct_change: Option<f64>,
}

/// Year-over-year comparison. Entirely absent (not zero-filled) when only
/// one year of data exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub previous_year: i32,
    pub rows: Vec<ComparisonRow>,
    pub monthly_intensity_cards: Vec<MonthlyIntensityCard>,
}

/// Sports section of the report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportsSection {
    pub running: SportMetrics,
    pub swimming: SportMetrics,
    pub type_analysis: Vec<TypeBreakdown>,
}

/// The final serializable report document.
///
/// This is the sole contract between the core and the renderer: every field
/// has a defined default, so rendering only ever needs "is this collection
/// empty" checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub schema_version: String,
    pub generator: String,
    pub run_id: Uuid,
    pub year: i32,
    pub previous_year: Option<i32>,
    pub generated_at: String,
    pub activity_overview: ActivityOverview,
    pub health_overview: HealthOverview,
    pub health_advanced: HealthAdvanced,
    pub sports: SportsSection,
    pub monthly_trends: MonthlySeries,
    /// Previous year's monthly series; zero-filled when no previous year
    /// is available
    pub previous_monthly_trends: MonthlySeries,
    pub daily_trends: DailySeries,
    pub weekly_intensity_minutes: WeeklyIntensitySeries,
    pub tables: TopTables,
    /// Empty when no comparison data exists
    pub comparison_rows: Vec<ComparisonRow>,
    /// Empty when no comparison data exists
    pub monthly_intensity_compare_cards: Vec<MonthlyIntensityCard>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn monthly_series_rejects_short_arrays() {
        let mut payload = serde_json::to_value(MonthlySeries::default()).unwrap();
        payload["intensity_minutes"] = json!([0.0, 0.0, 0.0]);
        assert!(serde_json::from_value::<MonthlySeries>(payload).is_err());
    }

    #[test]
    fn monthly_series_round_trips_twelve_wide() {
        let mut series = MonthlySeries::default();
        series.distance_km[2] = 42.5;
        let value = serde_json::to_value(&series).unwrap();
        let back: MonthlySeries = serde_json::from_value(value).unwrap();
        assert_eq!(back, series);
    }
}
