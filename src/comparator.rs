//! Year-over-year comparison
//!
//! Pairs a current-year aggregate with a previous-year one and emits flat
//! comparable rows plus month-aligned intensity-minutes cards. When the
//! previous year is absent the comparison itself is absent; callers render
//! a "no year-over-year data" state instead of invented zeros.

use crate::types::{
    ComparisonResult, ComparisonRow, MonthlyIntensityCard, SportMetrics, YearAggregate,
};

/// Comparator producing one [`ComparisonResult`] from two yearly aggregates
pub struct Comparator;

impl Comparator {
    /// Compare two years. Returns `None` when no previous year exists.
    pub fn compare_years(
        current: &YearAggregate,
        previous: Option<&YearAggregate>,
    ) -> Option<ComparisonResult> {
        let previous = previous?;

        let mut rows = Vec::new();
        activity_rows(&mut rows, current, previous);
        health_rows(&mut rows, current, previous);
        recovery_rows(&mut rows, current, previous);
        sport_rows(&mut rows, "Running", &current.running, &previous.running);
        sport_rows(&mut rows, "Swimming", &current.swimming, &previous.swimming);

        Some(ComparisonResult {
            previous_year: previous.year,
            rows,
            monthly_intensity_cards: intensity_cards(current, previous),
        })
    }
}

/// Percent change from `previous` to `current`; undefined when the
/// previous value is zero
pub fn pct_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

fn push_row(
    rows: &mut Vec<ComparisonRow>,
    section: &str,
    key: &str,
    label: &str,
    unit: &str,
    current: f64,
    previous: f64,
) {
    rows.push(ComparisonRow {
        section: section.to_string(),
        key: key.to_string(),
        label: label.to_string(),
        unit: unit.to_string(),
        previous,
        current,
        delta: current - previous,
        pct_change: pct_change(current, previous),
    });
}

fn activity_rows(rows: &mut Vec<ComparisonRow>, cur: &YearAggregate, prev: &YearAggregate) {
    let c = &cur.activity_overview;
    let p = &prev.activity_overview;
    let section = "Activity";
    push_row(
        rows,
        section,
        "total_activities",
        "Total activities",
        "",
        c.total_activities as f64,
        p.total_activities as f64,
    );
    push_row(
        rows,
        section,
        "active_days",
        "Active days",
        "days",
        c.active_days as f64,
        p.active_days as f64,
    );
    push_row(
        rows,
        section,
        "total_distance_km",
        "Total distance",
        "km",
        c.total_distance_km,
        p.total_distance_km,
    );
    push_row(
        rows,
        section,
        "total_duration_h",
        "Total duration",
        "h",
        c.total_duration_h,
        p.total_duration_h,
    );
    push_row(
        rows,
        section,
        "total_calories",
        "Total calories",
        "kcal",
        c.total_calories,
        p.total_calories,
    );
    push_row(
        rows,
        section,
        "total_elevation_gain_m",
        "Total elevation gain",
        "m",
        c.total_elevation_gain_m,
        p.total_elevation_gain_m,
    );
}

fn health_rows(rows: &mut Vec<ComparisonRow>, cur: &YearAggregate, prev: &YearAggregate) {
    let c = &cur.health_overview;
    let p = &prev.health_overview;
    let section = "Health";
    push_row(
        rows,
        section,
        "total_steps",
        "Total steps",
        "steps",
        c.total_steps,
        p.total_steps,
    );
    push_row(
        rows,
        section,
        "avg_daily_steps",
        "Average daily steps",
        "steps",
        c.avg_daily_steps,
        p.avg_daily_steps,
    );
    push_row(
        rows,
        section,
        "avg_daily_intensity_minutes",
        "Average daily intensity minutes",
        "min",
        c.avg_daily_intensity_minutes,
        p.avg_daily_intensity_minutes,
    );
    // averages compare only when both years recorded the metric
    if let (Some(c_sleep), Some(p_sleep)) = (c.avg_sleep_hours, p.avg_sleep_hours) {
        push_row(
            rows,
            section,
            "avg_sleep_hours",
            "Average sleep",
            "h",
            c_sleep,
            p_sleep,
        );
    }
    if let (Some(c_score), Some(p_score)) = (c.avg_sleep_score, p.avg_sleep_score) {
        push_row(
            rows,
            section,
            "avg_sleep_score",
            "Average sleep score",
            "",
            c_score,
            p_score,
        );
    }
    if let (Some(c_rhr), Some(p_rhr)) = (c.avg_resting_heart_rate, p.avg_resting_heart_rate) {
        push_row(
            rows,
            section,
            "avg_resting_heart_rate",
            "Average resting heart rate",
            "bpm",
            c_rhr,
            p_rhr,
        );
    }
}

// Advanced metrics compare only when both years recorded them; many
// exports carry no HRV, stress or respiration data at all.
fn recovery_rows(rows: &mut Vec<ComparisonRow>, cur: &YearAggregate, prev: &YearAggregate) {
    let c = &cur.health_advanced;
    let p = &prev.health_advanced;
    let section = "Recovery";
    if let (Some(c_hrv), Some(p_hrv)) = (c.hrv.avg, p.hrv.avg) {
        push_row(
            rows,
            section,
            "avg_hrv",
            "Average overnight HRV",
            "ms",
            c_hrv,
            p_hrv,
        );
    }
    if let (Some(c_stress), Some(p_stress)) =
        (c.stress.avg_daily_stress, p.stress.avg_daily_stress)
    {
        push_row(
            rows,
            section,
            "avg_daily_stress",
            "Average daily stress",
            "",
            c_stress,
            p_stress,
        );
    }
    if let (Some(c_resp), Some(p_resp)) = (
        c.respiration.avg_sleep_respiration,
        p.respiration.avg_sleep_respiration,
    ) {
        push_row(
            rows,
            section,
            "avg_sleep_respiration",
            "Average sleep respiration",
            "brpm",
            c_resp,
            p_resp,
        );
    }
}

fn sport_rows(
    rows: &mut Vec<ComparisonRow>,
    section: &str,
    cur: &SportMetrics,
    prev: &SportMetrics,
) {
    push_row(
        rows,
        section,
        "count",
        "Sessions",
        "",
        cur.count as f64,
        prev.count as f64,
    );
    push_row(
        rows,
        section,
        "total_distance_km",
        "Distance",
        "km",
        cur.total_distance_km,
        prev.total_distance_km,
    );
    if let (Some(c_pace), Some(p_pace)) = (cur.avg_pace, prev.avg_pace) {
        push_row(
            rows,
            section,
            "avg_pace",
            "Average pace",
            cur.pace_unit.as_str(),
            c_pace,
            p_pace,
        );
    }
}

/// Pair the 12 monthly intensity-minute totals across the two years
fn intensity_cards(cur: &YearAggregate, prev: &YearAggregate) -> Vec<MonthlyIntensityCard> {
    (0..12)
        .map(|i| {
            let current_minutes = cur.monthly.intensity_minutes[i];
            let previous_minutes = prev.monthly.intensity_minutes[i];
            MonthlyIntensityCard {
                month: (i + 1) as u32,
                label: format!("{:02}", i + 1),
                current_minutes,
                previous_minutes,
                delta_minutes: current_minutes - previous_minutes,
                pct_change: pct_change(current_minutes, previous_minutes),
            }
        })
        .collect()
}
