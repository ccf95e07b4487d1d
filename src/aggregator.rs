//! Year aggregation
//!
//! Computes the per-year summary from normalized records: overall KPI
//! totals, fixed-length monthly series, per-type breakdowns, running and
//! swimming derived metrics, sparse daily series for calendar heatmaps,
//! weekly intensity minutes against the goal, and ranked top-N tables.
//!
//! A year with zero records produces a fully-populated aggregate with
//! all-zero and empty fields; aggregation never fails.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

use crate::config::ReportConfig;
use crate::types::{
    ActivityOverview, ActivityRecord, DailyHealthRecord, DailySeries, HealthAdvanced,
    HealthOverview, HrvStats, MonthlySeries, PaceUnit, RespirationStats, SportMetrics,
    StressStats, TopActivityRow, TopTables, TypeBreakdown, WeeklyIntensitySeries,
    YearAggregate,
};

/// Type keys counted as running
pub const RUNNING_TYPES: &[&str] = &["running", "treadmill_running"];
/// Type keys counted as swimming
pub const SWIMMING_TYPES: &[&str] = &["lap_swimming", "open_water_swimming"];

/// Aggregator producing one [`YearAggregate`] per calendar year
pub struct Aggregator;

impl Aggregator {
    /// Aggregate normalized records into the per-year summary.
    ///
    /// Records outside `year` are ignored, so callers may pass multi-year
    /// inputs unfiltered.
    pub fn aggregate_year(
        activities: &[ActivityRecord],
        daily_health: &[DailyHealthRecord],
        year: i32,
        config: &ReportConfig,
    ) -> YearAggregate {
        let acts: Vec<&ActivityRecord> =
            activities.iter().filter(|a| a.date.year() == year).collect();
        let days: Vec<&DailyHealthRecord> = daily_health
            .iter()
            .filter(|d| d.date.year() == year)
            .collect();

        let activity_overview = build_activity_overview(&acts);
        let health_overview = build_health_overview(&days);
        let health_advanced = build_health_advanced(&days);
        let monthly = build_monthly_series(&acts, &days);
        let daily = build_daily_series(&acts, &days);
        let weekly_intensity = build_weekly_intensity(
            year,
            &days,
            config.weekly_intensity_goal_minutes,
        );

        let running_acts = filter_types(&acts, RUNNING_TYPES);
        let swimming_acts = filter_types(&acts, SWIMMING_TYPES);
        let running = build_sport_metrics(&running_acts, PaceUnit::MinPerKm);
        let swimming = build_sport_metrics(&swimming_acts, PaceUnit::MinPer100m);

        let type_analysis =
            build_type_analysis(&acts, health_overview.total_intensity_minutes);

        let tables = TopTables {
            overall: top_rows_by_distance(&acts, config.top_n),
            running: top_rows_by_distance(&running_acts, config.top_n),
            swimming: top_rows_by_distance(&swimming_acts, config.top_n),
        };

        YearAggregate {
            year,
            activity_overview,
            health_overview,
            health_advanced,
            running,
            swimming,
            type_analysis,
            monthly,
            daily,
            weekly_intensity,
            tables,
        }
    }
}

/// Average pace in `unit` minutes over a distance/duration total. Absent
/// when either total is non-positive.
pub fn average_pace(distance_m: f64, duration_s: f64, unit: PaceUnit) -> Option<f64> {
    if distance_m <= 0.0 || duration_s <= 0.0 {
        return None;
    }
    let reference_m = match unit {
        PaceUnit::MinPerKm => 1000.0,
        PaceUnit::MinPer100m => 100.0,
    };
    Some((duration_s / 60.0) / (distance_m / reference_m))
}

/// Format a pace as `m:ss <unit>`, or "N/A" when undefined
pub fn format_pace(pace: Option<f64>, unit: PaceUnit) -> String {
    match pace {
        Some(p) if p > 0.0 => {
            let total_seconds = (p * 60.0).round() as u64;
            format!(
                "{}:{:02} {}",
                total_seconds / 60,
                total_seconds % 60,
                unit.as_str()
            )
        }
        _ => "N/A".to_string(),
    }
}

fn filter_types<'a>(
    acts: &[&'a ActivityRecord],
    type_keys: &[&str],
) -> Vec<&'a ActivityRecord> {
    acts.iter()
        .copied()
        .filter(|a| type_keys.contains(&a.type_key.as_str()))
        .collect()
}

fn build_activity_overview(acts: &[&ActivityRecord]) -> ActivityOverview {
    let mut active_days: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut overview = ActivityOverview {
        total_activities: acts.len(),
        ..ActivityOverview::default()
    };

    for act in acts {
        active_days.insert(act.date);
        overview.total_distance_km += act.distance_m.unwrap_or(0.0) / 1000.0;
        overview.total_duration_h += act.duration_s / 3600.0;
        overview.total_calories += act.calories.unwrap_or(0.0);
        overview.total_elevation_gain_m += act.elevation_gain_m.unwrap_or(0.0);
    }

    overview.active_days = active_days.len();
    overview
}

fn build_health_overview(days: &[&DailyHealthRecord]) -> HealthOverview {
    let recorded_days = days.len();

    // Daily averages divide by days that recorded the metric; a sleep-only
    // or weigh-in-only date must not dilute the step or intensity averages.
    let step_values: Vec<f64> = days.iter().filter_map(|d| d.steps).collect();
    let intensity_values: Vec<f64> = days.iter().filter_map(|d| d.intensity_minutes).collect();
    let total_steps: f64 = step_values.iter().sum();
    let total_intensity: f64 = intensity_values.iter().sum();

    let sleep_days: Vec<&&DailyHealthRecord> =
        days.iter().filter(|d| d.sleep_hours.is_some()).collect();
    let sleep_recorded_days = sleep_days.len();

    HealthOverview {
        recorded_days,
        sleep_recorded_days,
        total_steps,
        avg_daily_steps: mean_or_zero(total_steps, step_values.len()),
        avg_resting_heart_rate: mean(days.iter().filter_map(|d| d.resting_heart_rate)),
        total_intensity_minutes: total_intensity,
        avg_daily_intensity_minutes: mean_or_zero(total_intensity, intensity_values.len()),
        avg_sleep_hours: mean(sleep_days.iter().filter_map(|d| d.sleep_hours)),
        avg_sleep_score: mean(sleep_days.iter().filter_map(|d| d.sleep_score)),
        avg_deep_sleep_hours: mean(sleep_days.iter().filter_map(|d| d.deep_sleep_hours)),
        avg_light_sleep_hours: mean(sleep_days.iter().filter_map(|d| d.light_sleep_hours)),
        avg_rem_sleep_hours: mean(sleep_days.iter().filter_map(|d| d.rem_sleep_hours)),
    }
}

fn build_health_advanced(days: &[&DailyHealthRecord]) -> HealthAdvanced {
    let hrv_values: Vec<f64> = days.iter().filter_map(|d| d.hrv).collect();
    let stress_values: Vec<f64> = days.iter().filter_map(|d| d.stress_avg).collect();
    let respiration_values: Vec<f64> =
        days.iter().filter_map(|d| d.sleep_respiration).collect();

    HealthAdvanced {
        hrv: HrvStats {
            recorded_days: hrv_values.len(),
            avg: mean(hrv_values.iter().copied()),
            min: hrv_values.iter().copied().reduce(f64::min),
            max: hrv_values.iter().copied().reduce(f64::max),
        },
        stress: StressStats {
            recorded_days: stress_values.len(),
            avg_daily_stress: mean(stress_values.iter().copied()),
            max_stress_peak: days
                .iter()
                .filter_map(|d| d.stress_max)
                .reduce(f64::max),
        },
        respiration: RespirationStats {
            recorded_days: respiration_values.len(),
            avg_sleep_respiration: mean(respiration_values.iter().copied()),
        },
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        return None;
    }
    Some(collected.iter().sum::<f64>() / collected.len() as f64)
}

fn mean_or_zero(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn build_monthly_series(
    acts: &[&ActivityRecord],
    days: &[&DailyHealthRecord],
) -> MonthlySeries {
    let mut series = MonthlySeries::default();

    for act in acts {
        let m = act.date.month0() as usize;
        series.activity_count[m] += 1;
        series.distance_km[m] += act.distance_m.unwrap_or(0.0) / 1000.0;
    }
    for day in days {
        let m = day.date.month0() as usize;
        series.steps[m] += day.steps.unwrap_or(0.0);
        series.sleep_hours[m] += day.sleep_hours.unwrap_or(0.0);
        series.intensity_minutes[m] += day.intensity_minutes.unwrap_or(0.0);
    }

    series
}

fn build_sport_metrics(acts: &[&ActivityRecord], pace_unit: PaceUnit) -> SportMetrics {
    let mut metrics = SportMetrics::empty(pace_unit);
    metrics.count = acts.len();

    let mut distance_m = 0.0;
    let mut duration_s = 0.0;
    for act in acts {
        distance_m += act.distance_m.unwrap_or(0.0);
        duration_s += act.duration_s;
        metrics.total_calories += act.calories.unwrap_or(0.0);
    }
    metrics.total_distance_km = distance_m / 1000.0;
    metrics.total_duration_h = duration_s / 3600.0;
    metrics.avg_pace = average_pace(distance_m, duration_s, pace_unit);
    metrics.pace_display = format_pace(metrics.avg_pace, pace_unit);
    metrics
}

/// Group activities by type key. Ordering is descending by count, ties
/// broken by first-seen type, so output is stable across runs.
fn build_type_analysis(
    acts: &[&ActivityRecord],
    total_intensity_minutes: f64,
) -> Vec<TypeBreakdown> {
    let mut breakdowns: Vec<TypeBreakdown> = Vec::new();

    for act in acts {
        let index = match breakdowns.iter().position(|b| b.type_key == act.type_key) {
            Some(index) => index,
            None => {
                breakdowns.push(TypeBreakdown {
                    type_key: act.type_key.clone(),
                    count: 0,
                    total_duration_h: 0.0,
                    total_distance_km: 0.0,
                    total_calories: 0.0,
                    intensity_minutes: 0.0,
                });
                breakdowns.len() - 1
            }
        };
        let entry = &mut breakdowns[index];
        entry.count += 1;
        entry.total_duration_h += act.duration_s / 3600.0;
        entry.total_distance_km += act.distance_m.unwrap_or(0.0) / 1000.0;
        entry.total_calories += act.calories.unwrap_or(0.0);
    }

    // stable sort keeps first-seen order among equal counts
    breakdowns.sort_by(|a, b| b.count.cmp(&a.count));

    // Activities carry no intensity minutes of their own; attribute the
    // year's total by calorie share, falling back to duration share, then
    // to a rough one-minute-per-duration-minute estimate.
    let calories_total: f64 = breakdowns.iter().map(|b| b.total_calories.max(0.0)).sum();
    let duration_total: f64 = breakdowns
        .iter()
        .map(|b| b.total_duration_h.max(0.0))
        .sum();
    for b in &mut breakdowns {
        b.intensity_minutes = if total_intensity_minutes > 0.0 && calories_total > 0.0 {
            total_intensity_minutes * b.total_calories.max(0.0) / calories_total
        } else if total_intensity_minutes > 0.0 && duration_total > 0.0 {
            total_intensity_minutes * b.total_duration_h.max(0.0) / duration_total
        } else {
            b.total_duration_h.max(0.0) * 60.0
        };
    }

    breakdowns
}

/// Rank activities descending by distance, ties broken by more recent
/// date, capped at `top_n`
fn top_rows_by_distance(acts: &[&ActivityRecord], top_n: usize) -> Vec<TopActivityRow> {
    let mut ranked: Vec<&ActivityRecord> = acts.to_vec();
    ranked.sort_by(|a, b| {
        let da = a.distance_m.unwrap_or(0.0);
        let db = b.distance_m.unwrap_or(0.0);
        db.partial_cmp(&da)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.date.cmp(&a.date))
    });
    ranked
        .into_iter()
        .take(top_n)
        .map(|act| TopActivityRow {
            date: act.date,
            name: act.name.clone().unwrap_or_default(),
            type_key: act.type_key.clone(),
            distance_km: act.distance_m.unwrap_or(0.0) / 1000.0,
            duration_h: act.duration_s / 3600.0,
        })
        .collect()
}

fn build_daily_series(
    acts: &[&ActivityRecord],
    days: &[&DailyHealthRecord],
) -> DailySeries {
    let mut series = DailySeries::default();

    for act in acts {
        let key = act.date.to_string();
        *series.duration_h_by_date.entry(key.clone()).or_insert(0.0) +=
            act.duration_s / 3600.0;
        if let Some(calories) = act.calories {
            *series.calories_by_date.entry(key).or_insert(0.0) += calories;
        }
    }

    for day in days {
        let key = day.date.to_string();
        if let Some(steps) = day.steps {
            series.steps_by_date.insert(key.clone(), steps);
        }
        if let Some(minutes) = day.intensity_minutes {
            series
                .intensity_minutes_by_date
                .insert(key.clone(), minutes);
        }
        if let Some(rhr) = day.resting_heart_rate {
            series.resting_heart_rate_by_date.insert(key.clone(), rhr);
        }
        if let Some(weight) = day.weight_kg {
            series.weight_kg_by_date.insert(key.clone(), weight);
        }
        if let Some(age) = day.body_age {
            series.body_age_by_date.insert(key, age);
        }
    }

    series
}

/// Bucket intensity minutes by week. Weeks start on the Monday on or
/// before Jan 1 and run through Dec 31, so every date of the year lands
/// in exactly one bucket.
fn build_weekly_intensity(
    year: i32,
    days: &[&DailyHealthRecord],
    goal_minutes: f64,
) -> WeeklyIntensitySeries {
    let (first_day, last_day) = match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(first), Some(last)) => (first, last),
        // only reachable for years outside chrono's range
        _ => return WeeklyIntensitySeries::default(),
    };
    let first_week_start =
        first_day - Duration::days(first_day.weekday().num_days_from_monday() as i64);
    let total_weeks = ((last_day - first_week_start).num_days() / 7 + 1) as usize;

    let mut actual = vec![0.0; total_weeks];
    for day in days {
        let minutes = match day.intensity_minutes {
            Some(m) if m > 0.0 => m,
            _ => continue,
        };
        let index = ((day.date - first_week_start).num_days() / 7) as usize;
        if index < total_weeks {
            actual[index] += minutes;
        }
    }

    WeeklyIntensitySeries {
        labels: (1..=total_weeks).map(|i| format!("W{i:02}")).collect(),
        actual_minutes: actual,
        goal_minutes: goal_minutes.max(0.0),
    }
}
