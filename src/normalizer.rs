//! Record normalization
//!
//! Converts heterogeneous raw export records (mappings with inconsistent key
//! presence, mixed units, nesting) into the uniform internal record shapes.
//! Malformed numeric values coerce to absent rather than failing; records
//! with unparseable dates are dropped, never fatal for the batch.

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::ReportConfig;
use crate::types::{ActivityRecord, DailyHealthRecord};

/// Normalizer for converting raw record mappings to internal records
pub struct Normalizer;

impl Normalizer {
    /// Normalize raw activity records.
    ///
    /// Records are deduplicated by activity id (falling back to a
    /// name/start/duration key) and dropped entirely when no calendar date
    /// can be recovered.
    pub fn normalize_activities(raw_records: &[Value]) -> Vec<ActivityRecord> {
        let mut seen: Vec<DedupKey> = Vec::new();
        let mut records = Vec::new();

        for raw in raw_records {
            let obj = match raw.as_object() {
                Some(obj) => obj,
                None => continue,
            };

            let date = match activity_date(obj) {
                Some(date) => date,
                None => continue,
            };

            let id = obj.get("activityId").and_then(Value::as_i64);
            let name = obj
                .get("activityName")
                .and_then(Value::as_str)
                .map(str::to_string);
            let key = match id {
                Some(id) => DedupKey::Id(id),
                None => DedupKey::Fields(
                    name.clone().unwrap_or_default(),
                    obj.get("startTimeLocal")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    coerce_f64(obj.get("duration")).unwrap_or(0.0).to_bits(),
                ),
            };
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            records.push(ActivityRecord {
                id,
                name,
                type_key: activity_type_key(obj),
                date,
                duration_s: coerce_f64(obj.get("duration")).unwrap_or(0.0).max(0.0),
                distance_m: positive(coerce_f64(obj.get("distance"))),
                calories: positive(coerce_f64(obj.get("calories"))),
                elevation_gain_m: positive(coerce_f64(obj.get("elevationGain"))),
                avg_hr: positive(coerce_f64(obj.get("averageHR"))),
                max_hr: positive(coerce_f64(obj.get("maxHR"))),
            });
        }

        records
    }

    /// Normalize raw daily-health records.
    ///
    /// A raw row may be a flat daily summary, a nested sleep record
    /// (`dailySleepDTO`), a weigh-in envelope (`dateWeightList`), or an
    /// already-flat row using direct field names. Rows contributing to the
    /// same calendar date are merged field-wise, first value wins, so the
    /// output carries at most one record per date.
    pub fn normalize_daily_health(
        raw_records: &[Value],
        config: &ReportConfig,
    ) -> Vec<DailyHealthRecord> {
        let mut by_date: BTreeMap<NaiveDate, DailyHealthRecord> = BTreeMap::new();

        for raw in raw_records {
            let obj = match raw.as_object() {
                Some(obj) => obj,
                None => continue,
            };

            if let Some(dto) = obj.get("dailySleepDTO").and_then(Value::as_object) {
                merge_sleep(&mut by_date, dto);
                continue;
            }
            if let Some(summary) = obj.get("hrvSummary").and_then(Value::as_object) {
                merge_hrv(&mut by_date, obj, summary);
                continue;
            }
            if let Some(points) = obj.get("dateWeightList").and_then(Value::as_array) {
                for point in points {
                    if let Some(point) = point.as_object() {
                        merge_weigh_in(&mut by_date, point);
                    }
                }
                continue;
            }

            merge_daily_summary(&mut by_date, obj, config);
        }

        by_date.into_values().collect()
    }
}

#[derive(PartialEq)]
enum DedupKey {
    Id(i64),
    Fields(String, String, u64),
}

/// Coerce a JSON value to f64. Accepts numbers and numeric strings;
/// booleans and garbage become absent.
pub(crate) fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

// stress and respiration use negative sentinels for "no data"; zero is valid
fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v >= 0.0)
}

/// Parse the calendar date from the first 10 characters of an ISO-ish
/// date or datetime string
pub(crate) fn date_prefix(value: &str) -> Option<NaiveDate> {
    let prefix = value.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn field_date(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<NaiveDate> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find_map(date_prefix)
}

fn activity_date(obj: &serde_json::Map<String, Value>) -> Option<NaiveDate> {
    field_date(obj, &["startTimeLocal", "startTimeGMT"])
}

fn activity_type_key(obj: &serde_json::Map<String, Value>) -> String {
    match obj.get("activityType") {
        Some(Value::Object(t)) => t
            .get("typeKey")
            .or_else(|| t.get("parentTypeKey"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => "unknown".to_string(),
    }
}

fn entry<'a>(
    by_date: &'a mut BTreeMap<NaiveDate, DailyHealthRecord>,
    date: NaiveDate,
) -> &'a mut DailyHealthRecord {
    by_date
        .entry(date)
        .or_insert_with(|| DailyHealthRecord::empty(date))
}

fn fill(slot: &mut Option<f64>, value: Option<f64>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn merge_sleep(by_date: &mut BTreeMap<NaiveDate, DailyHealthRecord>, dto: &serde_json::Map<String, Value>) {
    let date = match field_date(dto, &["calendarDate", "date"]) {
        Some(date) => date,
        None => return,
    };
    let sleep_s = coerce_f64(dto.get("sleepTimeSeconds")).unwrap_or(0.0);
    if sleep_s <= 0.0 {
        // a sleep row without recorded sleep carries no signal
        return;
    }
    let record = entry(by_date, date);
    fill(&mut record.sleep_hours, Some(sleep_s / 3600.0));
    fill(
        &mut record.deep_sleep_hours,
        coerce_f64(dto.get("deepSleepSeconds")).map(|s| s / 3600.0),
    );
    fill(
        &mut record.light_sleep_hours,
        coerce_f64(dto.get("lightSleepSeconds")).map(|s| s / 3600.0),
    );
    fill(
        &mut record.rem_sleep_hours,
        coerce_f64(dto.get("remSleepSeconds")).map(|s| s / 3600.0),
    );
    fill(
        &mut record.sleep_respiration,
        non_negative(coerce_f64(dto.get("averageRespirationValue"))),
    );
    fill(&mut record.sleep_score, sleep_score(dto));
}

fn merge_hrv(
    by_date: &mut BTreeMap<NaiveDate, DailyHealthRecord>,
    row: &serde_json::Map<String, Value>,
    summary: &serde_json::Map<String, Value>,
) {
    let date = match field_date(row, &["calendarDate", "date"])
        .or_else(|| field_date(summary, &["calendarDate", "date"]))
    {
        Some(date) => date,
        None => return,
    };
    // last night's average, falling back to the rolling weekly average
    let value = positive(coerce_f64(summary.get("lastNightAvg")))
        .or_else(|| positive(coerce_f64(summary.get("weeklyAvg"))));
    if value.is_none() {
        return;
    }
    fill(&mut entry(by_date, date).hrv, value);
}

fn sleep_score(dto: &serde_json::Map<String, Value>) -> Option<f64> {
    let nested = dto
        .get("sleepScores")
        .and_then(Value::as_object)
        .and_then(|scores| scores.get("overall"))
        .and_then(Value::as_object)
        .and_then(|overall| coerce_f64(overall.get("value")));
    nested.or_else(|| coerce_f64(dto.get("overallSleepScore")))
}

fn merge_weigh_in(
    by_date: &mut BTreeMap<NaiveDate, DailyHealthRecord>,
    point: &serde_json::Map<String, Value>,
) {
    let date = match field_date(point, &["calendarDate", "date"]) {
        Some(date) => date,
        None => return,
    };
    // weigh-in weights arrive in grams
    let weight_kg = positive(coerce_f64(point.get("weight"))).map(|g| g / 1000.0);
    let body_age = positive(coerce_f64(point.get("metabolicAge")))
        .or_else(|| positive(coerce_f64(point.get("bodyAge"))));
    if weight_kg.is_none() && body_age.is_none() {
        return;
    }
    let record = entry(by_date, date);
    fill(&mut record.weight_kg, weight_kg);
    fill(&mut record.body_age, body_age);
}

fn merge_daily_summary(
    by_date: &mut BTreeMap<NaiveDate, DailyHealthRecord>,
    obj: &serde_json::Map<String, Value>,
    config: &ReportConfig,
) {
    let date = match field_date(obj, &["calendarDate", "date"]) {
        Some(date) => date,
        None => return,
    };

    let steps = coerce_f64(obj.get("totalSteps")).or_else(|| coerce_f64(obj.get("steps")));
    let intensity = intensity_minutes(obj, config);
    let resting_heart_rate = positive(coerce_f64(obj.get("restingHeartRate")))
        .or_else(|| positive(coerce_f64(obj.get("resting_heart_rate"))));
    let sleep_hours = positive(coerce_f64(obj.get("sleepHours")));
    let sleep_score = coerce_f64(obj.get("sleepScore"));
    let deep_sleep_hours = positive(coerce_f64(obj.get("deepSleepHours")));
    let stress_avg = non_negative(coerce_f64(obj.get("avgStressLevel")));
    let stress_max = non_negative(coerce_f64(obj.get("maxStressLevel")));
    let sleep_respiration = non_negative(coerce_f64(obj.get("avgSleepRespirationValue")));
    let weight_kg = positive(coerce_f64(obj.get("weightKg")))
        .or_else(|| positive(coerce_f64(obj.get("weight_kg"))));
    let body_age = positive(coerce_f64(obj.get("bodyAge")));

    // a row carrying only a date is not a recorded day
    if [
        steps,
        intensity,
        resting_heart_rate,
        sleep_hours,
        sleep_score,
        deep_sleep_hours,
        stress_avg,
        stress_max,
        sleep_respiration,
        weight_kg,
        body_age,
    ]
    .iter()
    .all(Option::is_none)
    {
        return;
    }

    let record = entry(by_date, date);
    fill(&mut record.steps, steps);
    fill(&mut record.intensity_minutes, intensity);
    fill(&mut record.resting_heart_rate, resting_heart_rate);
    fill(&mut record.sleep_hours, sleep_hours);
    fill(&mut record.sleep_score, sleep_score);
    fill(&mut record.deep_sleep_hours, deep_sleep_hours);
    fill(&mut record.stress_avg, stress_avg);
    fill(&mut record.stress_max, stress_max);
    fill(&mut record.sleep_respiration, sleep_respiration);
    fill(&mut record.weight_kg, weight_kg);
    fill(&mut record.body_age, body_age);
}

fn intensity_minutes(obj: &serde_json::Map<String, Value>, config: &ReportConfig) -> Option<f64> {
    let moderate = coerce_f64(obj.get("moderateIntensityMinutes"));
    let vigorous = coerce_f64(obj.get("vigorousIntensityMinutes"));
    if moderate.is_some() || vigorous.is_some() {
        return Some(
            moderate.unwrap_or(0.0) + config.vigorous_weight * vigorous.unwrap_or(0.0),
        );
    }
    coerce_f64(obj.get("intensityMinutes")).or_else(|| coerce_f64(obj.get("intensity_minutes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn activity_fields_extract_or_default() {
        let raw = vec![json!({
            "activityId": 42,
            "activityName": "Morning Run",
            "activityType": {"typeKey": "running"},
            "startTimeLocal": "2025-03-05 06:30:00",
            "duration": 3000.0,
            "distance": 10000.0,
            "calories": "650",
            "averageHR": 152,
        })];

        let records = Normalizer::normalize_activities(&raw);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.id, Some(42));
        assert_eq!(rec.type_key, "running");
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert_eq!(rec.duration_s, 3000.0);
        assert_eq!(rec.distance_m, Some(10000.0));
        assert_eq!(rec.calories, Some(650.0));
        assert_eq!(rec.avg_hr, Some(152.0));
        assert_eq!(rec.elevation_gain_m, None);
    }

    #[test]
    fn unparseable_dates_drop_the_record() {
        let raw = vec![
            json!({"activityId": 1, "startTimeLocal": "not-a-date", "duration": 100}),
            json!({"activityId": 2, "duration": 100}),
            json!({"activityId": 3, "startTimeLocal": "2025-01-02 10:00:00", "duration": 100}),
        ];
        let records = Normalizer::normalize_activities(&raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(3));
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let raw = vec![json!({
            "activityId": 1,
            "startTimeLocal": "2025-01-02 10:00:00",
            "duration": -30.0,
        })];
        let records = Normalizer::normalize_activities(&raw);
        assert_eq!(records[0].duration_s, 0.0);
    }

    #[test]
    fn malformed_numerics_coerce_to_absent() {
        let raw = vec![json!({
            "activityId": 1,
            "startTimeLocal": "2025-01-02 10:00:00",
            "duration": "900",
            "distance": true,
            "calories": "not a number",
        })];
        let records = Normalizer::normalize_activities(&raw);
        assert_eq!(records[0].duration_s, 900.0);
        assert_eq!(records[0].distance_m, None);
        assert_eq!(records[0].calories, None);
    }

    #[test]
    fn duplicate_activity_ids_dedupe() {
        let raw = vec![
            json!({"activityId": 7, "startTimeLocal": "2025-01-02 10:00:00", "duration": 100}),
            json!({"activityId": 7, "startTimeLocal": "2025-01-02 10:00:00", "duration": 100}),
        ];
        assert_eq!(Normalizer::normalize_activities(&raw).len(), 1);
    }

    #[test]
    fn string_activity_type_and_missing_type_key() {
        let raw = vec![
            json!({"activityId": 1, "startTimeLocal": "2025-01-02 10:00:00", "duration": 1.0, "activityType": "badminton"}),
            json!({"activityId": 2, "startTimeLocal": "2025-01-03 10:00:00", "duration": 1.0}),
        ];
        let records = Normalizer::normalize_activities(&raw);
        assert_eq!(records[0].type_key, "badminton");
        assert_eq!(records[1].type_key, "unknown");
    }

    #[test]
    fn daily_health_merges_summary_sleep_and_weigh_in() {
        let config = ReportConfig::default();
        let raw = vec![
            json!({
                "calendarDate": "2025-01-01",
                "totalSteps": 5000,
                "moderateIntensityMinutes": 20,
                "vigorousIntensityMinutes": 10,
                "restingHeartRate": 52,
            }),
            json!({
                "dailySleepDTO": {
                    "calendarDate": "2025-01-01",
                    "sleepTimeSeconds": 27000,
                    "deepSleepSeconds": 5400,
                    "lightSleepSeconds": 14400,
                    "remSleepSeconds": 7200,
                    "averageRespirationValue": 14.5,
                    "sleepScores": {"overall": {"value": 82}},
                }
            }),
            json!({
                "dateWeightList": [
                    {"calendarDate": "2025-01-01", "weight": 72500.0, "metabolicAge": 28}
                ]
            }),
        ];

        let records = Normalizer::normalize_daily_health(&raw, &config);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.steps, Some(5000.0));
        // 20 moderate + 2 * 10 vigorous
        assert_eq!(rec.intensity_minutes, Some(40.0));
        assert_eq!(rec.resting_heart_rate, Some(52.0));
        assert_eq!(rec.sleep_hours, Some(7.5));
        assert_eq!(rec.deep_sleep_hours, Some(1.5));
        assert_eq!(rec.light_sleep_hours, Some(4.0));
        assert_eq!(rec.rem_sleep_hours, Some(2.0));
        assert_eq!(rec.sleep_respiration, Some(14.5));
        assert_eq!(rec.sleep_score, Some(82.0));
        assert_eq!(rec.weight_kg, Some(72.5));
        assert_eq!(rec.body_age, Some(28.0));
    }

    #[test]
    fn hrv_and_stress_rows_merge_into_the_day() {
        let config = ReportConfig::default();
        let raw = vec![
            json!({
                "calendarDate": "2025-03-01",
                "avgStressLevel": 31,
                "maxStressLevel": 88,
            }),
            json!({
                "hrvSummary": {"calendarDate": "2025-03-01", "lastNightAvg": 52}
            }),
            // -1 sentinel means no stress data; 0 lastNightAvg falls back
            json!({
                "calendarDate": "2025-03-02",
                "avgStressLevel": -1,
                "maxStressLevel": -1,
            }),
            json!({
                "hrvSummary": {"calendarDate": "2025-03-02", "lastNightAvg": 0, "weeklyAvg": 48}
            }),
        ];

        let records = Normalizer::normalize_daily_health(&raw, &config);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stress_avg, Some(31.0));
        assert_eq!(records[0].stress_max, Some(88.0));
        assert_eq!(records[0].hrv, Some(52.0));
        assert_eq!(records[1].stress_avg, None);
        assert_eq!(records[1].hrv, Some(48.0));
    }

    #[test]
    fn rows_carrying_only_a_date_produce_no_record() {
        let config = ReportConfig::default();
        let raw = vec![
            json!({"calendarDate": "2025-04-01"}),
            json!({"calendarDate": "2025-04-02", "unrelatedField": "x"}),
            json!({"dateWeightList": [{"calendarDate": "2025-04-03"}]}),
        ];
        assert!(Normalizer::normalize_daily_health(&raw, &config).is_empty());
    }

    #[test]
    fn duplicate_dates_keep_first_value_per_field() {
        let config = ReportConfig::default();
        let raw = vec![
            json!({"calendarDate": "2025-02-01", "totalSteps": 4000}),
            json!({"calendarDate": "2025-02-01", "totalSteps": 9999, "restingHeartRate": 50}),
        ];
        let records = Normalizer::normalize_daily_health(&raw, &config);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].steps, Some(4000.0));
        assert_eq!(records[0].resting_heart_rate, Some(50.0));
    }

    #[test]
    fn zero_sleep_rows_do_not_count_as_recorded_sleep() {
        let config = ReportConfig::default();
        let raw = vec![json!({
            "dailySleepDTO": {"calendarDate": "2025-02-01", "sleepTimeSeconds": 0}
        })];
        let records = Normalizer::normalize_daily_health(&raw, &config);
        assert!(records.is_empty());
    }
}
