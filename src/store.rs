//! Raw record store
//!
//! Read-only access to the on-disk cache of per-year raw records. The
//! upstream fetcher (out of scope) writes one activities collection and
//! one daily-health collection per year under
//! `<root>/<namespace>_<year>/data/`; this module only ever reads them.
//!
//! Payloads come in three shapes: a plain JSON array of record mappings, a
//! single mapping, or the fetcher's envelope
//! `{"status": ..., "data": [{"response": ...}]}`. Envelope flattening
//! recovers the record mappings and counts dropped non-mapping items.

use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::error::ReportError;

/// Default directory namespace: `<namespace>_<year>`
pub const DEFAULT_NAMESPACE: &str = "fit_report";

const ACTIVITIES_FILE: &str = "activities.json";
const DAILY_HEALTH_FILE: &str = "daily_health.json";

/// One year's raw record collections, as loaded from disk
#[derive(Debug, Clone, Default)]
pub struct RawYearData {
    pub activities: Vec<Value>,
    pub daily_health: Vec<Value>,
    /// Non-mapping items discarded during envelope flattening
    pub dropped_records: usize,
}

/// Read-only query capability over per-year raw data.
///
/// This is the collaborator seam: the core only ever calls this shape and
/// never manages authentication, retries or rate limits.
pub trait YearSource {
    fn fetch_year(&self, year: i32) -> Result<RawYearData, ReportError>;
}

/// File-system backed raw record store
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    namespace: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
        }
    }

    /// Directory holding one year's data files
    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(format!("{}_{year}", self.namespace))
    }

    /// Like [`YearSource::fetch_year`], but maps missing input to `None`.
    /// Used for the optional comparison year, where absence is a valid
    /// state rather than a failure.
    pub fn try_fetch_year(&self, year: i32) -> Result<Option<RawYearData>, ReportError> {
        match self.fetch_year(year) {
            Ok(data) => Ok(Some(data)),
            Err(ReportError::MissingInput { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn load_collection(&self, year: i32, file_name: &str) -> Result<(Vec<Value>, usize), ReportError> {
        let path = self.year_dir(year).join("data").join(file_name);
        if !path.exists() {
            return Err(ReportError::MissingInput {
                year,
                source_name: path.display().to_string(),
            });
        }
        let text = fs::read_to_string(&path)?;
        let payload: Value = serde_json::from_str(&text)?;
        Ok(flatten_envelope(&payload))
    }
}

impl YearSource for FileStore {
    fn fetch_year(&self, year: i32) -> Result<RawYearData, ReportError> {
        let (activities, dropped_a) = self.load_collection(year, ACTIVITIES_FILE)?;
        let (daily_health, dropped_d) = self.load_collection(year, DAILY_HEALTH_FILE)?;
        Ok(RawYearData {
            activities,
            daily_health,
            dropped_records: dropped_a + dropped_d,
        })
    }
}

/// Flatten a raw payload into record mappings, counting dropped items
pub fn flatten_envelope(payload: &Value) -> (Vec<Value>, usize) {
    let mut rows = Vec::new();
    let mut dropped = 0;

    match payload {
        Value::Object(obj) if obj.get("data").is_some_and(Value::is_array) => {
            let items = obj.get("data").and_then(Value::as_array);
            for item in items.into_iter().flatten() {
                match item.as_object() {
                    Some(entry) => consume_response(entry.get("response"), &mut rows, &mut dropped),
                    None => dropped += 1,
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                if item.is_object() {
                    rows.push(item.clone());
                } else {
                    dropped += 1;
                }
            }
        }
        Value::Object(_) => rows.push(payload.clone()),
        _ => dropped += 1,
    }

    (rows, dropped)
}

fn consume_response(response: Option<&Value>, rows: &mut Vec<Value>, dropped: &mut usize) {
    match response {
        Some(obj @ Value::Object(_)) => rows.push(obj.clone()),
        Some(Value::Array(items)) => {
            for item in items {
                if item.is_object() {
                    rows.push(item.clone());
                } else {
                    *dropped += 1;
                }
            }
        }
        Some(Value::Null) | None => {}
        Some(_) => *dropped += 1,
    }
}

impl FileStore {
    /// Write the serialized document and rendered page into the year's
    /// report directory, creating it as needed. Returns the JSON path.
    pub fn write_report(
        &self,
        year: i32,
        document_json: &str,
        page_html: Option<&str>,
    ) -> Result<PathBuf, ReportError> {
        let dir = self.year_dir(year).join("report");
        fs::create_dir_all(&dir)?;
        let json_path = dir.join("report_data.json");
        fs::write(&json_path, document_json)?;
        if let Some(html) = page_html {
            fs::write(dir.join("report.html"), html)?;
        }
        Ok(json_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn flattens_plain_arrays() {
        let payload = json!([{"a": 1}, {"b": 2}, 3, "junk"]);
        let (rows, dropped) = flatten_envelope(&payload);
        assert_eq!(rows.len(), 2);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn flattens_fetcher_envelopes() {
        let payload = json!({
            "status": "success",
            "data": [
                {"response": [{"activityId": 1}, {"activityId": 2}]},
                {"response": {"activityId": 3}},
                {"response": null},
                {"response": [7]},
                "junk"
            ]
        });
        let (rows, dropped) = flatten_envelope(&payload);
        assert_eq!(rows.len(), 3);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn single_object_payload_is_one_row() {
        let payload = json!({"calendarDate": "2025-01-01"});
        let (rows, dropped) = flatten_envelope(&payload);
        assert_eq!(rows.len(), 1);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn missing_year_names_the_file() {
        let tmp = std::env::temp_dir().join("fityear-store-missing-test");
        let store = FileStore::new(&tmp, DEFAULT_NAMESPACE);
        let err = store.fetch_year(2030).unwrap_err();
        match err {
            ReportError::MissingInput { year, source_name } => {
                assert_eq!(year, 2030);
                assert!(source_name.contains("fit_report_2030"));
                assert!(source_name.contains("activities.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.try_fetch_year(2030).unwrap().is_none());
    }

    #[test]
    fn round_trips_a_year_directory() {
        let tmp = std::env::temp_dir().join(format!("fityear-store-rt-{}", std::process::id()));
        let data_dir = tmp.join("fit_report_2025").join("data");
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(
            data_dir.join("activities.json"),
            json!([{"activityId": 1, "startTimeLocal": "2025-01-01 08:00:00", "duration": 600}])
                .to_string(),
        )
        .unwrap();
        fs::write(
            data_dir.join("daily_health.json"),
            json!({"status": "success", "data": [{"response": [{"calendarDate": "2025-01-01", "totalSteps": 100}]}]})
                .to_string(),
        )
        .unwrap();

        let store = FileStore::new(&tmp, DEFAULT_NAMESPACE);
        let data = store.fetch_year(2025).unwrap();
        assert_eq!(data.activities.len(), 1);
        assert_eq!(data.daily_health.len(), 1);
        assert_eq!(data.dropped_records, 0);

        fs::remove_dir_all(&tmp).unwrap();
    }
}
