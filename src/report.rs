//! Report document assembly
//!
//! The final pipeline stage: copies aggregate and comparison outputs into
//! the serializable report document and substitutes defined defaults for
//! every absent optional section. No metric is computed here; that belongs
//! to the aggregator and comparator.

use uuid::Uuid;

use crate::error::ReportError;
use crate::types::{
    ComparisonResult, MonthlySeries, ReportDocument, SportsSection, YearAggregate,
};
use crate::{GENERATOR_NAME, REPORT_SCHEMA_VERSION};

/// Embedding shell for the rendered page; all visual logic lives in the
/// external renderer
const PAGE_TEMPLATE: &str = include_str!("../assets/report.html");

const DATA_PLACEHOLDER: &str = "__REPORT_DATA_JSON__";

/// Builder assembling the final [`ReportDocument`]
pub struct ReportBuilder;

impl ReportBuilder {
    /// Assemble the report document.
    ///
    /// Absent previous-year data becomes a zero-filled
    /// `previous_monthly_trends` and empty comparison collections, never
    /// missing keys, so the renderer only tests for emptiness.
    pub fn build(
        current: &YearAggregate,
        previous: Option<&YearAggregate>,
        comparison: Option<&ComparisonResult>,
        generated_at: &str,
    ) -> ReportDocument {
        ReportDocument {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generator: GENERATOR_NAME.to_string(),
            run_id: Uuid::new_v4(),
            year: current.year,
            previous_year: previous.map(|p| p.year),
            generated_at: generated_at.to_string(),
            activity_overview: current.activity_overview.clone(),
            health_overview: current.health_overview.clone(),
            health_advanced: current.health_advanced.clone(),
            sports: SportsSection {
                running: current.running.clone(),
                swimming: current.swimming.clone(),
                type_analysis: current.type_analysis.clone(),
            },
            monthly_trends: current.monthly.clone(),
            previous_monthly_trends: previous
                .map(|p| p.monthly.clone())
                .unwrap_or_else(MonthlySeries::default),
            daily_trends: current.daily.clone(),
            weekly_intensity_minutes: current.weekly_intensity.clone(),
            tables: current.tables.clone(),
            comparison_rows: comparison.map(|c| c.rows.clone()).unwrap_or_default(),
            monthly_intensity_compare_cards: comparison
                .map(|c| c.monthly_intensity_cards.clone())
                .unwrap_or_default(),
        }
    }

    /// Render the self-contained page embedding the serialized document
    pub fn render_page(document: &ReportDocument) -> Result<String, ReportError> {
        if !PAGE_TEMPLATE.contains(DATA_PLACEHOLDER) {
            return Err(ReportError::Template(format!(
                "page template is missing the {DATA_PLACEHOLDER} placeholder"
            )));
        }
        let data_json = serde_json::to_string(document)?;
        Ok(PAGE_TEMPLATE
            .replace("__YEAR__", &document.year.to_string())
            .replace(
                "__PREV_YEAR__",
                &document
                    .previous_year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )
            .replace("__GENERATED_AT__", &document.generated_at)
            .replace(DATA_PLACEHOLDER, &data_json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::comparator::Comparator;
    use crate::config::ReportConfig;
    use crate::types::ActivityRecord;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample_aggregate(year: i32) -> YearAggregate {
        let act = ActivityRecord {
            id: Some(1),
            name: Some("Track session".to_string()),
            type_key: "running".to_string(),
            date: NaiveDate::from_ymd_opt(year, 3, 15).unwrap(),
            duration_s: 3000.0,
            distance_m: Some(10000.0),
            calories: Some(600.0),
            elevation_gain_m: None,
            avg_hr: None,
            max_hr: None,
        };
        Aggregator::aggregate_year(&[act], &[], year, &ReportConfig::default())
    }

    #[test]
    fn absent_comparison_yields_empty_collections_not_missing_keys() {
        let current = sample_aggregate(2025);
        let doc = ReportBuilder::build(&current, None, None, "2025-12-31 09:00:00");

        assert_eq!(doc.previous_year, None);
        assert!(doc.comparison_rows.is_empty());
        assert!(doc.monthly_intensity_compare_cards.is_empty());
        assert_eq!(doc.previous_monthly_trends.distance_km, [0.0; 12]);
        assert_eq!(doc.health_advanced, current.health_advanced);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["previous_year"], serde_json::Value::Null);
        assert!(json["comparison_rows"].as_array().unwrap().is_empty());
        assert!(json["monthly_intensity_compare_cards"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn comparison_sections_carry_through() {
        let current = sample_aggregate(2025);
        let previous = sample_aggregate(2024);
        let comparison = Comparator::compare_years(&current, Some(&previous)).unwrap();

        let doc = ReportBuilder::build(
            &current,
            Some(&previous),
            Some(&comparison),
            "2026-01-01 08:00:00",
        );
        assert_eq!(doc.previous_year, Some(2024));
        assert_eq!(doc.comparison_rows, comparison.rows);
        assert_eq!(doc.monthly_intensity_compare_cards.len(), 12);
        assert_eq!(doc.previous_monthly_trends, previous.monthly);
    }

    #[test]
    fn rendered_page_embeds_the_document() {
        let current = sample_aggregate(2025);
        let doc = ReportBuilder::build(&current, None, None, "2025-12-31 09:00:00");

        let html = ReportBuilder::render_page(&doc).unwrap();
        assert!(html.contains("\"schema_version\""));
        assert!(html.contains("\"monthly_intensity_compare_cards\""));
        assert!(html.contains("2025"));
        assert!(!html.contains(DATA_PLACEHOLDER));
    }
}
