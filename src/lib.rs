//! fityear - Batch aggregation engine for yearly personal fitness reports
//!
//! fityear turns a one-to-two-year personal fitness/health export into a
//! single serializable report document through a deterministic pipeline:
//! raw record store → normalization → per-year aggregation → year-over-year
//! comparison → document assembly. The document is the sole contract with
//! the (external) rendering layer.
//!
//! ## Modules
//!
//! - **store**: read-only access to the per-year raw record cache
//! - **normalizer**: heterogeneous raw mappings → uniform records
//! - **aggregator**: per-year KPI, monthly, daily and top-N computation
//! - **comparator**: year-over-year deltas and percent changes
//! - **report**: document assembly and the embedding page

pub mod aggregator;
pub mod comparator;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod report;
pub mod store;
pub mod types;

pub use aggregator::Aggregator;
pub use comparator::Comparator;
pub use config::ReportConfig;
pub use error::ReportError;
pub use normalizer::Normalizer;
pub use report::ReportBuilder;
pub use store::{FileStore, RawYearData, YearSource};
pub use types::{ComparisonResult, ReportDocument, YearAggregate};

/// Schema version embedded in every report document
pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Generator name embedded in every report document
pub const GENERATOR_NAME: &str = "fityear";

/// Crate version
pub const FITYEAR_VERSION: &str = env!("CARGO_PKG_VERSION");
