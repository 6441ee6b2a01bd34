//! Shared data models spanning the store and analysis layers.

pub mod analysis;
pub mod demand;
pub mod product;
pub mod timestamp;

pub use analysis::{
    LifecycleAssessment, LifecycleMetrics, LifecycleReport, LifecycleStage, SeasonalityInterpretation,
    SeasonalityMetrics, SeasonalityPatterns, SeasonalityReport, SeasonalityType,
};
pub use demand::{DemandResult, DemandSummary, MonthSummaryRecord};
pub use product::{ProductRecord, Transaction};
pub use timestamp::{parse_timestamp, DateInput, NormalizedTimestamp, TimestampParseError, ZoneKind};
