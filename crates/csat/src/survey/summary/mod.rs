mod aggregate;
mod analytics;

pub use aggregate::{AggregateSummary, DemographicCounts, SummaryOptions, Tally};
pub use analytics::{
    dimension_statistics, question_performance, DatabaseStats, DimensionStatistics,
    PerformanceLevel, PerformanceSort, QuestionPerformance,
};
