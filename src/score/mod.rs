pub mod calculator;
pub mod eligibility;

pub use calculator::{
    calculate_hfs, compute_sub_metrics, conversion_factor, CalculationError, HfsOutcome,
    ScoreAggregate, ScoreProvider, SentinelScoreProvider, SubMetrics,
};
pub use eligibility::{check_eligibility, EligibilityReport, EligibilityWarning};

/// Reserved score meaning "not computed / computation declined". Kept for
/// compatibility with existing rows; every other persisted score is
/// non-negative and finite.
pub const HFS_SENTINEL: f64 = -1.0;
