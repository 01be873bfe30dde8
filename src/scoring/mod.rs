//! Entry scoring and position-sizing feasibility (spec §4.4, §4.5).

pub mod execution_feasibility;
pub mod indicators;
pub mod scorer;

pub use execution_feasibility::{AdvHealth, ExecutionFeasibility, OverallRisk, SpreadRating, evaluate};
pub use scorer::{DynamicInputs, ScoreComponentDetail, ScoreDetail, Scorer};
