pub mod classifier;
pub mod human;
pub mod pert;
pub mod session;
pub mod tables;
pub mod threshold;
pub mod tier;

pub use classifier::{Classification, Classifier, KeywordClassifier};
pub use pert::{compute_pert, modifier_factor, Estimator, PertResult, MODIFIER_FLOOR};
pub use session::{SessionEstimate, SessionKind, SessionRequest, DEFAULT_COORDINATION_OVERHEAD};
pub use tables::{CategoryBaselines, DurationTables, TierTable};
pub use threshold::{ThresholdBasis, ThresholdCheck, ThresholdChecker, ThresholdTable};
pub use tier::{apply_tier_correction, classify_tier, TierDecision};
