//! # Calibration
//!
//! Empirical discovery of the projector's framebuffer layout: enumerate
//! candidate layouts, show each one, and keep the one that looked right.

pub mod candidates;
pub mod controller;
pub mod operator;
pub mod trial;

pub use candidates::{
    CandidateSet, Resolution, StrideCandidate, default_fine_tune_bases, fine_tune_candidates,
};
pub use controller::{
    DEFAULT_DWELL, MAX_CHOICE_ATTEMPTS, SelectionMode, SweepController, SweepControllerBuilder,
    SweepReport,
};
pub use operator::{Operator, StdinOperator};
pub use trial::{CalibrationTrial, TrialOutcome, Verdict, select_by_padding};
