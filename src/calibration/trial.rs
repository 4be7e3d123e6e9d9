//! Per-configuration trial records and the winner heuristics.

use std::fmt;

use crate::config::EncodingConfig;

/// What happened when the trial's frame was pushed to the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrialOutcome {
    Delivered,
    Failed { reason: String },
}

/// Operator judgement. Recorded once, after the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Verdict {
    Accepted,
    Rejected,
    #[default]
    Unrated,
}

/// One tested configuration of a sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalibrationTrial {
    /// 1-based position in the enumeration.
    pub index: usize,
    pub config: EncodingConfig,
    pub outcome: TrialOutcome,
    pub verdict: Verdict,
}

impl CalibrationTrial {
    pub fn delivered(index: usize, config: EncodingConfig) -> Self {
        Self {
            index,
            config,
            outcome: TrialOutcome::Delivered,
            verdict: Verdict::Unrated,
        }
    }

    pub fn failed(index: usize, config: EncodingConfig, reason: impl ToString) -> Self {
        Self {
            index,
            config,
            outcome: TrialOutcome::Failed {
                reason: reason.to_string(),
            },
            verdict: Verdict::Unrated,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.outcome == TrialOutcome::Delivered
    }
}

impl fmt::Display for CalibrationTrial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.index, self.config)?;
        if let TrialOutcome::Failed { reason } = &self.outcome {
            write!(f, " [failed: {}]", reason)?;
        }
        Ok(())
    }
}

/// Unattended winner: the delivered trial with the smallest positive padding.
/// If every delivered trial is unpadded, the earliest of those. Ties go to the
/// lowest index.
pub fn select_by_padding(trials: &[CalibrationTrial]) -> Option<&CalibrationTrial> {
    let delivered = || trials.iter().filter(|t| t.is_delivered());
    delivered()
        .filter(|t| t.config.padding() > 0)
        .min_by_key(|t| (t.config.padding(), t.index))
        .or_else(|| delivered().min_by_key(|t| t.index))
}

/// Interactive winner: the delivered trial with this index.
pub fn select_by_index(trials: &[CalibrationTrial], index: usize) -> Option<&CalibrationTrial> {
    trials.iter().find(|t| t.index == index && t.is_delivered())
}
