//! # Sweep Controller
//!
//! Drives one source frame through every candidate layout:
//!
//! ```text
//! for each config (1-based index):
//!     resize (cached per width, height, fit) -> encode -> deliver -> dwell
//! cleanup
//! pick winner (operator index or padding heuristic) -> save
//! ```
//!
//! A sink failure marks that trial failed and the sweep moves on. Compositor
//! and encoder errors end the run. The store is touched only after the last
//! trial, and never when the run is interrupted.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use frame_scale::plan::Filter;
use tracing::{info, warn};

use super::candidates::CandidateSet;
use super::operator::Operator;
use super::trial::{CalibrationTrial, Verdict, select_by_index, select_by_padding};
use crate::compositor::Compositor;
use crate::config::{ConfigStore, EncodingConfig, FitPolicy};
use crate::encoder::encode;
use crate::error::{ProjectorError, ProjectorResult, classify};
use crate::frame::Frame;
use crate::shutdown::Shutdown;
use crate::sink::DeviceSink;

/// Observation window after each delivered trial.
pub const DEFAULT_DWELL: Duration = Duration::from_secs(3);

/// Unusable answers tolerated before an interactive session gives up.
pub const MAX_CHOICE_ATTEMPTS: usize = 3;

/// How the winning trial is chosen once the sweep is over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// The operator types the index of the trial that looked right.
    #[default]
    Interactive,
    /// Smallest positive padding, no operator involved.
    Unattended,
}

/// Everything a sweep produced.
#[derive(Clone, Debug, Default)]
pub struct SweepReport {
    /// All trials in enumeration order, failed ones included.
    pub trials: Vec<CalibrationTrial>,
    /// Resize operations actually performed.
    pub resizes: usize,
    pub winner: Option<CalibrationTrial>,
    pub store_written: bool,
    pub cancelled: bool,
}

impl SweepReport {
    pub fn delivered(&self) -> usize {
        self.trials.iter().filter(|t| t.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.trials.len() - self.delivered()
    }
}

type ResizeKey = (u32, u32, FitPolicy);

pub struct SweepController {
    plan: Vec<EncodingConfig>,
    dwell: Duration,
    selection: SelectionMode,
    store: Option<ConfigStore>,
    compositor: Compositor,
}

impl SweepController {
    pub fn builder() -> SweepControllerBuilder {
        SweepControllerBuilder::new()
    }

    /// The configurations in trial order. Trial `i` tests `plan()[i - 1]`.
    pub fn plan(&self) -> &[EncodingConfig] {
        &self.plan
    }

    /// Run the sweep against `frame`. The sink is cleaned up on every exit path.
    pub async fn run<S, O>(
        &mut self,
        frame: &Frame,
        sink: &mut S,
        operator: &mut O,
        shutdown: &mut Shutdown,
    ) -> ProjectorResult<SweepReport>
    where
        S: DeviceSink + ?Sized,
        O: Operator + ?Sized,
    {
        info!(
            "Calibration sweep: {} configurations, dwell {:?}, {:?} selection, sink {}",
            self.plan.len(),
            self.dwell,
            self.selection,
            sink.describe()
        );

        let mut report = SweepReport::default();
        let swept = self.sweep(frame, sink, shutdown, &mut report).await;
        sink.cleanup();
        swept?;

        if report.cancelled {
            info!(
                "Sweep interrupted after {} trials; configuration not saved",
                report.trials.len()
            );
            return Ok(report);
        }
        info!(
            "Sweep finished: {} delivered, {} failed, {} resizes",
            report.delivered(),
            report.failed(),
            report.resizes
        );

        self.finalize(&mut report, operator, shutdown).await?;
        Ok(report)
    }

    async fn sweep<S>(
        &mut self,
        frame: &Frame,
        sink: &mut S,
        shutdown: &mut Shutdown,
        report: &mut SweepReport,
    ) -> ProjectorResult<()>
    where
        S: DeviceSink + ?Sized,
    {
        let mut cache: HashMap<ResizeKey, Frame> = HashMap::new();

        for (i, config) in self.plan.iter().enumerate() {
            if shutdown.is_triggered() {
                report.cancelled = true;
                return Ok(());
            }
            let index = i + 1;
            info!("[{}] Testing: {}", index, config);

            let resized = match cache.entry((config.width, config.height, config.fit)) {
                Entry::Occupied(hit) => hit.get().clone(),
                Entry::Vacant(slot) => {
                    let fresh =
                        self.compositor
                            .resize(frame, config.width, config.height, config.fit)?;
                    report.resizes += 1;
                    slot.insert(fresh).clone()
                }
            };
            let buffer = encode(&resized, config)?;

            match sink.deliver(&buffer) {
                Ok(()) => report.trials.push(CalibrationTrial::delivered(index, *config)),
                Err(e) if classify::is_skippable(&e) => {
                    warn!("[{}] Trial failed, continuing: {}", index, e);
                    report.trials.push(CalibrationTrial::failed(index, *config, &e));
                    continue;
                }
                Err(e) => return Err(e),
            }

            info!("[{}] Observe the projector", index);
            tokio::select! {
                _ = tokio::time::sleep(self.dwell) => {}
                _ = shutdown.wait() => {
                    report.cancelled = true;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    async fn finalize<O>(
        &mut self,
        report: &mut SweepReport,
        operator: &mut O,
        shutdown: &mut Shutdown,
    ) -> ProjectorResult<()>
    where
        O: Operator + ?Sized,
    {
        if report.delivered() == 0 {
            warn!("No trial reached the projector; nothing to choose from");
            return Ok(());
        }

        let winner_index = match self.selection {
            SelectionMode::Unattended => select_by_padding(&report.trials).map(|t| t.index),
            SelectionMode::Interactive => {
                let delivered: Vec<CalibrationTrial> = report
                    .trials
                    .iter()
                    .filter(|t| t.is_delivered())
                    .cloned()
                    .collect();
                operator.present(&delivered);
                match choose(&report.trials, operator, shutdown).await? {
                    Choice::Picked(index) => Some(index),
                    Choice::GaveUp => None,
                    Choice::Interrupted => {
                        report.cancelled = true;
                        info!("Selection interrupted; configuration not saved");
                        return Ok(());
                    }
                }
            }
        };

        let Some(winner_index) = winner_index else {
            warn!("No configuration chosen; nothing saved");
            return Ok(());
        };

        for trial in &mut report.trials {
            trial.verdict = if trial.index == winner_index {
                Verdict::Accepted
            } else if self.selection == SelectionMode::Interactive && trial.is_delivered() {
                Verdict::Rejected
            } else {
                Verdict::Unrated
            };
        }
        let winner = report
            .trials
            .iter()
            .find(|t| t.index == winner_index)
            .cloned();

        if let Some(winner) = &winner {
            info!("Selected [{}] {}", winner.index, winner.config);
            if let Some(store) = &self.store {
                store.save(&winner.config)?;
                report.store_written = true;
            }
        }
        report.winner = winner;
        Ok(())
    }
}

enum Choice {
    Picked(usize),
    GaveUp,
    Interrupted,
}

async fn choose<O>(
    trials: &[CalibrationTrial],
    operator: &mut O,
    shutdown: &mut Shutdown,
) -> ProjectorResult<Choice>
where
    O: Operator + ?Sized,
{
    for attempt in 1..=MAX_CHOICE_ATTEMPTS {
        let answer = tokio::select! {
            answer = operator.ask("Enter choice number:") => answer?,
            _ = shutdown.wait() => return Ok(Choice::Interrupted),
        };
        let Some(answer) = answer else {
            warn!("Operator input closed");
            return Ok(Choice::GaveUp);
        };
        match answer.trim().parse::<usize>() {
            Ok(index) if select_by_index(trials, index).is_some() => {
                return Ok(Choice::Picked(index));
            }
            _ => warn!(
                "'{}' is not a delivered trial number (attempt {}/{})",
                answer.trim(),
                attempt,
                MAX_CHOICE_ATTEMPTS
            ),
        }
    }
    Ok(Choice::GaveUp)
}

/// Fluent configuration for [`SweepController`].
pub struct SweepControllerBuilder {
    candidates: Option<CandidateSet>,
    configs: Vec<EncodingConfig>,
    dwell: Duration,
    selection: SelectionMode,
    store: Option<ConfigStore>,
    filter: Filter,
}

impl SweepControllerBuilder {
    pub fn new() -> Self {
        Self {
            candidates: None,
            configs: Vec::new(),
            dwell: DEFAULT_DWELL,
            selection: SelectionMode::default(),
            store: None,
            filter: Filter::default(),
        }
    }

    /// Sweep the Cartesian product of a candidate set.
    pub fn with_candidates(mut self, candidates: CandidateSet) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Sweep an explicit list, e.g. from [`fine_tune_candidates`](super::fine_tune_candidates).
    /// Appended after any candidate set.
    pub fn with_configs(mut self, configs: impl IntoIterator<Item = EncodingConfig>) -> Self {
        self.configs.extend(configs);
        self
    }

    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }

    pub fn with_selection(mut self, selection: SelectionMode) -> Self {
        self.selection = selection;
        self
    }

    /// Persist the winner here. Without a store the sweep only reports.
    pub fn with_store(mut self, store: ConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn build(self) -> ProjectorResult<SweepController> {
        let mut plan = match &self.candidates {
            Some(set) => set.enumerate()?,
            None => Vec::new(),
        };
        for config in self.configs {
            match config.validate() {
                Ok(()) => plan.push(config),
                Err(e) => warn!("Dropping candidate {}: {}", config, e),
            }
        }
        if plan.is_empty() {
            return Err(ProjectorError::config(
                "candidates",
                "the sweep has no valid configuration to try",
            ));
        }

        Ok(SweepController {
            plan,
            dwell: self.dwell,
            selection: self.selection,
            store: self.store,
            compositor: Compositor::new(self.filter),
        })
    }
}

impl Default for SweepControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::candidates::Resolution;
    use crate::config::ChannelOrder;
    use crate::encoder::EncodedBuffer;
    use async_trait::async_trait;

    #[derive(Default)]
    struct MemorySink {
        frames: Vec<EncodedBuffer>,
        fail_on: Vec<usize>,
        calls: usize,
        cleanups: usize,
    }

    impl DeviceSink for MemorySink {
        fn deliver(&mut self, buffer: &EncodedBuffer) -> ProjectorResult<()> {
            self.calls += 1;
            if self.fail_on.contains(&self.calls) {
                return Err(ProjectorError::sink_write("memory", "injected"));
            }
            self.frames.push(buffer.clone());
            Ok(())
        }

        fn cleanup(&mut self) {
            self.cleanups += 1;
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    struct Answers(Vec<&'static str>);

    #[async_trait]
    impl Operator for Answers {
        fn present(&mut self, _trials: &[CalibrationTrial]) {}

        async fn ask(&mut self, _prompt: &str) -> ProjectorResult<Option<String>> {
            if self.0.is_empty() {
                return Ok(None);
            }
            Ok(Some(self.0.remove(0).to_string()))
        }
    }

    fn small_set() -> CandidateSet {
        CandidateSet {
            resolutions: vec![Resolution::new(8, 4), Resolution::new(4, 2)],
            fits: vec![FitPolicy::ExactFit, FitPolicy::AspectFit],
            strides: vec![
                crate::calibration::StrideCandidate::Literal(12),
                crate::calibration::StrideCandidate::Literal(32),
            ],
            orders: vec![ChannelOrder::IDENTITY, ChannelOrder::REVERSE],
        }
    }

    fn source() -> Frame {
        Frame::from_fn(16, 9, |x, y| [x as u8 * 10, y as u8 * 20, 100]).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_resizes_once_per_size_and_fit() {
        let mut controller = SweepController::builder()
            .with_candidates(small_set())
            .with_selection(SelectionMode::Unattended)
            .build()
            .unwrap();
        // 8 wide: only stride 32 (min 24); 4 wide: 12 and 32.
        assert_eq!(controller.plan().len(), (1 + 2) * 2 * 2);

        let mut sink = MemorySink::default();
        let report = controller
            .run(&source(), &mut sink, &mut Answers(vec![]), &mut Shutdown::never())
            .await
            .unwrap();
        assert_eq!(report.resizes, 4);
        assert_eq!(sink.frames.len(), 12);
        assert_eq!(sink.cleanups, 1);
        assert_eq!(
            report.trials.iter().map(|t| t.index).collect::<Vec<_>>(),
            (1..=12).collect::<Vec<_>>()
        );
        // Paddings: 8 wide at 32 -> 8, 4 wide at 12 -> 0, 4 wide at 32 -> 20.
        let winner = report.winner.unwrap();
        assert_eq!((winner.index, winner.config.width, winner.config.stride), (1, 8, 32));
        assert_eq!(winner.verdict, Verdict::Accepted);
        assert!(!report.store_written);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interactive_reprompts_then_gives_up() {
        let mut controller = SweepController::builder()
            .with_candidates(small_set())
            .build()
            .unwrap();
        let mut sink = MemorySink::default();
        let mut operator = Answers(vec!["", "zero", "99", "1"]);
        let report = controller
            .run(&source(), &mut sink, &mut operator, &mut Shutdown::never())
            .await
            .unwrap();
        assert!(report.winner.is_none());
        assert!(!report.cancelled);
        assert_eq!(operator.0, vec!["1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interactive_choice_marks_verdicts() {
        let mut controller = SweepController::builder()
            .with_candidates(small_set())
            .build()
            .unwrap();
        let mut sink = MemorySink {
            fail_on: vec![2],
            ..MemorySink::default()
        };
        let mut operator = Answers(vec!["2", " 3 "]);
        let report = controller
            .run(&source(), &mut sink, &mut operator, &mut Shutdown::never())
            .await
            .unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.winner.as_ref().unwrap().index, 3);
        assert_eq!(report.trials[0].verdict, Verdict::Rejected);
        assert_eq!(report.trials[1].verdict, Verdict::Unrated);
        assert_eq!(report.trials[2].verdict, Verdict::Accepted);
    }

    #[test]
    fn test_build_rejects_empty_plan() {
        assert!(SweepController::builder().build().is_err());
        let bad = EncodingConfig {
            stride: 10,
            ..EncodingConfig::default()
        };
        assert!(SweepController::builder().with_configs([bad]).build().is_err());
    }
}
