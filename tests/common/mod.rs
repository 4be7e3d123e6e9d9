//! Common test utilities for the projector integration tests
//!
//! In-memory stand-ins for the device sink and the human operator, plus a
//! few deterministic frames.

#![allow(dead_code)]

/// Sink that keeps every delivered buffer in memory
pub mod recording_sink {
    use stride_projector::encoder::EncodedBuffer;
    use stride_projector::error::{ProjectorError, ProjectorResult};
    use stride_projector::sink::DeviceSink;

    #[derive(Default)]
    pub struct RecordingSink {
        pub frames: Vec<EncodedBuffer>,
        /// 1-based delivery attempts that fail with `SinkWriteFailure`
        pub fail_on: Vec<usize>,
        pub attempts: usize,
        pub cleanups: usize,
    }

    impl RecordingSink {
        pub fn failing_on(attempts: impl IntoIterator<Item = usize>) -> Self {
            Self {
                fail_on: attempts.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl DeviceSink for RecordingSink {
        fn deliver(&mut self, buffer: &EncodedBuffer) -> ProjectorResult<()> {
            self.attempts += 1;
            if self.fail_on.contains(&self.attempts) {
                return Err(ProjectorError::sink_write("recording", "injected failure"));
            }
            self.frames.push(buffer.clone());
            Ok(())
        }

        fn cleanup(&mut self) {
            self.cleanups += 1;
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }
}

/// Operator that replays canned answers
pub mod scripted_operator {
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use stride_projector::calibration::{CalibrationTrial, Operator};
    use stride_projector::error::ProjectorResult;

    #[derive(Default)]
    pub struct ScriptedOperator {
        answers: VecDeque<String>,
        /// Indices of the trials shown, per presentation
        pub presented: Vec<Vec<usize>>,
        pub prompts: usize,
    }

    impl ScriptedOperator {
        pub fn new<I, S>(answers: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                answers: answers.into_iter().map(Into::into).collect(),
                ..Self::default()
            }
        }

        pub fn remaining(&self) -> usize {
            self.answers.len()
        }
    }

    #[async_trait]
    impl Operator for ScriptedOperator {
        fn present(&mut self, trials: &[CalibrationTrial]) {
            self.presented.push(trials.iter().map(|t| t.index).collect());
        }

        async fn ask(&mut self, _prompt: &str) -> ProjectorResult<Option<String>> {
            self.prompts += 1;
            Ok(self.answers.pop_front())
        }
    }
}

/// Operator that never answers
pub mod stalled_operator {
    use async_trait::async_trait;
    use stride_projector::calibration::{CalibrationTrial, Operator};
    use stride_projector::error::ProjectorResult;

    #[derive(Default)]
    pub struct StalledOperator {
        pub presented: usize,
        pub prompts: usize,
    }

    #[async_trait]
    impl Operator for StalledOperator {
        fn present(&mut self, _trials: &[CalibrationTrial]) {
            self.presented += 1;
        }

        async fn ask(&mut self, _prompt: &str) -> ProjectorResult<Option<String>> {
            self.prompts += 1;
            std::future::pending().await
        }
    }
}

/// Test frame utilities
pub mod test_frames {
    use stride_projector::Frame;

    /// Distinct value in every channel of every pixel (modulo 256)
    pub fn gradient(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| {
            [
                (x % 256) as u8,
                (y % 256) as u8,
                ((x * 7 + y * 13) % 256) as u8,
            ]
        })
        .expect("valid test frame")
    }

    pub fn full_hd_white() -> Frame {
        Frame::filled(1920, 1080, [255, 255, 255]).expect("valid test frame")
    }
}
