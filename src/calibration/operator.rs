//! The human in the loop.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::trial::CalibrationTrial;
use crate::error::{ProjectorError, ProjectorResult};

/// Presents finished trials and collects the operator's answer.
#[async_trait]
pub trait Operator: Send {
    /// Show the trials the operator can choose from.
    fn present(&mut self, trials: &[CalibrationTrial]);

    /// One line of input, or `None` once input is exhausted.
    async fn ask(&mut self, prompt: &str) -> ProjectorResult<Option<String>>;
}

/// Terminal operator on stdin/stdout.
///
/// Lines are read on a detached thread and handed over a channel, so an
/// unanswered prompt never keeps the runtime from shutting down.
pub struct StdinOperator {
    lines: Option<mpsc::Receiver<io::Result<String>>>,
}

impl StdinOperator {
    pub fn new() -> Self {
        Self { lines: None }
    }
}

fn spawn_line_reader<F, R>(open: F) -> io::Result<mpsc::Receiver<io::Result<String>>>
where
    F: FnOnce() -> R + Send + 'static,
    R: BufRead,
{
    let (tx, rx) = mpsc::channel(1);
    std::thread::Builder::new()
        .name("operator-input".into())
        .spawn(move || {
            for line in open().lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

impl Default for StdinOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for StdinOperator {
    fn present(&mut self, trials: &[CalibrationTrial]) {
        println!();
        println!("Calibration finished. Choose the number of the best result:");
        for trial in trials {
            println!("  {}", trial);
        }
    }

    async fn ask(&mut self, prompt: &str) -> ProjectorResult<Option<String>> {
        print!("{} ", prompt);
        std::io::stdout()
            .flush()
            .map_err(|e| ProjectorError::io("flushing prompt", e))?;
        if self.lines.is_none() {
            let reader = spawn_line_reader(|| io::stdin().lock())
                .map_err(|e| ProjectorError::io("starting input reader", e))?;
            self.lines = Some(reader);
        }
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };
        match lines.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(ProjectorError::io("reading operator input", e)),
            None => Ok(None),
        }
    }
}
