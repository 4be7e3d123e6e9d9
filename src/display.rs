//! # Display Loops
//!
//! Normal (non-calibration) operation with a known layout:
//!
//! - [`show`]: one pass, then hold the picture until interrupted.
//! - [`mirror`]: repeated passes from a live source at a fixed rate.
//!
//! Both own the sink for their whole lifetime and clean it up on the way out.

use std::time::Duration;

use frame_scale::plan::Filter;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::compositor::{Compositor, Offset};
use crate::config::EncodingConfig;
use crate::encoder::{EncodedBuffer, encode};
use crate::error::{ProjectorError, ProjectorResult};
use crate::frame::Frame;
use crate::shutdown::Shutdown;
use crate::sink::DeviceSink;
use crate::source::FrameSource;

pub const DEFAULT_FPS: u32 = 5;

const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Compositor + encoder for one fixed layout.
#[derive(Debug)]
pub struct Pipeline {
    config: EncodingConfig,
    offset: Offset,
    compositor: Compositor,
}

impl Pipeline {
    pub fn new(config: EncodingConfig, filter: Filter) -> ProjectorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            offset: Offset::default(),
            compositor: Compositor::new(filter),
        })
    }

    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn config(&self) -> &EncodingConfig {
        &self.config
    }

    /// Fit `frame` to the layout and encode it.
    pub fn render(&mut self, frame: &Frame) -> ProjectorResult<EncodedBuffer> {
        let c = self.config;
        let fitted =
            self.compositor
                .resize_with_offset(frame, c.width, c.height, c.fit, self.offset)?;
        encode(&fitted, &c)
    }
}

/// Single pass, then hold until `shutdown` fires. Source and sink failures
/// are fatal here.
pub async fn show<S, F>(
    source: &mut F,
    pipeline: &mut Pipeline,
    sink: &mut S,
    shutdown: &mut Shutdown,
) -> ProjectorResult<()>
where
    S: DeviceSink + ?Sized,
    F: FrameSource + ?Sized,
{
    let result = show_once(source, pipeline, sink).await;
    if result.is_ok() {
        info!("Displaying on {}; press Ctrl+C to stop", sink.describe());
        shutdown.wait().await;
    }
    sink.cleanup();
    result
}

async fn show_once<S, F>(source: &mut F, pipeline: &mut Pipeline, sink: &mut S) -> ProjectorResult<()>
where
    S: DeviceSink + ?Sized,
    F: FrameSource + ?Sized,
{
    let frame = source.acquire().await?;
    info!(
        "Source {} is {}x{}; layout {}",
        source.name(),
        frame.width(),
        frame.height(),
        pipeline.config()
    );
    let buffer = pipeline.render(&frame)?;
    sink.deliver(&buffer)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MirrorOptions {
    pub fps: u32,
    /// Stop after this many passes. `None` runs until interrupted.
    pub max_frames: Option<u64>,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            max_frames: None,
        }
    }
}

/// Counters for a mirror session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub passes: u64,
    pub delivered: u64,
    pub source_failures: u64,
    pub sink_failures: u64,
}

/// Paced capture loop. Unavailable frames and failed writes are counted and
/// skipped; any other error ends the loop.
pub async fn mirror<S, F>(
    source: &mut F,
    pipeline: &mut Pipeline,
    sink: &mut S,
    options: MirrorOptions,
    shutdown: &mut Shutdown,
) -> ProjectorResult<MirrorStats>
where
    S: DeviceSink + ?Sized,
    F: FrameSource + ?Sized,
{
    if options.fps == 0 {
        return Err(ProjectorError::config("fps", "frame rate must be positive"));
    }
    let period = Duration::from_secs_f64(1.0 / f64::from(options.fps));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Mirroring {} to {} at {} fps",
        source.name(),
        sink.describe(),
        options.fps
    );

    let mut stats = MirrorStats::default();
    let mut window_start = Instant::now();
    let mut window_frames = 0u64;

    let outcome = loop {
        if options.max_frames.is_some_and(|max| stats.passes >= max) {
            break Ok(());
        }
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.wait() => break Ok(()),
        }

        stats.passes += 1;
        let pass = tokio::select! {
            frame = source.acquire() => frame,
            _ = shutdown.wait() => break Ok(()),
        };
        let delivered = pass
            .and_then(|frame| pipeline.render(&frame))
            .and_then(|buffer| sink.deliver(&buffer));

        match delivered {
            Ok(()) => {
                stats.delivered += 1;
                window_frames += 1;
            }
            Err(e @ ProjectorError::SourceUnavailable { .. }) => {
                stats.source_failures += 1;
                warn!("Frame {} skipped: {}", stats.passes, e);
            }
            Err(e @ ProjectorError::SinkWriteFailure { .. }) => {
                stats.sink_failures += 1;
                warn!("Frame {} not written: {}", stats.passes, e);
            }
            Err(e) => break Err(e),
        }

        let elapsed = window_start.elapsed();
        if elapsed >= STATS_INTERVAL {
            info!(
                "{:.1} fps ({} delivered, {} skipped)",
                window_frames as f64 / elapsed.as_secs_f64(),
                stats.delivered,
                stats.source_failures + stats.sink_failures
            );
            window_start = Instant::now();
            window_frames = 0;
        }
    };

    sink.cleanup();
    debug!("Mirror stopped: {:?}", stats);
    outcome.map(|()| stats)
}
