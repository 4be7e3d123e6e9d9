//! # Device Sink
//!
//! The boundary where encoded frames leave the process. The kernel driver picks
//! up whatever file it is pointed at, so a delivery must never expose a partly
//! written frame: [`FileSink`] writes a sibling temp file, syncs it, and renames
//! it over the target in one step.
//!
//! Sinks are driven by exactly one control loop. Every method takes `&mut self`,
//! which is the whole single-writer story.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::encoder::EncodedBuffer;
use crate::error::{ProjectorError, ProjectorResult};

/// Device node whose presence means the projector driver is loaded.
pub const DEFAULT_DEVICE: &str = "/dev/dri/card2";

/// File the driver reads frames from.
pub const DEFAULT_OUTPUT: &str = "/tmp/gm12u320_image.rgb";

/// Destination for encoded frames.
pub trait DeviceSink {
    /// Deliver one complete frame. Failures are `SinkWriteFailure`.
    fn deliver(&mut self, buffer: &EncodedBuffer) -> ProjectorResult<()>;

    /// Remove any transient artifact left by deliveries. Best effort.
    fn cleanup(&mut self);

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

impl<S: DeviceSink + ?Sized> DeviceSink for &mut S {
    fn deliver(&mut self, buffer: &EncodedBuffer) -> ProjectorResult<()> {
        (**self).deliver(buffer)
    }

    fn cleanup(&mut self) {
        (**self).cleanup()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Sink writing each frame to a file with an atomic swap.
#[derive(Debug)]
pub struct FileSink {
    target: PathBuf,
    frames_written: u64,
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT)
    }
}

impl FileSink {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            frames_written: 0,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn fail(&self, reason: impl ToString) -> ProjectorError {
        ProjectorError::sink_write(self.target.display().to_string(), reason)
    }
}

impl DeviceSink for FileSink {
    fn deliver(&mut self, buffer: &EncodedBuffer) -> ProjectorResult<()> {
        let dir = match self.target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".frame-")
            .suffix(".rgb")
            .tempfile_in(dir)
            .map_err(|e| self.fail(format!("creating temp file: {}", e)))?;
        tmp.write_all(buffer.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| self.fail(e))?;
        tmp.persist(&self.target).map_err(|e| self.fail(e.error))?;

        let on_disk = std::fs::metadata(&self.target)
            .map_err(|e| self.fail(e))?
            .len();
        if on_disk != buffer.len() as u64 {
            return Err(self.fail(format!(
                "size check failed: expected {} bytes, found {}",
                buffer.len(),
                on_disk
            )));
        }

        self.frames_written += 1;
        debug!(
            "Frame {} written to {} ({} bytes)",
            self.frames_written,
            self.target.display(),
            on_disk
        );
        Ok(())
    }

    fn cleanup(&mut self) {
        match std::fs::remove_file(&self.target) {
            Ok(()) => info!("Removed {}", self.target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", self.target.display(), e),
        }
    }

    fn describe(&self) -> String {
        self.target.display().to_string()
    }
}

/// Startup precondition: the projector device node must exist.
pub fn require_device(path: &Path) -> ProjectorResult<()> {
    if path.exists() {
        info!("Projector detected at {}", path.display());
        Ok(())
    } else {
        Err(ProjectorError::DeviceNotFound {
            path: path.to_path_buf(),
        })
    }
}
