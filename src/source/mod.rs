//! # Frame Sources
//!
//! Where pictures come from before they are composited for the projector.
//!
//! - [`SourceSpec`]: a user-supplied location classified once at the boundary
//!   into a local path, a remote URL, or an invalid location
//! - [`FrameSource`]: async interface each provider implements
//! - [`ProviderChain`]: ordered fallback across providers, first success wins
//!
//! Providers: [`LocalImageSource`], [`RemoteImageSource`], [`FramebufferSource`],
//! [`TestPatternSource`].

// Standard library imports
use std::path::{Path, PathBuf};

// External crate imports
use async_trait::async_trait;
use tracing::{debug, warn};

// Internal module imports
use crate::error::{ProjectorError, ProjectorResult, classify};
use crate::frame::Frame;

pub mod framebuffer;
pub mod pattern;
pub mod still;

pub use framebuffer::{FramebufferSource, PixelLayout};
pub use pattern::TestPatternSource;
pub use still::{LocalImageSource, RemoteImageSource};

/// Abstract interface for frame providers.
#[async_trait]
pub trait FrameSource: Send {
    /// Produce the next frame. Failures are `SourceUnavailable`.
    async fn acquire(&mut self) -> ProjectorResult<Frame>;

    /// Short description for logs.
    fn name(&self) -> String;
}

/// A picture location as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    LocalPath(PathBuf),
    RemoteUrl(String),
    Invalid(String),
}

impl SourceSpec {
    /// Existing files win over URL syntax; anything else is invalid.
    pub fn classify(location: &str) -> Self {
        if Path::new(location).is_file() {
            SourceSpec::LocalPath(PathBuf::from(location))
        } else if location.starts_with("http://") || location.starts_with("https://") {
            SourceSpec::RemoteUrl(location.to_string())
        } else {
            SourceSpec::Invalid(location.to_string())
        }
    }

    /// Build the provider for this location.
    pub fn into_source(self) -> ProjectorResult<Box<dyn FrameSource>> {
        match self {
            SourceSpec::LocalPath(path) => Ok(Box::new(LocalImageSource::new(path))),
            SourceSpec::RemoteUrl(url) => Ok(Box::new(RemoteImageSource::new(url)?)),
            SourceSpec::Invalid(location) => Err(ProjectorError::source_unavailable(
                location,
                "neither an existing file nor an http(s) URL",
            )),
        }
    }
}

/// Ordered list of providers tried until one succeeds.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn FrameSource>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest priority.
    pub fn with<S: FrameSource + 'static>(mut self, source: S) -> Self {
        self.providers.push(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl FrameSource for ProviderChain {
    async fn acquire(&mut self) -> ProjectorResult<Frame> {
        let mut last_failure = None;
        for provider in &mut self.providers {
            match provider.acquire().await {
                Ok(frame) => {
                    debug!(
                        "Acquired {}x{} frame from {}",
                        frame.width(),
                        frame.height(),
                        provider.name()
                    );
                    return Ok(frame);
                }
                Err(e) if classify::is_skippable(&e) => {
                    warn!("Provider {} failed: {}", provider.name(), e);
                    last_failure = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(match last_failure {
            Some(ProjectorError::SourceUnavailable { reason, .. }) => {
                ProjectorError::source_unavailable(self.name(), format!("all providers failed, last: {}", reason))
            }
            Some(other) => other,
            None => ProjectorError::source_unavailable(self.name(), "no providers configured"),
        })
    }

    fn name(&self) -> String {
        let names: Vec<String> = self.providers.iter().map(|p| p.name()).collect();
        format!("chain[{}]", names.join(", "))
    }
}

/// Run blocking acquisition work off the async loop.
pub(crate) async fn blocking<T, F>(origin: &str, work: F) -> ProjectorResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ProjectorResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ProjectorError::source_unavailable(origin, e))?
}
