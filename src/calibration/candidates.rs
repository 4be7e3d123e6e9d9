//! Candidate axes and their deterministic enumeration.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::config::{ChannelOrder, EncodingConfig, FitPolicy, MAX_BUFFER_LEN, aligned_stride};
use crate::error::{ProjectorError, ProjectorResult};

/// Stride multipliers tried around each base configuration when fine tuning.
pub const STRIDE_FACTORS: [f64; 5] = [0.8, 0.9, 1.0, 1.1, 1.2];

/// Width and height nudges tried around each base configuration.
pub const RESOLUTION_OFFSETS: [i64; 3] = [-100, 0, 100];

/// Neither side is fine-tuned below this.
pub const MIN_FINE_TUNE_SIDE: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ProjectorError;

    /// Parses `WIDTHxHEIGHT`, e.g. `800x600`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ProjectorError::config("resolution", format!("expected WxH, got '{}'", s));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(bad)?;
        let width = w.trim().parse().map_err(|_| bad())?;
        let height = h.trim().parse().map_err(|_| bad())?;
        if width == 0 || height == 0 {
            return Err(ProjectorError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }
}

/// How a stride value is produced for a given width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrideCandidate {
    /// Fixed byte count, independent of width.
    Literal(usize),
    /// `ceil(3w / alignment) * alignment + extra_blocks * alignment`.
    Aligned {
        alignment: usize,
        extra_blocks: usize,
    },
}

impl StrideCandidate {
    pub fn resolve(self, width: u32) -> usize {
        match self {
            StrideCandidate::Literal(stride) => stride,
            StrideCandidate::Aligned {
                alignment,
                extra_blocks,
            } => aligned_stride(width, alignment, extra_blocks),
        }
    }
}

impl fmt::Display for StrideCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrideCandidate::Literal(stride) => write!(f, "{}", stride),
            StrideCandidate::Aligned {
                alignment,
                extra_blocks,
            } => write!(f, "align{}+{}", alignment, extra_blocks),
        }
    }
}

/// The finite configuration space of a sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateSet {
    pub resolutions: Vec<Resolution>,
    pub fits: Vec<FitPolicy>,
    pub strides: Vec<StrideCandidate>,
    pub orders: Vec<ChannelOrder>,
}

impl CandidateSet {
    /// Layouts reported as working by one or another of the legacy tools.
    pub fn standard() -> Self {
        Self {
            resolutions: vec![
                Resolution::new(640, 480),
                Resolution::new(720, 480),
                Resolution::new(800, 600),
            ],
            fits: vec![FitPolicy::ExactFit, FitPolicy::AspectFit],
            strides: [2048, 2560, 2562, 2816, 3072]
                .into_iter()
                .map(StrideCandidate::Literal)
                .collect(),
            orders: vec![ChannelOrder::IDENTITY, ChannelOrder::REVERSE],
        }
    }

    pub fn validate(&self) -> ProjectorResult<()> {
        let axes = [
            ("resolutions", self.resolutions.is_empty()),
            ("fits", self.fits.is_empty()),
            ("strides", self.strides.is_empty()),
            ("orders", self.orders.is_empty()),
        ];
        if let Some((axis, _)) = axes.iter().find(|(_, empty)| *empty) {
            return Err(ProjectorError::config(*axis, "candidate axis is empty"));
        }
        for r in &self.resolutions {
            crate::frame::check_dimensions(r.width, r.height)?;
        }
        if self
            .strides
            .iter()
            .any(|s| matches!(s, StrideCandidate::Aligned { alignment: 0, .. }))
        {
            return Err(ProjectorError::config("strides", "alignment must be positive"));
        }
        Ok(())
    }

    /// Every valid combination, in resolution -> fit -> stride -> order
    /// nesting. Strides that collapse to the same value for one resolution are
    /// tried once. Strides below `3 * width` or past [`MAX_BUFFER_LEN`] are
    /// dropped.
    pub fn enumerate(&self) -> ProjectorResult<Vec<EncodingConfig>> {
        self.validate()?;
        let mut out = Vec::new();
        for res in &self.resolutions {
            let strides = self.strides_for(*res);
            for &fit in &self.fits {
                for &stride in &strides {
                    for &channel_order in &self.orders {
                        out.push(EncodingConfig {
                            width: res.width,
                            height: res.height,
                            stride,
                            channel_order,
                            fit,
                        });
                    }
                }
            }
        }
        debug!("Candidate space has {} configurations", out.len());
        Ok(out)
    }

    /// Number of configurations [`enumerate`](Self::enumerate) yields.
    pub fn len(&self) -> usize {
        self.resolutions
            .iter()
            .map(|r| self.strides_for(*r).len())
            .sum::<usize>()
            * self.fits.len()
            * self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn strides_for(&self, res: Resolution) -> Vec<usize> {
        let width = res.width;
        let minimum = width as usize * crate::frame::CHANNELS;
        let mut seen = HashSet::new();
        let mut strides = Vec::new();
        for candidate in &self.strides {
            if matches!(candidate, StrideCandidate::Aligned { alignment: 0, .. }) {
                continue;
            }
            let stride = candidate.resolve(width);
            if stride < minimum {
                debug!(
                    "Pruning stride {} for width {}: below {} bytes",
                    stride, width, minimum
                );
                continue;
            }
            if stride
                .checked_mul(res.height as usize)
                .is_none_or(|len| len > MAX_BUFFER_LEN)
            {
                debug!("Pruning stride {} for {}: frame too large", stride, res);
                continue;
            }
            if seen.insert(stride) {
                strides.push(stride);
            }
        }
        strides
    }
}

impl Default for CandidateSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Layouts the fine-tune pass starts from when no calibrated record exists.
pub fn default_fine_tune_bases() -> Vec<EncodingConfig> {
    let base = |width, height, stride, channel_order| EncodingConfig {
        width,
        height,
        stride,
        channel_order,
        fit: FitPolicy::ExactFit,
    };
    vec![
        base(800, 600, 2560, ChannelOrder::REVERSE),
        base(640, 480, 2048, ChannelOrder::REVERSE),
        base(800, 600, 2560, ChannelOrder::IDENTITY),
        base(800, 600, 2816, ChannelOrder::REVERSE),
    ]
}

/// Neighbourhood of each base: base -> stride factor -> width offset -> height
/// offset. Sides are clamped to [`MIN_FINE_TUNE_SIDE`], scaled strides are
/// truncated, invalid strides are pruned and repeated layouts kept once.
pub fn fine_tune_candidates(bases: &[EncodingConfig]) -> Vec<EncodingConfig> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for base in bases {
        for factor in STRIDE_FACTORS {
            let stride = (base.stride as f64 * factor) as usize;
            for dx in RESOLUTION_OFFSETS {
                for dy in RESOLUTION_OFFSETS {
                    let width = nudge(base.width, dx);
                    let height = nudge(base.height, dy);
                    let config = EncodingConfig {
                        width,
                        height,
                        stride,
                        ..*base
                    };
                    if config.validate().is_err() {
                        debug!("Pruning invalid fine-tune candidate {}", config);
                        continue;
                    }
                    if seen.insert(config) {
                        out.push(config);
                    }
                }
            }
        }
    }
    out
}

fn nudge(side: u32, delta: i64) -> u32 {
    (i64::from(side) + delta).max(i64::from(MIN_FINE_TUNE_SIDE)) as u32
}
