//! # Config Store
//!
//! Persists the layout confirmed by calibration as a small JSON record:
//!
//! ```json
//! {
//!   "width": 800,
//!   "height": 600,
//!   "stride": 2560,
//!   "channel_order": "bgr",
//!   "fit_mode": "exact"
//! }
//! ```
//!
//! `channel_order` may also be `"rgb"`, `"identity"`, `"reverse"`, any
//! arrangement of `r`/`g`/`b`, or an index array such as `[2, 1, 0]`. Records
//! written by the older calibration script (`"swap_bgr": true`,
//! `"mode": "Exact-fit"`) load as well.
//!
//! Loading never fails: a missing file or any structural problem falls back to
//! [`EncodingConfig::default`]. Saving goes through a temp file in the same
//! directory and a rename, so an interrupted save leaves the previous record
//! intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::encoding::{ChannelOrder, EncodingConfig, FitPolicy};
use crate::error::{ProjectorError, ProjectorResult};

/// Default record location, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gm12u320_best.json";

#[derive(Serialize)]
struct ConfigRecord {
    width: u32,
    height: u32,
    stride: usize,
    channel_order: ChannelOrder,
    fit_mode: FitPolicy,
}

/// Every field optional so each structural failure gets a precise message.
#[derive(Deserialize)]
struct RawRecord {
    width: Option<i64>,
    height: Option<i64>,
    stride: Option<i64>,
    channel_order: Option<ChannelOrder>,
    swap_bgr: Option<bool>,
    fit_mode: Option<FitPolicy>,
    mode: Option<FitPolicy>,
}

impl RawRecord {
    fn into_config(self) -> ProjectorResult<EncodingConfig> {
        let width = positive_u32("width", self.width)?;
        let height = positive_u32("height", self.height)?;
        let stride = self
            .stride
            .ok_or_else(|| ProjectorError::config("stride", "missing"))
            .and_then(|s| {
                usize::try_from(s)
                    .map_err(|_| ProjectorError::config("stride", format!("{} is negative", s)))
            })?;
        let channel_order = match (self.channel_order, self.swap_bgr) {
            (Some(order), _) => order,
            (None, Some(true)) => ChannelOrder::REVERSE,
            (None, Some(false)) => ChannelOrder::IDENTITY,
            (None, None) => return Err(ProjectorError::config("channel_order", "missing")),
        };
        let fit = self
            .fit_mode
            .or(self.mode)
            .ok_or_else(|| ProjectorError::config("fit_mode", "missing"))?;
        EncodingConfig::new(width, height, stride, channel_order, fit)
    }
}

fn positive_u32(field: &str, value: Option<i64>) -> ProjectorResult<u32> {
    let value = value.ok_or_else(|| ProjectorError::config(field, "missing"))?;
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ProjectorError::config(field, format!("{} is not a positive integer", value))),
    }
}

/// File-backed store for the best-known encoding configuration.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted configuration, or the built-in default when the record
    /// is missing or malformed.
    pub fn load(&self) -> EncodingConfig {
        match self.try_load() {
            Ok(Some(config)) => {
                info!("Loaded encoding config from {}: {}", self.path.display(), config);
                config
            }
            Ok(None) => {
                debug!("No config record at {}, using defaults", self.path.display());
                EncodingConfig::default()
            }
            Err(e) => {
                warn!("Ignoring config record {}: {}", self.path.display(), e);
                EncodingConfig::default()
            }
        }
    }

    /// Strict variant of [`load`](Self::load): `Ok(None)` when no record exists,
    /// an error when one exists but does not validate.
    pub fn try_load(&self) -> ProjectorResult<Option<EncodingConfig>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ProjectorError::io("reading config record", e)),
        };
        let raw: RawRecord = serde_json::from_str(&text)?;
        raw.into_config().map(Some)
    }

    /// Overwrite the persisted record with `config`.
    pub fn save(&self, config: &EncodingConfig) -> ProjectorResult<()> {
        config.validate()?;
        let record = ConfigRecord {
            width: config.width,
            height: config.height,
            stride: config.stride,
            channel_order: config.channel_order,
            fit_mode: config.fit,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| ProjectorError::io("creating config temp file", e))?;
        serde_json::to_writer_pretty(&mut tmp, &record)?;
        tmp.write_all(b"\n")
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ProjectorError::io("writing config record", e))?;
        tmp.persist(&self.path)
            .map_err(|e| ProjectorError::io("replacing config record", e.error))?;

        info!("Saved best config to {}: {}", self.path.display(), config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(contents: &str) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.json");
        std::fs::write(&path, contents).unwrap();
        (dir, ConfigStore::new(path))
    }

    #[test]
    fn test_missing_record_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("absent.json"));
        assert_eq!(store.try_load().unwrap(), None);
        assert_eq!(store.load(), EncodingConfig::default());
    }

    #[test]
    fn test_legacy_record() {
        let (_dir, store) = store_with(
            r#"{"width": 640, "height": 480, "stride": 2048, "swap_bgr": false, "mode": "Aspect-fit"}"#,
        );
        let config = store.load();
        assert_eq!((config.width, config.height, config.stride), (640, 480, 2048));
        assert_eq!(config.channel_order, ChannelOrder::IDENTITY);
        assert_eq!(config.fit, FitPolicy::AspectFit);
    }

    #[test]
    fn test_explicit_permutation_record() {
        let (_dir, store) = store_with(
            r#"{"width": 800, "height": 600, "stride": 2562, "channel_order": [1, 0, 2], "fit_mode": "exact"}"#,
        );
        assert_eq!(store.load().channel_order.indices(), [1, 0, 2]);
    }

    #[test]
    fn test_invalid_records_fall_back() {
        let cases = [
            "not json",
            r#"{"height": 600, "stride": 2560, "channel_order": "bgr", "fit_mode": "exact"}"#,
            r#"{"width": -800, "height": 600, "stride": 2560, "channel_order": "bgr", "fit_mode": "exact"}"#,
            r#"{"width": 800, "height": 0, "stride": 2560, "channel_order": "bgr", "fit_mode": "exact"}"#,
            r#"{"width": 800, "height": 600, "stride": 2000, "channel_order": "bgr", "fit_mode": "exact"}"#,
            r#"{"width": 800, "height": 600, "stride": 2560, "channel_order": "bgx", "fit_mode": "exact"}"#,
            r#"{"width": 800, "height": 600, "stride": 2560, "channel_order": "bgr"}"#,
        ];
        for case in cases {
            let (_dir, store) = store_with(case);
            assert!(store.try_load().is_err(), "accepted: {}", case);
            assert_eq!(store.load(), EncodingConfig::default());
        }
    }

    #[test]
    fn test_save_overwrites_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("best.json"));
        let first = EncodingConfig::new(640, 480, 2048, ChannelOrder::IDENTITY, FitPolicy::AspectFit).unwrap();
        store.save(&first).unwrap();
        store.save(&EncodingConfig::default()).unwrap();
        assert_eq!(store.try_load().unwrap(), Some(EncodingConfig::default()));

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"channel_order\": \"bgr\""));
        assert!(text.contains("\"fit_mode\": \"exact\""));
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("best.json"));
        let mut config = EncodingConfig::default();
        config.stride = 100;
        assert!(store.save(&config).is_err());
        assert!(!store.path().exists());
    }
}
