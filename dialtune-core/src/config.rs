//! # Configuration Module
//!
//! Tuner settings with sensible defaults, optionally loaded from a JSON file.
//! Missing fields fall back to their defaults, so a file only needs to name
//! what it changes.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::audio::CaptureSettings;
use crate::tuning::{self, ReferenceTable};

/// Smallest analysis window the pitch detector accepts.
pub const MIN_FRAME_SIZE: usize = 64;

/// Settings for the reference table, the live pitch feed and the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// First octave of the reference table
    pub start_octave: i32,
    /// Last octave of the reference table
    pub end_octave: i32,
    /// Requested capture sample rate in Hz
    pub sample_rate: u32,
    /// Analysis window in samples
    pub frame_size: usize,
    /// Samples shared by consecutive windows
    pub overlap: usize,
    /// RMS level below which a frame counts as silence
    pub amplitude_threshold: f32,
    /// Largest normalized YIN dip accepted as a pitch
    pub clarity_threshold: f32,
    /// Delay between simulated pitch samples in milliseconds
    pub simulation_interval_ms: u64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            start_octave: 0,
            end_octave: 8,
            sample_rate: 44100,
            frame_size: 6000,
            overlap: 512,
            amplitude_threshold: 0.01,
            clarity_threshold: 0.15,
            simulation_interval_ms: 250,
        }
    }
}

impl TunerConfig {
    /// Checks the settings the audio pipeline depends on.
    ///
    /// An inverted octave range is allowed: it yields an empty reference
    /// table and every deviation is measured against 440 Hz.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            bail!("sample_rate must be positive");
        }
        if self.frame_size < MIN_FRAME_SIZE {
            bail!(
                "frame_size must be at least {MIN_FRAME_SIZE} samples, got {}",
                self.frame_size
            );
        }
        if self.overlap >= self.frame_size {
            bail!(
                "overlap ({}) must be smaller than frame_size ({})",
                self.overlap,
                self.frame_size
            );
        }
        if self.start_octave > self.end_octave {
            warn!(
                "Octave range {}..={} is empty; deviations will use the default reference",
                self.start_octave, self.end_octave
            );
        }
        Ok(())
    }

    /// Builds the reference table for the configured octave range.
    pub fn reference_table(&self) -> ReferenceTable {
        tuning::generate_reference_table(self.start_octave, self.end_octave)
    }

    /// Capture parameters for the microphone feed.
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            sample_rate: self.sample_rate,
            frame_size: self.frame_size,
            overlap: self.overlap,
        }
    }

    pub fn simulation_interval(&self) -> Duration {
        Duration::from_millis(self.simulation_interval_ms)
    }
}

/// Loads a configuration from a JSON file.
///
/// # Arguments
/// * `path` - File path to load the configuration from (e.g., "dialtune.json")
///
/// # Returns
/// * `Ok(TunerConfig)` - Parsed and validated configuration
/// * `Err(e)` - File I/O, JSON or validation error
pub fn load_config(path: impl AsRef<Path>) -> Result<TunerConfig> {
    let path = path.as_ref();
    let mut file =
        File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: TunerConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("dialtune-{}-{name}.json", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_match_reference_capture() {
        let config = TunerConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.frame_size, 6000);
        assert_eq!(config.overlap, 512);
        assert_eq!(config.reference_table().len(), 108);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = write_temp("partial", r#"{ "start_octave": 2, "end_octave": 5 }"#);
        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.start_octave, 2);
        assert_eq!(config.end_octave, 5);
        assert_eq!(config.frame_size, 6000);
        assert_eq!(config.reference_table().len(), 48);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let path = write_temp("overlap", r#"{ "frame_size": 1024, "overlap": 1024 }"#);
        let err = load_config(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn malformed_json_names_the_file() {
        let path = write_temp("malformed", "{ not json");
        let err = load_config(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config("/nonexistent/dialtune.json").is_err());
    }

    #[test]
    fn inverted_octaves_are_allowed() {
        let config = TunerConfig {
            start_octave: 6,
            end_octave: 2,
            ..TunerConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.reference_table().is_empty());
    }

    #[test]
    fn tiny_frames_are_rejected() {
        let config = TunerConfig {
            frame_size: 16,
            overlap: 0,
            ..TunerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
