use std::path::Path;

use crate::error::LipSyncError;

#[derive(Debug, Clone)]
pub struct LipSyncConfig {
    pub dictionary_path: String,
    /// Keyframe rate of the animation export.
    pub frame_rate: u32,
    pub correction: CorrectionConfig,
}

impl LipSyncConfig {
    pub const DEFAULT_FRAME_RATE: u32 = 100;
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            dictionary_path: String::new(),
            frame_rate: Self::DEFAULT_FRAME_RATE,
            correction: CorrectionConfig::default(),
        }
    }
}

/// Tuning of the correction stages.
///
/// The millisecond values encode the recognizer's frame resolution: every
/// synthesized duration is a multiple of `frame_ms`, consecutive phones are
/// kept `separation_ms` apart, and no phone is shorter than `min_phone_ms`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub frame_ms: i64,
    pub separation_ms: i64,
    pub min_phone_ms: i64,
    /// Largest stretch allowed, in per-phone standard deviations.
    pub max_positive_deviation: f64,
    /// Largest compression allowed, in per-phone standard deviations.
    pub max_negative_deviation: f64,
    /// Phones with at most this many samples borrow the global coefficient
    /// of variation for their deviation.
    pub low_sample_threshold: usize,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            frame_ms: 10,
            separation_ms: 10,
            min_phone_ms: 10,
            max_positive_deviation: 1.2,
            max_negative_deviation: 1.0,
            low_sample_threshold: 2,
        }
    }
}

impl CorrectionConfig {
    pub fn load(path: &Path) -> Result<Self, LipSyncError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| LipSyncError::io("read correction config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| LipSyncError::json("parse correction config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LipSyncError> {
        if self.frame_ms <= 0 {
            return Err(LipSyncError::invalid_input("frame_ms must be positive"));
        }
        if self.separation_ms < 0 || self.min_phone_ms <= 0 {
            return Err(LipSyncError::invalid_input(
                "separation_ms must be >= 0 and min_phone_ms > 0",
            ));
        }
        if !(self.max_positive_deviation >= 0.0 && self.max_negative_deviation >= 0.0) {
            return Err(LipSyncError::invalid_input(
                "deviation bounds must be non-negative",
            ));
        }
        Ok(())
    }

    /// Rounds a duration to the nearest frame, never below `min_phone_ms`.
    pub fn round_duration(&self, duration_ms: f64) -> i64 {
        self.round_to_frame(duration_ms).max(self.min_phone_ms)
    }

    pub fn round_to_frame(&self, duration_ms: f64) -> i64 {
        let frame = self.frame_ms as f64;
        ((duration_ms / frame).round() * frame) as i64
    }
}
