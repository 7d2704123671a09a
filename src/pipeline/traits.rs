use std::path::Path;

use crate::error::LipSyncError;
use crate::types::{Granularity, RecognizedUnit};

/// Recognizes `transcript` in the audio and returns the units it could place,
/// in order, without overlaps. Units it cannot place are simply omitted.
pub trait SpeechAligner: Send + Sync {
    fn align(
        &self,
        audio: &Path,
        transcript: &str,
        granularity: Granularity,
        progress: &dyn ProgressListener,
    ) -> Result<Vec<RecognizedUnit>, LipSyncError>;
}

/// Maps every expected spelling to the index of its recognized counterpart.
/// The result has exactly `expected.len()` entries.
pub trait SequenceAligner: Send + Sync {
    fn align(
        &self,
        expected: &[String],
        recognized: &[String],
    ) -> Result<Vec<Option<usize>>, LipSyncError>;
}

/// First pronunciation variant of a written word.
pub trait Pronouncer: Send + Sync {
    fn pronounce(&self, word: &str) -> Result<Vec<String>, LipSyncError>;
}

/// Progress is reported in percent, `0.0..=100.0`.
pub trait ProgressListener: Send + Sync {
    fn on_start(&self) {}

    fn on_progress(&self, progress: f64);

    fn on_stop(&self) {}
}

pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn on_progress(&self, _progress: f64) {}
}
