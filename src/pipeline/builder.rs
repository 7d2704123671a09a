use std::path::Path;

use crate::config::LipSyncConfig;
use crate::error::LipSyncError;
use crate::pipeline::defaults::{LcsSequenceAligner, LexiconDictionary};
use crate::pipeline::runtime::{LipSync, LipSyncParts};
use crate::pipeline::traits::{Pronouncer, SequenceAligner, SpeechAligner};

pub struct LipSyncBuilder {
    config: LipSyncConfig,
    speech_aligner: Option<Box<dyn SpeechAligner>>,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
    pronouncer: Option<Box<dyn Pronouncer>>,
}

impl LipSyncBuilder {
    pub fn new(config: LipSyncConfig) -> Self {
        Self {
            config,
            speech_aligner: None,
            sequence_aligner: None,
            pronouncer: None,
        }
    }

    pub fn with_speech_aligner(mut self, speech_aligner: Box<dyn SpeechAligner>) -> Self {
        self.speech_aligner = Some(speech_aligner);
        self
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    pub fn with_pronouncer(mut self, pronouncer: Box<dyn Pronouncer>) -> Self {
        self.pronouncer = Some(pronouncer);
        self
    }

    /// The speech aligner is required. Without an explicit pronouncer the
    /// lexicon at `dictionary_path` is loaded.
    pub fn build(self) -> Result<LipSync, LipSyncError> {
        self.config.correction.validate()?;
        if self.config.frame_rate == 0 {
            return Err(LipSyncError::invalid_input("frame_rate must be positive"));
        }
        let speech_aligner = self
            .speech_aligner
            .ok_or_else(|| LipSyncError::invalid_input("a speech aligner is required"))?;

        let pronouncer = match self.pronouncer {
            Some(pronouncer) => pronouncer,
            None => {
                if self.config.dictionary_path.is_empty() {
                    return Err(LipSyncError::invalid_input(
                        "dictionary_path is empty and no pronouncer was given",
                    ));
                }
                Box::new(LexiconDictionary::load(Path::new(
                    &self.config.dictionary_path,
                ))?)
            }
        };

        Ok(LipSync::from_parts(LipSyncParts {
            config: self.config,
            speech_aligner,
            sequence_aligner: self
                .sequence_aligner
                .unwrap_or_else(|| Box::new(LcsSequenceAligner)),
            pronouncer,
        }))
    }
}
