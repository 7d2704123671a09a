use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::alignment::lcs::align_lcs;
use crate::error::LipSyncError;
use crate::pipeline::traits::{Pronouncer, ProgressListener, SequenceAligner, SpeechAligner};
use crate::types::{Granularity, RecognizedUnit};

pub struct LcsSequenceAligner;

impl SequenceAligner for LcsSequenceAligner {
    fn align(
        &self,
        expected: &[String],
        recognized: &[String],
    ) -> Result<Vec<Option<usize>>, LipSyncError> {
        Ok(align_lcs(expected, recognized))
    }
}

/// Pronunciation lexicon in CMU-Sphinx layout: one `word PH PH ...` entry
/// per line. Variants written `word(2)` are skipped so the first
/// pronunciation wins. Lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct LexiconDictionary {
    entries: HashMap<String, Vec<String>>,
}

impl LexiconDictionary {
    pub fn load(path: &Path) -> Result<Self, LipSyncError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| LipSyncError::io("read lexicon", e))?;
        let dictionary = Self::parse(&data);
        tracing::info!(
            path = %path.display(),
            entries = dictionary.len(),
            "lexicon: loaded"
        );
        Ok(dictionary)
    }

    pub fn parse(data: &str) -> Self {
        let mut entries = HashMap::new();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            if word.ends_with(')') && word.contains('(') {
                continue;
            }
            let phones: Vec<String> = fields.map(str::to_string).collect();
            if phones.is_empty() {
                continue;
            }
            entries.entry(word.to_lowercase()).or_insert(phones);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Pronouncer for LexiconDictionary {
    fn pronounce(&self, word: &str) -> Result<Vec<String>, LipSyncError> {
        self.entries
            .get(&word.to_lowercase())
            .cloned()
            .ok_or_else(|| LipSyncError::MissingPronunciation {
                word: word.to_string(),
            })
    }
}

/// Replays a recognition captured earlier, one list per granularity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordedAligner {
    #[serde(default)]
    pub words: Vec<RecognizedUnit>,
    #[serde(default)]
    pub phones: Vec<RecognizedUnit>,
}

impl RecordedAligner {
    pub fn new(words: Vec<RecognizedUnit>, phones: Vec<RecognizedUnit>) -> Self {
        Self { words, phones }
    }

    pub fn load(path: &Path) -> Result<Self, LipSyncError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| LipSyncError::io("read recorded recognition", e))?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, LipSyncError> {
        serde_json::from_str(data).map_err(|e| LipSyncError::json("parse recorded recognition", e))
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, LipSyncError> {
        serde_json::from_value(value)
            .map_err(|e| LipSyncError::json("parse recorded recognition", e))
    }
}

impl SpeechAligner for RecordedAligner {
    fn align(
        &self,
        _audio: &Path,
        _transcript: &str,
        granularity: Granularity,
        progress: &dyn ProgressListener,
    ) -> Result<Vec<RecognizedUnit>, LipSyncError> {
        progress.on_progress(0.0);
        let units = match granularity {
            Granularity::Word => self.words.clone(),
            Granularity::Phone => self.phones.clone(),
        };
        if let Some(pair) = units.windows(2).find(|pair| pair[0].end_ms > pair[1].start_ms) {
            return Err(LipSyncError::collaborator(
                "recorded aligner",
                format!(
                    "{:?} units overlap: '{}' ends at {} after '{}' starts at {}",
                    granularity,
                    pair[0].spelling,
                    pair[0].end_ms,
                    pair[1].spelling,
                    pair[1].start_ms
                ),
            ));
        }
        progress.on_progress(1.0);
        Ok(units)
    }
}
