use std::path::{Path, PathBuf};

use crate::alignment::correction::{run_corrections, CorrectionSummary};
use crate::alignment::merge::{merge_recognition, MergeOutcome};
use crate::alignment::report::{compute_report, Meta, Report};
use crate::alignment::statistics::AlignmentStatistics;
use crate::alignment::timeline::AlignedTimeline;
use crate::alignment::transcript::{Transcript, WordPhoneIndex};
use crate::config::LipSyncConfig;
use crate::error::LipSyncError;
use crate::export::PapagayoDocument;
use crate::pipeline::progress::PartialProgress;
use crate::pipeline::traits::{Pronouncer, ProgressListener, SequenceAligner, SpeechAligner};
use crate::types::{CorrectionEvent, Granularity, RecognizedUnit, Unit};

/// Share of the progress range spent in the word pass.
const WORD_PASS_PERCENT: f64 = 30.0;

pub struct LipSync {
    config: LipSyncConfig,
    speech_aligner: Box<dyn SpeechAligner>,
    sequence_aligner: Box<dyn SequenceAligner>,
    pronouncer: Box<dyn Pronouncer>,
}

pub(crate) struct LipSyncParts {
    pub config: LipSyncConfig,
    pub speech_aligner: Box<dyn SpeechAligner>,
    pub sequence_aligner: Box<dyn SequenceAligner>,
    pub pronouncer: Box<dyn Pronouncer>,
}

/// What one merge pass matched and what it dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeDiagnostics {
    pub matched: usize,
    pub unmatched: usize,
    pub discarded: Vec<RecognizedUnit>,
}

impl From<&MergeOutcome> for MergeDiagnostics {
    fn from(outcome: &MergeOutcome) -> Self {
        Self {
            matched: outcome.matched_count(),
            unmatched: outcome.unmatched_count(),
            discarded: outcome.discarded.clone(),
        }
    }
}

/// Corrected timeline of one run and everything needed to report on it.
#[derive(Debug, Clone)]
pub struct LipSyncResult {
    pub audio: PathBuf,
    pub frame_rate: u32,
    pub transcript: Transcript,
    pub words: Vec<Unit>,
    pub phones: Vec<Unit>,
    pub index: WordPhoneIndex,
    pub statistics: AlignmentStatistics,
    pub word_merge: MergeDiagnostics,
    pub phone_merge: MergeDiagnostics,
    pub corrections: CorrectionSummary,
    pub events: Vec<CorrectionEvent>,
}

impl LipSyncResult {
    /// Placed phones of `word`, in order.
    pub fn word_phones(&self, word: usize) -> impl Iterator<Item = &Unit> + '_ {
        self.phones[self.index.span(word)]
            .iter()
            .filter(|phone| phone.is_placed())
    }

    pub fn report(&self, generated_at: String, generator: &str) -> Result<Report, LipSyncError> {
        let meta = Meta {
            generated_at,
            generator: generator.to_string(),
            audio: self.audio.display().to_string(),
            frame_rate: self.frame_rate,
        };
        compute_report(
            meta,
            &self.words,
            &self.phones,
            &self.index,
            self.statistics.summary(),
            self.corrections,
            &self.events,
        )
    }

    pub fn to_papagayo(&self) -> Result<PapagayoDocument, LipSyncError> {
        PapagayoDocument::from_timeline(
            &self.audio.display().to_string(),
            self.frame_rate,
            &self.words,
            &self.phones,
            &self.index,
        )
    }
}

impl LipSync {
    pub(crate) fn from_parts(parts: LipSyncParts) -> Self {
        Self {
            config: parts.config,
            speech_aligner: parts.speech_aligner,
            sequence_aligner: parts.sequence_aligner,
            pronouncer: parts.pronouncer,
        }
    }

    pub fn config(&self) -> &LipSyncConfig {
        &self.config
    }

    /// Aligns `transcript_text` against `audio` at word then phone level and
    /// runs the correction stages on the merged timeline.
    pub fn sync(
        &self,
        audio: &Path,
        transcript_text: &str,
        progress: &dyn ProgressListener,
    ) -> Result<LipSyncResult, LipSyncError> {
        progress.on_start();
        let result = self.run(audio, transcript_text, progress);
        progress.on_stop();
        result
    }

    fn run(
        &self,
        audio: &Path,
        transcript_text: &str,
        progress: &dyn ProgressListener,
    ) -> Result<LipSyncResult, LipSyncError> {
        let correction = &self.config.correction;
        let mut transcript = Transcript::from_text(transcript_text, self.pronouncer.as_ref())?;
        tracing::info!(
            audio = %audio.display(),
            words = transcript.len(),
            "lipsync: transcript loaded"
        );

        let word_outcome = if transcript.is_empty() {
            MergeOutcome::default()
        } else {
            let word_progress = PartialProgress::new(progress, 0.0, WORD_PASS_PERCENT);
            self.recognize(
                audio,
                Granularity::Word,
                &transcript.to_word_string(),
                &transcript.spellings(),
                &word_progress,
            )?
        };
        if !transcript.is_empty() {
            let updated =
                transcript.update_pronunciations(&word_outcome.units, &word_outcome.pronunciations)?;
            tracing::debug!(updated, "lipsync: pronunciations updated from word pass");
        }

        let index = transcript.word_phone_index();
        let expected_phones = transcript.phone_spellings();
        let phone_outcome = if expected_phones.is_empty() {
            MergeOutcome::default()
        } else {
            let phone_progress = PartialProgress::new(progress, WORD_PASS_PERCENT, 100.0);
            self.recognize(
                audio,
                Granularity::Phone,
                &transcript.to_phone_string(),
                &expected_phones,
                &phone_progress,
            )?
        };

        let statistics = AlignmentStatistics::from_phones(
            &phone_outcome.units,
            phone_outcome.discarded.len(),
            correction.low_sample_threshold,
        );
        let word_merge = MergeDiagnostics::from(&word_outcome);
        let phone_merge = MergeDiagnostics::from(&phone_outcome);

        let mut timeline = AlignedTimeline::new(word_outcome.units, phone_outcome.units, index)?;
        let corrections = run_corrections(&mut timeline, &statistics, correction);
        let (words, phones, index, events) = timeline.into_parts();

        tracing::info!(
            words = words.len(),
            phones = phones.len(),
            ignored_words = corrections.ignored_words,
            ignored_phones = corrections.ignored_phones,
            "lipsync: run complete"
        );
        Ok(LipSyncResult {
            audio: audio.to_path_buf(),
            frame_rate: self.config.frame_rate,
            transcript,
            words,
            phones,
            index,
            statistics,
            word_merge,
            phone_merge,
            corrections,
            events,
        })
    }

    /// One recognition pass: speech aligner, sequence aligner, merge.
    fn recognize(
        &self,
        audio: &Path,
        granularity: Granularity,
        text: &str,
        expected: &[String],
        progress: &dyn ProgressListener,
    ) -> Result<MergeOutcome, LipSyncError> {
        let recognized = self
            .speech_aligner
            .align(audio, text, granularity, progress)?;
        let recognized_spellings: Vec<String> =
            recognized.iter().map(|unit| unit.spelling.clone()).collect();
        let mapping = self
            .sequence_aligner
            .align(expected, &recognized_spellings)?;
        let outcome = merge_recognition(granularity, expected, &recognized, &mapping)?;
        if !outcome.discarded.is_empty() {
            tracing::warn!(
                ?granularity,
                discarded = outcome.discarded.len(),
                "lipsync: recognizer insertions dropped"
            );
        }
        Ok(outcome)
    }
}
