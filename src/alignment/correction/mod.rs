use serde::Serialize;

use crate::alignment::statistics::AlignmentStatistics;
use crate::alignment::timeline::AlignedTimeline;
use crate::config::CorrectionConfig;

mod boundaries;
mod gap_patch;
mod interpolation;
mod missing_words;
#[cfg(test)]
mod tests;

pub use boundaries::reconcile_word_boundaries;
pub use gap_patch::patch_incomplete_words;
pub use interpolation::GapRegime;
pub use missing_words::synthesize_missing_words;

/// Counters of one correction run, reported next to the event log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionSummary {
    pub gaps_patched: usize,
    pub words_reconciled: usize,
    pub words_synthesized: usize,
    pub ignored_words: usize,
    pub ignored_phones: usize,
}

/// Runs the three correction stages in their fixed order: gap patching,
/// boundary reconciliation, then missing-word synthesis.
pub fn run_corrections(
    timeline: &mut AlignedTimeline,
    stats: &AlignmentStatistics,
    config: &CorrectionConfig,
) -> CorrectionSummary {
    let gaps_patched = patch_incomplete_words(timeline, stats, config);
    tracing::info!(gaps_patched, "correction: incomplete words patched");

    let words_reconciled = reconcile_word_boundaries(timeline, config);
    tracing::info!(words_reconciled, "correction: word boundaries reconciled");

    let words_synthesized = synthesize_missing_words(timeline, stats, config);
    tracing::info!(words_synthesized, "correction: missing words synthesized");

    let summary = CorrectionSummary {
        gaps_patched,
        words_reconciled,
        words_synthesized,
        ignored_words: timeline.words.iter().filter(|w| w.ignored).count(),
        ignored_phones: timeline.phones.iter().filter(|p| p.ignored).count(),
    };
    tracing::info!(
        ignored_words = summary.ignored_words,
        ignored_phones = summary.ignored_phones,
        events = timeline.events().len(),
        "correction: done"
    );
    summary
}
