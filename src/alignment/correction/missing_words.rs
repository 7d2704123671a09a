use crate::alignment::correction::interpolation::GapEstimate;
use crate::alignment::statistics::AlignmentStatistics;
use crate::alignment::timeline::AlignedTimeline;
use crate::config::CorrectionConfig;
use crate::types::{CorrectionKind, CorrectionStage, Interval, UnitRef};

const STAGE: CorrectionStage = CorrectionStage::MissingWord;
const KIND: CorrectionKind = CorrectionKind::MissingWord;

/// Fabricates timing for words the recognizer never matched, from the
/// window between their placed neighbours. Returns the number of words that
/// received timing; the others are ignored.
pub fn synthesize_missing_words(
    timeline: &mut AlignedTimeline,
    stats: &AlignmentStatistics,
    config: &CorrectionConfig,
) -> usize {
    let mut synthesized = 0usize;
    for word in 0..timeline.words.len() {
        let unit = &timeline.words[word];
        if unit.matched || unit.ignored {
            continue;
        }

        let window_start = (0..word)
            .rev()
            .find_map(|w| timeline.words[w].interval())
            .map(|i| i.end_ms + config.separation_ms);
        let window_end = timeline.words[word + 1..]
            .iter()
            .find_map(|w| w.interval())
            .map(|i| i.start_ms);

        let Some(window_start) = window_start.filter(|&start| start > 0) else {
            drop_word(timeline, word, "no preceding word");
            continue;
        };
        if window_end.is_some_and(|end| window_start >= end) {
            drop_word(timeline, word, "window inverted");
            continue;
        }

        if fill_word(timeline, word, window_start, window_end, stats, config) {
            synthesized += 1;
        } else {
            drop_word(timeline, word, "no phone fits");
        }
    }
    synthesized
}

/// Lays the word's phones out from `window_start`. Returns whether at least
/// one phone was placed.
fn fill_word(
    timeline: &mut AlignedTimeline,
    word: usize,
    window_start: i64,
    window_end: Option<i64>,
    stats: &AlignmentStatistics,
    config: &CorrectionConfig,
) -> bool {
    let phones: Vec<usize> = timeline.phone_span(word).collect();
    if phones.is_empty() {
        return false;
    }
    let estimate = GapEstimate::new(
        phones.iter().map(|&p| timeline.phones[p].spelling.as_str()),
        stats,
        config,
    );
    let factor = estimate
        .factor(window_end.map(|end| end - window_start))
        .clamp(-config.max_negative_deviation, config.max_positive_deviation);
    let durations = estimate.durations(factor, config);
    tracing::debug!(
        word = timeline.words[word].spelling.as_str(),
        window_start,
        window_end = ?window_end,
        factor = format!("{factor:.3}"),
        "missing word: filling window"
    );

    let mut cursor = window_start;
    let mut placed: Option<Interval> = None;
    let mut overflowed = false;
    for (&p, &duration) in phones.iter().zip(&durations) {
        overflowed = overflowed || window_end.map_or(false, |end| cursor + duration > end);
        if overflowed {
            timeline.ignore(STAGE, UnitRef::Phone(p), KIND);
            continue;
        }
        let interval = Interval::new(cursor, cursor + duration);
        timeline.retime(STAGE, UnitRef::Phone(p), interval, KIND);
        placed = Some(match placed {
            Some(span) => Interval::new(span.start_ms, interval.end_ms),
            None => interval,
        });
        cursor = interval.end_ms + config.separation_ms;
    }

    let Some(span) = placed else {
        return false;
    };
    timeline.retime(STAGE, UnitRef::Word(word), span, KIND);
    true
}

fn drop_word(timeline: &mut AlignedTimeline, word: usize, reason: &str) {
    tracing::warn!(
        word = timeline.words[word].spelling.as_str(),
        reason,
        "missing word: cannot place, ignoring"
    );
    timeline.ignore(STAGE, UnitRef::Word(word), KIND);
    for p in timeline.phone_span(word) {
        if !timeline.phones[p].ignored {
            timeline.ignore(STAGE, UnitRef::Phone(p), KIND);
        }
    }
}
