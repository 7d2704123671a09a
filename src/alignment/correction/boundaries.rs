use crate::alignment::timeline::AlignedTimeline;
use crate::config::CorrectionConfig;
use crate::types::{CorrectionKind, CorrectionStage, Interval, UnitRef};

const STAGE: CorrectionStage = CorrectionStage::BoundaryReconcile;

/// Arbitrates between each matched word's own interval and the span of its
/// placed phones. Returns the number of words whose timing changed.
pub fn reconcile_word_boundaries(timeline: &mut AlignedTimeline, config: &CorrectionConfig) -> usize {
    let mut changed = 0usize;
    for word in 0..timeline.words.len() {
        if !timeline.words[word].matched {
            continue;
        }
        let Some(before) = timeline.words[word].interval() else {
            continue;
        };
        if timeline.placed_phone_bounds(word).is_none() {
            continue;
        }

        reconcile_start(timeline, word, config);
        if timeline.placed_phone_bounds(word).is_none() {
            tracing::debug!(
                word = timeline.words[word].spelling.as_str(),
                start_ms = before.start_ms,
                end_ms = before.end_ms,
                "boundaries: every phone ignored, word keeps its timing"
            );
        }
        reconcile_end(timeline, word, config);

        let after = timeline.words[word].interval();
        if let Some(interval) = after {
            if interval.start_ms >= interval.end_ms {
                tracing::warn!(
                    word = timeline.words[word].spelling.as_str(),
                    start_ms = interval.start_ms,
                    end_ms = interval.end_ms,
                    "boundaries: word collapsed, ignoring"
                );
                timeline.ignore(STAGE, UnitRef::Word(word), CorrectionKind::MoveEnd);
            }
        }
        if timeline.words[word].interval() != Some(before) {
            changed += 1;
        }
    }
    changed
}

/// End of the previous word, `Some(0)` for the first word, `None` when the
/// previous word has no usable timing.
fn previous_end(timeline: &AlignedTimeline, word: usize) -> Option<i64> {
    match word.checked_sub(1) {
        None => Some(0),
        Some(prev) => timeline.words[prev].interval().map(|i| i.end_ms),
    }
}

/// Start of the next word, `Some(i64::MAX)` for the last word.
fn next_start(timeline: &AlignedTimeline, word: usize) -> Option<i64> {
    match timeline.words.get(word + 1) {
        None => Some(i64::MAX),
        Some(next) => next.interval().map(|i| i.start_ms),
    }
}

fn reconcile_start(timeline: &mut AlignedTimeline, word: usize, config: &CorrectionConfig) {
    let sep = config.separation_ms;
    let (Some(word_interval), Some((first, _))) =
        (timeline.words[word].interval(), timeline.placed_phone_bounds(word))
    else {
        return;
    };
    let Some(phone_start) = timeline.phones[first].interval().map(|i| i.start_ms) else {
        return;
    };
    let mut word_start = word_interval.start_ms;

    if phone_start > word_start {
        let moved = Interval::new(phone_start, word_interval.end_ms);
        timeline.retime(STAGE, UnitRef::Word(word), moved, CorrectionKind::MoveStart);
        return;
    }
    if phone_start == word_start {
        return;
    }

    if let Some(prev_end) = previous_end(timeline, word) {
        let expanded = (prev_end + sep).max(phone_start);
        if prev_end + sep <= word_start && expanded < word_start {
            word_start = expanded;
            let moved = Interval::new(word_start, word_interval.end_ms);
            timeline.retime(STAGE, UnitRef::Word(word), moved, CorrectionKind::MoveStart);
        }
    }
    if word_start <= phone_start {
        return;
    }

    for p in timeline.phone_span(word) {
        let Some(interval) = timeline.phones[p].interval() else {
            timeline.tag(STAGE, UnitRef::Phone(p), CorrectionKind::ShrinkToStart);
            continue;
        };
        if interval.start_ms >= word_start {
            break;
        }
        if interval.end_ms - word_start >= config.min_phone_ms {
            let shrunk = Interval::new(word_start, interval.end_ms);
            timeline.retime(STAGE, UnitRef::Phone(p), shrunk, CorrectionKind::ShrinkToStart);
            break;
        }
        timeline.ignore(STAGE, UnitRef::Phone(p), CorrectionKind::ShrinkToStart);
    }
}

fn reconcile_end(timeline: &mut AlignedTimeline, word: usize, config: &CorrectionConfig) {
    let sep = config.separation_ms;
    let (Some(word_interval), Some((_, last))) =
        (timeline.words[word].interval(), timeline.placed_phone_bounds(word))
    else {
        return;
    };
    let Some(phone_end) = timeline.phones[last].interval().map(|i| i.end_ms) else {
        return;
    };
    let mut word_end = word_interval.end_ms;

    if phone_end < word_end {
        let moved = Interval::new(word_interval.start_ms, phone_end);
        timeline.retime(STAGE, UnitRef::Word(word), moved, CorrectionKind::MoveEnd);
        return;
    }
    if phone_end == word_end {
        return;
    }

    if let Some(next_start) = next_start(timeline, word) {
        let expanded = next_start.saturating_sub(sep).min(phone_end);
        if word_end.saturating_add(sep) <= next_start && expanded > word_end {
            word_end = expanded;
            let moved = Interval::new(word_interval.start_ms, word_end);
            timeline.retime(STAGE, UnitRef::Word(word), moved, CorrectionKind::MoveEnd);
        }
    }
    if word_end >= phone_end {
        return;
    }

    for p in timeline.phone_span(word).rev() {
        let Some(interval) = timeline.phones[p].interval() else {
            timeline.tag(STAGE, UnitRef::Phone(p), CorrectionKind::ShrinkToEnd);
            continue;
        };
        if interval.end_ms <= word_end {
            break;
        }
        if word_end - interval.start_ms >= config.min_phone_ms {
            let shrunk = Interval::new(interval.start_ms, word_end);
            timeline.retime(STAGE, UnitRef::Phone(p), shrunk, CorrectionKind::ShrinkToEnd);
            break;
        }
        timeline.ignore(STAGE, UnitRef::Phone(p), CorrectionKind::ShrinkToEnd);
    }
}
