use std::ops::Range;

use crate::alignment::correction::interpolation::{GapEstimate, GapRegime};
use crate::alignment::statistics::AlignmentStatistics;
use crate::alignment::timeline::AlignedTimeline;
use crate::config::CorrectionConfig;
use crate::types::{CorrectionKind, CorrectionStage, Interval, UnitRef};

const STAGE: CorrectionStage = CorrectionStage::GapPatch;

/// A run of unmatched phones inside a matched word and the window it must fit.
///
/// Phones are laid out in `[start_ms, end_ms - separation]`: `end_ms` is the
/// start of whatever follows, already including the separation after the
/// last phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Gap {
    pub phones: Range<usize>,
    pub start_ms: i64,
    pub end_ms: i64,
    /// The left bound comes from a recognized phone rather than the word.
    pub anchored_start: bool,
    /// The right bound comes from a recognized phone rather than the word.
    pub anchored_end: bool,
}

/// Re-times the unmatched phones of every matched word from the duration
/// model. Returns the number of gaps patched.
pub fn patch_incomplete_words(
    timeline: &mut AlignedTimeline,
    stats: &AlignmentStatistics,
    config: &CorrectionConfig,
) -> usize {
    let mut patched = 0usize;
    for word in 0..timeline.words.len() {
        let unit = &timeline.words[word];
        if !unit.matched {
            continue;
        }
        let Some(word_interval) = unit.interval() else {
            continue;
        };

        let gaps = find_gaps(timeline, word, word_interval, config);
        if gaps.is_empty() {
            continue;
        }
        tracing::debug!(
            word = timeline.words[word].spelling.as_str(),
            start_ms = word_interval.start_ms,
            end_ms = word_interval.end_ms,
            gaps = gaps.len(),
            "gap patch: incomplete word"
        );
        for gap in gaps {
            patch_gap(timeline, &gap, stats, config);
            patched += 1;
        }
    }
    patched
}

fn find_gaps(
    timeline: &AlignedTimeline,
    word: usize,
    word_interval: Interval,
    config: &CorrectionConfig,
) -> Vec<Gap> {
    let span = timeline.phone_span(word);
    let mut gaps = Vec::new();
    let mut run_start: Option<usize> = None;

    for p in span.clone() {
        let unmatched = !timeline.phones[p].matched;
        match (unmatched, run_start) {
            (true, None) => run_start = Some(p),
            (false, Some(start)) => {
                gaps.push(bound_gap(timeline, start..p, &span, word_interval, config));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        gaps.push(bound_gap(timeline, start..span.end, &span, word_interval, config));
    }
    gaps
}

fn bound_gap(
    timeline: &AlignedTimeline,
    phones: Range<usize>,
    span: &Range<usize>,
    word_interval: Interval,
    config: &CorrectionConfig,
) -> Gap {
    let sep = config.separation_ms;
    let anchor = |p: usize| {
        timeline
            .phones
            .get(p)
            .filter(|unit| unit.matched)
            .and_then(|unit| unit.interval())
    };

    let previous = phones.start.checked_sub(1).and_then(anchor);
    let (start_ms, anchored_start) = match previous {
        Some(prev) if phones.start > span.start => (prev.end_ms + sep, true),
        Some(prev) => (word_interval.start_ms.max(prev.end_ms + sep), true),
        None => (word_interval.start_ms, false),
    };

    let (end_ms, anchored_end) = match anchor(phones.end) {
        Some(next) if phones.end < span.end => (next.start_ms, true),
        Some(next) => ((word_interval.end_ms + sep).min(next.start_ms), true),
        None => (word_interval.end_ms + sep, false),
    };

    Gap {
        phones,
        start_ms,
        end_ms,
        anchored_start,
        anchored_end,
    }
}

/// Fits the phones of `gap` into its window and tags them with the regime.
pub(crate) fn patch_gap(
    timeline: &mut AlignedTimeline,
    gap: &Gap,
    stats: &AlignmentStatistics,
    config: &CorrectionConfig,
) -> GapRegime {
    let phones: Vec<usize> = gap.phones.clone().collect();
    let estimate = GapEstimate::new(
        phones.iter().map(|&p| timeline.phones[p].spelling.as_str()),
        stats,
        config,
    );
    let window_ms = gap.end_ms - gap.start_ms;
    let factor = estimate.factor(Some(window_ms));
    let regime = GapRegime::classify(factor, config);
    let kind = regime.kind();
    tracing::debug!(
        first_phone = gap.phones.start,
        phone_count = phones.len(),
        start_ms = gap.start_ms,
        end_ms = gap.end_ms,
        anchored_start = gap.anchored_start,
        anchored_end = gap.anchored_end,
        factor = format!("{factor:.3}"),
        regime = ?regime,
        "gap patch: fitting gap"
    );

    match regime {
        GapRegime::Normal => {
            let durations = estimate.durations(factor, config);
            place_forward(timeline, &phones, &durations, gap.start_ms, gap.end_ms, kind, config);
        }
        GapRegime::TooBig => {
            let stretch = config.max_positive_deviation;
            let durations = estimate.durations(stretch, config);
            let block = estimate.block_length(stretch, config);
            // Rounding can make the block a few ms longer than the window.
            let (start_ms, end_ms) = match (gap.anchored_start, gap.anchored_end) {
                (true, false) => (gap.start_ms, (gap.start_ms + block).min(gap.end_ms)),
                (false, true) => ((gap.end_ms - block).max(gap.start_ms), gap.end_ms),
                _ => {
                    let padding = config
                        .round_to_frame((window_ms - block) as f64 / 2.0)
                        .max(0);
                    let start_ms = gap.start_ms + padding;
                    (start_ms, (start_ms + block).min(gap.end_ms))
                }
            };
            place_forward(timeline, &phones, &durations, start_ms, end_ms, kind, config);
        }
        GapRegime::TooSmall => {
            let compress = -config.max_negative_deviation;
            let durations = estimate.durations(compress, config);
            let drop_from_start = gap.anchored_end && !gap.anchored_start;
            let keep = select_kept(&durations, window_ms, drop_from_start, config);

            let mut kept_phones = Vec::with_capacity(phones.len());
            let mut kept_durations = Vec::with_capacity(phones.len());
            for ((&p, &d), &kept) in phones.iter().zip(&durations).zip(&keep) {
                if kept {
                    kept_phones.push(p);
                    kept_durations.push(d);
                } else {
                    timeline.ignore(STAGE, UnitRef::Phone(p), kind);
                }
            }
            if drop_from_start {
                place_backward(
                    timeline,
                    &kept_phones,
                    &kept_durations,
                    gap.start_ms,
                    gap.end_ms,
                    kind,
                    config,
                );
            } else {
                place_forward(
                    timeline,
                    &kept_phones,
                    &kept_durations,
                    gap.start_ms,
                    gap.end_ms,
                    kind,
                    config,
                );
            }
        }
    }
    regime
}

/// Drops phones from one end until the rest fits `window_ms`.
fn select_kept(
    durations: &[i64],
    window_ms: i64,
    drop_from_start: bool,
    config: &CorrectionConfig,
) -> Vec<bool> {
    let sep = config.separation_ms;
    let mut keep = vec![true; durations.len()];
    let mut total: i64 = durations.iter().map(|d| d + sep).sum();
    let order: Vec<usize> = if drop_from_start {
        (0..durations.len()).collect()
    } else {
        (0..durations.len()).rev().collect()
    };
    for i in order {
        if total <= window_ms {
            break;
        }
        total -= durations[i] + sep;
        keep[i] = false;
    }
    keep
}

/// Lays phones out left to right from `start_ms`, never past `end_ms - sep`.
/// A phone that no longer fits its floor is ignored.
fn place_forward(
    timeline: &mut AlignedTimeline,
    phones: &[usize],
    durations: &[i64],
    start_ms: i64,
    end_ms: i64,
    kind: CorrectionKind,
    config: &CorrectionConfig,
) {
    let limit = end_ms - config.separation_ms;
    let mut cursor = start_ms;
    for (&p, &duration) in phones.iter().zip(durations) {
        let duration = duration.min(limit - cursor);
        if duration < config.min_phone_ms {
            timeline.ignore(STAGE, UnitRef::Phone(p), kind);
            continue;
        }
        timeline.retime(
            STAGE,
            UnitRef::Phone(p),
            Interval::new(cursor, cursor + duration),
            kind,
        );
        cursor += duration + config.separation_ms;
    }
}

/// Lays phones out right to left ending at `end_ms - sep`, never before
/// `start_ms`.
fn place_backward(
    timeline: &mut AlignedTimeline,
    phones: &[usize],
    durations: &[i64],
    start_ms: i64,
    end_ms: i64,
    kind: CorrectionKind,
    config: &CorrectionConfig,
) {
    let mut cursor = end_ms - config.separation_ms;
    for (&p, &duration) in phones.iter().zip(durations).rev() {
        let duration = duration.min(cursor - start_ms);
        if duration < config.min_phone_ms {
            timeline.ignore(STAGE, UnitRef::Phone(p), kind);
            continue;
        }
        timeline.retime(
            STAGE,
            UnitRef::Phone(p),
            Interval::new(cursor - duration, cursor),
            kind,
        );
        cursor -= duration + config.separation_ms;
    }
}
