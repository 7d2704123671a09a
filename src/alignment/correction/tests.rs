use super::{
    patch_incomplete_words, reconcile_word_boundaries, run_corrections, synthesize_missing_words,
};
use crate::alignment::statistics::AlignmentStatistics;
use crate::alignment::timeline::AlignedTimeline;
use crate::alignment::transcript::WordPhoneIndex;
use crate::config::CorrectionConfig;
use crate::types::{CorrectionAction, CorrectionKind, Interval, Unit, UnitRef};

type PhoneSpec<'a> = (&'a str, Option<(i64, i64)>);

#[derive(Default)]
struct TimelineBuilder {
    words: Vec<Unit>,
    phones: Vec<Unit>,
    lengths: Vec<usize>,
}

impl TimelineBuilder {
    fn word(mut self, spelling: &str, timing: Option<(i64, i64)>, phones: &[PhoneSpec]) -> Self {
        self.words.push(make_unit(spelling, timing));
        self.phones
            .extend(phones.iter().map(|&(spelling, timing)| make_unit(spelling, timing)));
        self.lengths.push(phones.len());
        self
    }

    fn build(self) -> AlignedTimeline {
        AlignedTimeline::new(self.words, self.phones, WordPhoneIndex::from_lengths(self.lengths))
            .unwrap()
    }
}

fn make_unit(spelling: &str, timing: Option<(i64, i64)>) -> Unit {
    match timing {
        Some((start, end)) => Unit::matched(spelling, Interval::new(start, end)),
        None => Unit::unmatched(spelling),
    }
}

fn stats_of(timeline: &AlignedTimeline, config: &CorrectionConfig) -> AlignmentStatistics {
    AlignmentStatistics::from_phones(&timeline.phones, 0, config.low_sample_threshold)
}

fn at(start: i64, end: i64) -> Option<Interval> {
    Some(Interval::new(start, end))
}

/// Placed units are non-empty, placed phones of a word do not overlap and
/// stay inside their placed word.
fn assert_well_formed(timeline: &AlignedTimeline) {
    for (w, word) in timeline.words.iter().enumerate() {
        let Some(word_interval) = word.interval() else {
            continue;
        };
        assert!(word_interval.start_ms < word_interval.end_ms, "word {word}");
        let placed: Vec<Interval> = timeline
            .phone_span(w)
            .filter_map(|p| timeline.phones[p].interval())
            .collect();
        for phone in &placed {
            assert!(phone.start_ms < phone.end_ms, "phone {phone} of {word}");
            assert!(word_interval.contains(phone), "phone {phone} outside {word}");
        }
        for pair in placed.windows(2) {
            assert!(pair[0].end_ms <= pair[1].start_ms, "overlap in {word}");
        }
    }
}

// gap patching

#[test]
fn internal_gap_is_patched_without_touching_anchors() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "abcd",
            Some((500, 600)),
            &[
                ("aa", Some((500, 550))),
                ("bb", Some((550, 560))),
                ("dd", None),
                ("cc", Some((590, 600))),
            ],
        )
        .build();
    let stats = stats_of(&timeline, &config);

    assert_eq!(patch_incomplete_words(&mut timeline, &stats, &config), 1);
    assert_eq!(timeline.phones[2].interval(), at(570, 580));
    assert_eq!(timeline.phones[2].corrections, [CorrectionKind::GapNormal]);
    assert_eq!(timeline.phones[0].interval(), at(500, 550));
    assert_eq!(timeline.phones[1].interval(), at(550, 560));
    assert_eq!(timeline.phones[3].interval(), at(590, 600));
    assert!(timeline.phones[1].corrections.is_empty());
    assert!(timeline.phones[3].corrections.is_empty());
}

#[test]
fn too_big_gap_anchored_left_is_flush_left() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "w",
            Some((0, 400)),
            &[
                ("aa", Some((0, 40))),
                ("aa", Some((50, 90))),
                ("aa", Some((100, 140))),
                ("aa", None),
            ],
        )
        .build();
    let stats = stats_of(&timeline, &config);

    patch_incomplete_words(&mut timeline, &stats, &config);
    assert_eq!(timeline.phones[3].interval(), at(150, 190));
    assert_eq!(timeline.phones[3].corrections, [CorrectionKind::GapTooBig]);
}

#[test]
fn too_big_gap_anchored_right_is_flush_right() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "w",
            Some((0, 400)),
            &[
                ("aa", None),
                ("aa", Some((260, 300))),
                ("aa", Some((310, 350))),
                ("aa", Some((360, 400))),
            ],
        )
        .build();
    let stats = stats_of(&timeline, &config);

    patch_incomplete_words(&mut timeline, &stats, &config);
    assert_eq!(timeline.phones[0].interval(), at(210, 250));
}

#[test]
fn too_big_gap_anchored_both_sides_is_centered() {
    let config = CorrectionConfig::default();
    // The gap ends the first word; the next word's first phone anchors it.
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 300)), &[("aa", Some((0, 40))), ("aa", None)])
        .word(
            "v",
            Some((400, 530)),
            &[("aa", Some((400, 440))), ("aa", Some((450, 490)))],
        )
        .build();
    let stats = stats_of(&timeline, &config);

    patch_incomplete_words(&mut timeline, &stats, &config);
    // window [50, 310), block 50, padding rounded to 110
    assert_eq!(timeline.phones[1].interval(), at(160, 200));
}

#[test]
fn too_small_gap_drops_trailing_phones_when_both_anchored() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "w",
            Some((0, 200)),
            &[
                ("aa", Some((0, 40))),
                ("aa", None),
                ("aa", None),
                ("aa", None),
                ("aa", Some((100, 140))),
                ("aa", Some((150, 190))),
            ],
        )
        .build();
    let stats = stats_of(&timeline, &config);

    patch_incomplete_words(&mut timeline, &stats, &config);
    assert_eq!(timeline.phones[1].interval(), at(50, 90));
    assert!(timeline.phones[2].ignored);
    assert!(timeline.phones[3].ignored);
    for p in 1..4 {
        assert_eq!(timeline.phones[p].corrections, [CorrectionKind::GapTooSmall]);
    }
}

#[test]
fn too_small_gap_drops_leading_phones_when_only_right_anchored() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "w",
            Some((0, 200)),
            &[
                ("aa", None),
                ("aa", None),
                ("aa", None),
                ("aa", Some((60, 100))),
                ("aa", Some((110, 150))),
                ("aa", Some((160, 200))),
            ],
        )
        .build();
    let stats = stats_of(&timeline, &config);

    patch_incomplete_words(&mut timeline, &stats, &config);
    assert!(timeline.phones[0].ignored);
    assert!(timeline.phones[1].ignored);
    assert_eq!(timeline.phones[2].interval(), at(10, 50));
    assert_well_formed(&timeline);
}

#[test]
fn unmatched_words_are_not_gap_patched() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 100)), &[("aa", Some((0, 100)))])
        .word("v", None, &[("aa", None)])
        .build();
    let stats = stats_of(&timeline, &config);

    assert_eq!(patch_incomplete_words(&mut timeline, &stats, &config), 0);
    assert!(timeline.events().is_empty());
}

// boundary reconciliation

#[test]
fn word_start_moves_to_later_first_phone() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "w",
            Some((0, 200)),
            &[("aa", Some((50, 100))), ("bb", Some((110, 200)))],
        )
        .build();

    assert_eq!(reconcile_word_boundaries(&mut timeline, &config), 1);
    assert_eq!(timeline.words[0].interval(), at(50, 200));
    assert_eq!(timeline.words[0].corrections, [CorrectionKind::MoveStart]);
}

#[test]
fn word_expands_backward_into_free_space() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 100)), &[("aa", Some((0, 100)))])
        .word(
            "v",
            Some((200, 300)),
            &[("bb", Some((150, 220))), ("cc", Some((230, 300)))],
        )
        .build();

    reconcile_word_boundaries(&mut timeline, &config);
    assert_eq!(timeline.words[1].interval(), at(150, 300));
    assert_eq!(timeline.words[1].corrections, [CorrectionKind::MoveStart]);
    assert_eq!(timeline.phones[1].interval(), at(150, 220));
    assert!(timeline.phones[1].corrections.is_empty());
}

#[test]
fn leading_phone_shrinks_when_neighbour_blocks_expansion() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 195)), &[("aa", Some((0, 195)))])
        .word(
            "v",
            Some((200, 300)),
            &[("bb", Some((150, 220))), ("cc", Some((230, 300)))],
        )
        .build();

    reconcile_word_boundaries(&mut timeline, &config);
    assert_eq!(timeline.words[1].interval(), at(200, 300));
    assert_eq!(timeline.phones[1].interval(), at(200, 220));
    assert_eq!(timeline.phones[1].corrections, [CorrectionKind::ShrinkToStart]);
    assert_well_formed(&timeline);
}

#[test]
fn leading_phone_too_short_after_shrink_is_ignored() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 195)), &[("aa", Some((0, 195)))])
        .word(
            "v",
            Some((200, 300)),
            &[("bb", Some((150, 205))), ("cc", Some((215, 300)))],
        )
        .build();

    reconcile_word_boundaries(&mut timeline, &config);
    assert!(timeline.phones[1].ignored);
    assert_eq!(timeline.phones[1].corrections, [CorrectionKind::ShrinkToStart]);
    assert_eq!(timeline.phones[2].interval(), at(215, 300));
    assert!(timeline.phones[2].corrections.is_empty());
}

#[test]
fn ignored_leading_phone_is_tagged_by_the_shrink_walk() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("x", Some((0, 95)), &[("xx", Some((0, 95)))])
        .word(
            "ab",
            Some((100, 300)),
            &[("aa", None), ("bb", Some((60, 200))), ("cc", Some((210, 300)))],
        )
        .build();
    timeline.phones[1].ignored = true;

    reconcile_word_boundaries(&mut timeline, &config);
    assert!(timeline.phones[1].ignored);
    assert_eq!(timeline.phones[1].corrections, [CorrectionKind::ShrinkToStart]);
    assert_eq!(timeline.phones[2].interval(), at(100, 200));
    assert_eq!(timeline.phones[2].corrections, [CorrectionKind::ShrinkToStart]);
    assert!(timeline.events().iter().any(|event| {
        event.unit == UnitRef::Phone(1) && event.action == CorrectionAction::Tagged
    }));
    assert_well_formed(&timeline);
}

#[test]
fn ignored_trailing_phone_is_tagged_by_the_shrink_walk() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "ab",
            Some((0, 200)),
            &[("aa", Some((0, 100))), ("bb", Some((110, 240))), ("cc", None)],
        )
        .word("y", Some((205, 300)), &[("yy", Some((205, 300)))])
        .build();
    timeline.phones[2].ignored = true;

    reconcile_word_boundaries(&mut timeline, &config);
    assert_eq!(timeline.phones[2].corrections, [CorrectionKind::ShrinkToEnd]);
    assert_eq!(timeline.phones[1].interval(), at(110, 200));
    assert_eq!(timeline.phones[1].corrections, [CorrectionKind::ShrinkToEnd]);
    assert_eq!(timeline.words[0].interval(), at(0, 200));
    assert_well_formed(&timeline);
}

#[test]
fn word_end_expands_forward_up_to_next_word() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 100)), &[("aa", Some((0, 150)))])
        .word("v", Some((200, 300)), &[("bb", Some((200, 300)))])
        .build();

    reconcile_word_boundaries(&mut timeline, &config);
    assert_eq!(timeline.words[0].interval(), at(0, 150));
    assert_eq!(timeline.words[0].corrections, [CorrectionKind::MoveEnd]);
}

#[test]
fn trailing_phone_shrinks_when_next_word_is_close() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "w",
            Some((0, 100)),
            &[("aa", Some((0, 60))), ("bb", Some((70, 130)))],
        )
        .word("v", Some((105, 200)), &[("cc", Some((105, 200)))])
        .build();

    reconcile_word_boundaries(&mut timeline, &config);
    assert_eq!(timeline.words[0].interval(), at(0, 100));
    assert_eq!(timeline.phones[1].interval(), at(70, 100));
    assert_eq!(timeline.phones[1].corrections, [CorrectionKind::ShrinkToEnd]);
}

#[test]
fn unmatched_words_are_left_to_synthesis() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", None, &[("aa", Some((0, 100)))])
        .build();

    assert_eq!(reconcile_word_boundaries(&mut timeline, &config), 0);
    assert_eq!(timeline.words[0].interval(), None);
}

// missing-word synthesis

#[test]
fn word_without_left_evidence_is_ignored_and_trailing_word_synthesized() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("a", None, &[("aa", None)])
        .word("b", Some((100, 200)), &[("bb", Some((100, 200)))])
        .word("c", None, &[("cc", None), ("dd", None)])
        .build();
    let stats = stats_of(&timeline, &config);

    assert_eq!(synthesize_missing_words(&mut timeline, &stats, &config), 1);
    assert!(timeline.words[0].ignored);
    assert!(timeline.phones[0].ignored);
    assert_eq!(timeline.words[0].corrections, [CorrectionKind::MissingWord]);

    // open right window: stretched to the positive bound, deviation is 0
    assert_eq!(timeline.phones[2].interval(), at(210, 310));
    assert_eq!(timeline.phones[3].interval(), at(320, 420));
    assert_eq!(timeline.words[2].interval(), at(210, 420));
    assert_eq!(timeline.words[2].corrections, [CorrectionKind::MissingWord]);
    assert!(!timeline.words[2].matched);
}

#[test]
fn missing_word_fills_window_between_neighbours() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 90)), &[("x", Some((0, 40))), ("x", Some((50, 90)))])
        .word("m", None, &[("y", None), ("z", None)])
        .word("v", Some((300, 340)), &[("x", Some((300, 340)))])
        .build();
    let stats = stats_of(&timeline, &config);

    synthesize_missing_words(&mut timeline, &stats, &config);
    assert_eq!(timeline.phones[2].interval(), at(100, 140));
    assert_eq!(timeline.phones[3].interval(), at(150, 190));
    assert_eq!(timeline.words[1].interval(), at(100, 190));
    assert_well_formed(&timeline);
}

#[test]
fn missing_word_with_inverted_window_is_ignored() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 100)), &[("x", Some((0, 100)))])
        .word("m", None, &[("y", None)])
        .word("v", Some((105, 200)), &[("x", Some((105, 200)))])
        .build();
    let stats = stats_of(&timeline, &config);

    assert_eq!(synthesize_missing_words(&mut timeline, &stats, &config), 0);
    assert!(timeline.words[1].ignored);
    assert!(timeline.phones[1].ignored);
}

#[test]
fn missing_word_is_ignored_when_no_phone_fits() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("w", Some((0, 100)), &[("x", Some((0, 100)))])
        .word("m", None, &[("y", None), ("z", None)])
        .word("v", Some((200, 300)), &[("x", Some((200, 300)))])
        .build();
    let stats = stats_of(&timeline, &config);

    synthesize_missing_words(&mut timeline, &stats, &config);
    assert!(timeline.words[1].ignored);
    assert!(timeline.phones[1].ignored);
    assert!(timeline.phones[2].ignored);
}

#[test]
fn synthesized_word_bounds_the_next_missing_word() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word("b", Some((100, 200)), &[("bb", Some((100, 200)))])
        .word("c", None, &[("cc", None)])
        .word("d", None, &[("dd", None)])
        .build();
    let stats = stats_of(&timeline, &config);

    assert_eq!(synthesize_missing_words(&mut timeline, &stats, &config), 2);
    assert_eq!(timeline.words[1].interval(), at(210, 310));
    assert_eq!(timeline.words[2].interval(), at(320, 420));
}

// whole pass

#[test]
fn corrections_run_in_order_and_leave_a_consistent_timeline() {
    let config = CorrectionConfig::default();
    let mut timeline = TimelineBuilder::default()
        .word(
            "one",
            Some((0, 300)),
            &[("w", Some((0, 80))), ("ah", None), ("n", Some((200, 300)))],
        )
        .word("two", None, &[("t", None), ("uw", None)])
        .word(
            "three",
            Some((600, 800)),
            &[
                ("th", Some((560, 620))),
                ("r", Some((630, 700))),
                ("iy", Some((710, 800))),
            ],
        )
        .build();
    let stats = stats_of(&timeline, &config);

    let summary = run_corrections(&mut timeline, &stats, &config);
    assert_eq!(summary.gaps_patched, 1);
    assert_eq!(summary.words_reconciled, 0);
    assert_eq!(summary.words_synthesized, 1);
    assert_eq!(summary.ignored_words, 0);

    assert_eq!(timeline.phones[1].interval(), at(90, 190));
    assert_eq!(timeline.phones[1].corrections, [CorrectionKind::GapTooBig]);
    // "two" is unplaced during reconciliation, so "three" cannot grow left.
    assert_eq!(timeline.words[2].interval(), at(600, 800));
    assert_eq!(timeline.phones[5].interval(), at(600, 620));
    assert_eq!(timeline.phones[5].corrections, [CorrectionKind::ShrinkToStart]);
    assert_eq!(timeline.words[1].interval(), at(310, 520));
    assert_eq!(timeline.phones[3].interval(), at(310, 410));
    assert_eq!(timeline.phones[4].interval(), at(420, 520));
    assert_well_formed(&timeline);

    let events = timeline.events();
    assert!(events.windows(2).all(|pair| pair[0].stage <= pair[1].stage));
}
