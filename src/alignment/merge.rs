use crate::error::LipSyncError;
use crate::types::{Granularity, RecognizedUnit, Unit};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// One unit per expected spelling, in transcript order.
    pub units: Vec<Unit>,
    /// Pronunciation reported for each matched unit; `None` when unmatched.
    pub pronunciations: Vec<Option<Vec<String>>>,
    /// Recognized entries absent from the transcript. They are dropped from
    /// the timeline and only kept here for diagnostics.
    pub discarded: Vec<RecognizedUnit>,
}

impl MergeOutcome {
    pub fn matched_count(&self) -> usize {
        self.units.iter().filter(|u| u.matched).count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.units.len() - self.matched_count()
    }
}

/// Combines the recognizer output with the sequence aligner's mapping.
///
/// `mapping[i]` is the index in `recognized` matched to `expected[i]`. The
/// mapping must cover every expected unit and reference recognized units in
/// strictly increasing order.
pub fn merge_recognition(
    granularity: Granularity,
    expected: &[String],
    recognized: &[RecognizedUnit],
    mapping: &[Option<usize>],
) -> Result<MergeOutcome, LipSyncError> {
    if mapping.len() != expected.len() {
        return Err(LipSyncError::collaborator(
            "sequence aligner",
            format!(
                "mapping has {} entries for {} expected units",
                mapping.len(),
                expected.len()
            ),
        ));
    }

    let mut units = Vec::with_capacity(expected.len());
    let mut pronunciations = Vec::with_capacity(expected.len());
    let mut discarded = Vec::new();
    let mut next_unreferenced = 0usize;

    for (spelling, target) in expected.iter().zip(mapping) {
        let Some(idx) = *target else {
            tracing::trace!(?granularity, spelling = spelling.as_str(), "merge: unmatched");
            units.push(Unit::unmatched(spelling.as_str()));
            pronunciations.push(None);
            continue;
        };

        if idx >= recognized.len() {
            return Err(LipSyncError::collaborator(
                "sequence aligner",
                format!(
                    "mapping references unit {idx}, recognizer returned {}",
                    recognized.len()
                ),
            ));
        }
        if idx < next_unreferenced {
            return Err(LipSyncError::collaborator(
                "sequence aligner",
                format!("mapping is not strictly increasing at recognized unit {idx}"),
            ));
        }

        discarded.extend_from_slice(&recognized[next_unreferenced..idx]);
        let hit = &recognized[idx];
        units.push(Unit::matched(hit.spelling.as_str(), hit.interval()));
        pronunciations.push(Some(hit.phones.clone()));
        next_unreferenced = idx + 1;
    }
    discarded.extend_from_slice(&recognized[next_unreferenced.min(recognized.len())..]);

    for extra in &discarded {
        tracing::debug!(
            ?granularity,
            spelling = extra.spelling.as_str(),
            start_ms = extra.start_ms,
            end_ms = extra.end_ms,
            "merge: dropping recognized unit absent from transcript"
        );
    }

    let outcome = MergeOutcome {
        units,
        pronunciations,
        discarded,
    };
    tracing::info!(
        ?granularity,
        expected = expected.len(),
        recognized = recognized.len(),
        matched = outcome.matched_count(),
        discarded = outcome.discarded.len(),
        "merge: recognition merged"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Interval;

    fn rec(spelling: &str, start_ms: i64, end_ms: i64) -> RecognizedUnit {
        RecognizedUnit {
            spelling: spelling.to_string(),
            start_ms,
            end_ms,
            phones: Vec::new(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn unmatched_units_keep_expected_spelling() {
        let expected = strings(&["a", "b", "c"]);
        let recognized = vec![rec("b", 100, 200)];
        let outcome = merge_recognition(
            Granularity::Word,
            &expected,
            &recognized,
            &[None, Some(0), None],
        )
        .unwrap();

        assert_eq!(outcome.units.len(), 3);
        assert!(!outcome.units[0].matched);
        assert_eq!(outcome.units[0].spelling, "a");
        assert_eq!(outcome.units[0].resolved_interval, None);
        assert!(outcome.units[1].matched);
        assert_eq!(
            outcome.units[1].resolved_interval,
            Some(Interval::new(100, 200))
        );
        assert!(!outcome.units[2].matched);
        assert!(outcome.discarded.is_empty());
        assert_eq!(outcome.unmatched_count(), 2);
    }

    #[test]
    fn matched_units_take_recognized_spelling_and_pronunciation() {
        let expected = strings(&["les"]);
        let recognized = vec![RecognizedUnit {
            spelling: "les(2)".to_string(),
            start_ms: 0,
            end_ms: 120,
            phones: strings(&["ll", "ei"]),
        }];
        let outcome =
            merge_recognition(Granularity::Word, &expected, &recognized, &[Some(0)]).unwrap();
        assert_eq!(outcome.units[0].spelling, "les(2)");
        assert_eq!(outcome.pronunciations[0], Some(strings(&["ll", "ei"])));
    }

    #[test]
    fn insertions_between_and_after_matches_are_discarded() {
        let expected = strings(&["a", "b"]);
        let recognized = vec![
            rec("x", 0, 50),
            rec("a", 60, 100),
            rec("y", 110, 150),
            rec("b", 160, 200),
            rec("z", 210, 260),
        ];
        let outcome = merge_recognition(
            Granularity::Phone,
            &expected,
            &recognized,
            &[Some(1), Some(3)],
        )
        .unwrap();
        let dropped: Vec<&str> = outcome
            .discarded
            .iter()
            .map(|u| u.spelling.as_str())
            .collect();
        assert_eq!(dropped, ["x", "y", "z"]);
        assert_eq!(outcome.units.len(), 2);
    }

    #[test]
    fn nothing_matched_discards_everything() {
        let expected = strings(&["a"]);
        let recognized = vec![rec("q", 0, 10)];
        let outcome =
            merge_recognition(Granularity::Phone, &expected, &recognized, &[None]).unwrap();
        assert_eq!(outcome.discarded.len(), 1);
    }

    #[test]
    fn malformed_mappings_are_collaborator_errors() {
        let expected = strings(&["a", "b"]);
        let recognized = vec![rec("a", 0, 10), rec("b", 20, 30)];

        let short = merge_recognition(Granularity::Word, &expected, &recognized, &[Some(0)]);
        assert!(matches!(short, Err(LipSyncError::Collaborator { .. })));

        let out_of_range =
            merge_recognition(Granularity::Word, &expected, &recognized, &[Some(0), Some(5)]);
        assert!(matches!(out_of_range, Err(LipSyncError::Collaborator { .. })));

        let reversed =
            merge_recognition(Granularity::Word, &expected, &recognized, &[Some(1), Some(0)]);
        assert!(matches!(reversed, Err(LipSyncError::Collaborator { .. })));
    }

    #[test]
    fn merge_is_deterministic() {
        let expected = strings(&["a", "b", "c"]);
        let recognized = vec![rec("a", 0, 40), rec("c", 90, 130)];
        let mapping = [Some(0), None, Some(1)];
        let first = merge_recognition(Granularity::Phone, &expected, &recognized, &mapping).unwrap();
        let second =
            merge_recognition(Granularity::Phone, &expected, &recognized, &mapping).unwrap();
        assert_eq!(first, second);
    }
}
