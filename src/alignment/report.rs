use serde::Serialize;

use crate::alignment::correction::CorrectionSummary;
use crate::alignment::statistics::StatisticsSummary;
use crate::alignment::transcript::WordPhoneIndex;
use crate::error::LipSyncError;
use crate::types::{CorrectionEvent, CorrectionKind, Unit};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub words: Vec<WordReport>,
    pub statistics: StatisticsSummary,
    pub corrections: CorrectionSummary,
    pub structural: StructuralMetrics,
    pub events: Vec<CorrectionEvent>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub generator: String,
    pub audio: String,
    pub frame_rate: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordReport {
    pub spelling: String,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub matched: bool,
    pub ignored: bool,
    pub corrections: Vec<CorrectionKind>,
    /// Empty for ignored words.
    pub phones: Vec<UnitReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub spelling: String,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub matched: bool,
    pub ignored: bool,
    pub corrections: Vec<CorrectionKind>,
}

impl From<&Unit> for UnitReport {
    fn from(unit: &Unit) -> Self {
        let interval = unit.interval();
        Self {
            spelling: unit.spelling.clone(),
            start_ms: interval.map(|i| i.start_ms),
            end_ms: interval.map(|i| i.end_ms),
            matched: unit.matched,
            ignored: unit.ignored,
            corrections: unit.corrections.clone(),
        }
    }
}

/// Consistency counters over the final timeline. All zero for a clean run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuralMetrics {
    pub non_positive_duration_count: u32,
    pub phone_overlap_count: u32,
    pub containment_violation_count: u32,
    pub word_overlap_count: u32,
    /// Placed words with phones, none of which is placed.
    pub phoneless_word_count: u32,
    pub ignored_word_ratio: f32,
    pub ignored_phone_ratio: f32,
}

pub fn compute_report(
    meta: Meta,
    words: &[Unit],
    phones: &[Unit],
    index: &WordPhoneIndex,
    statistics: StatisticsSummary,
    corrections: CorrectionSummary,
    events: &[CorrectionEvent],
) -> Result<Report, LipSyncError> {
    if index.word_count() != words.len() || index.phone_count() != phones.len() {
        return Err(LipSyncError::invalid_input(format!(
            "report offsets cover {} words / {} phones, got {} / {}",
            index.word_count(),
            index.phone_count(),
            words.len(),
            phones.len()
        )));
    }

    let structural = compute_structural_metrics(words, phones, index)?;
    let mut notes = Vec::new();
    if words.is_empty() {
        notes.push("empty_transcript".to_string());
    }
    if statistics.global.count == 0 {
        notes.push("no_recognized_phones".to_string());
    }
    if structural.containment_violation_count > 0 {
        notes.push(format!(
            "containment_violations={}",
            structural.containment_violation_count
        ));
    }
    if structural.phoneless_word_count > 0 {
        notes.push(format!("phoneless_words={}", structural.phoneless_word_count));
    }

    let word_reports = words
        .iter()
        .enumerate()
        .map(|(w, word)| {
            let head = UnitReport::from(word);
            let phones = if word.ignored {
                Vec::new()
            } else {
                phones[index.span(w)].iter().map(UnitReport::from).collect()
            };
            WordReport {
                spelling: head.spelling,
                start_ms: head.start_ms,
                end_ms: head.end_ms,
                matched: head.matched,
                ignored: head.ignored,
                corrections: head.corrections,
                phones,
            }
        })
        .collect();

    Ok(Report {
        schema_version: SCHEMA_VERSION,
        meta,
        words: word_reports,
        statistics,
        corrections,
        structural,
        events: events.to_vec(),
        notes,
    })
}

fn compute_structural_metrics(
    words: &[Unit],
    phones: &[Unit],
    index: &WordPhoneIndex,
) -> Result<StructuralMetrics, LipSyncError> {
    // Intervals are [start_ms, end_ms), so end must be strictly greater than start.
    let non_positive_duration_count = words
        .iter()
        .chain(phones)
        .filter_map(Unit::interval)
        .filter(|i| i.end_ms <= i.start_ms)
        .count();

    let mut phone_overlap_count = 0usize;
    let mut containment_violation_count = 0usize;
    let mut phoneless_word_count = 0usize;
    for (w, word) in words.iter().enumerate() {
        let Some(word_interval) = word.interval() else {
            continue;
        };
        let placed: Vec<_> = phones[index.span(w)]
            .iter()
            .filter_map(Unit::interval)
            .collect();
        if placed.is_empty() && !index.span(w).is_empty() {
            phoneless_word_count += 1;
        }
        containment_violation_count += placed
            .iter()
            .filter(|phone| !word_interval.contains(phone))
            .count();
        phone_overlap_count += placed
            .windows(2)
            .filter(|pair| pair[0].end_ms > pair[1].start_ms)
            .count();
    }

    let placed_words: Vec<_> = words.iter().filter_map(Unit::interval).collect();
    let word_overlap_count = placed_words
        .windows(2)
        .filter(|pair| pair[0].end_ms > pair[1].start_ms)
        .count();

    let ignored_word_ratio = ratio(words.iter().filter(|w| w.ignored).count(), words.len());
    let ignored_phone_ratio = ratio(phones.iter().filter(|p| p.ignored).count(), phones.len());

    Ok(StructuralMetrics {
        non_positive_duration_count: to_u32(non_positive_duration_count),
        phone_overlap_count: to_u32(phone_overlap_count),
        containment_violation_count: to_u32(containment_violation_count),
        word_overlap_count: to_u32(word_overlap_count),
        phoneless_word_count: to_u32(phoneless_word_count),
        ignored_word_ratio: checked_f32(ignored_word_ratio, "structural.ignored_word_ratio")?,
        ignored_phone_ratio: checked_f32(ignored_phone_ratio, "structural.ignored_phone_ratio")?,
    })
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn checked_f32(value: f64, metric_name: &str) -> Result<f32, LipSyncError> {
    if !value.is_finite() {
        return Err(LipSyncError::invalid_input(format!(
            "metric '{metric_name}' produced non-finite value: {value}"
        )));
    }
    Ok(value as f32)
}
