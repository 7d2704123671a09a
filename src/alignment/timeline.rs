use crate::alignment::transcript::WordPhoneIndex;
use crate::error::LipSyncError;
use crate::types::{
    CorrectionAction, CorrectionEvent, CorrectionKind, CorrectionStage, Interval, Unit, UnitRef,
};

/// Word and phone sequences of one run, plus the offset table linking them.
///
/// Correction stages borrow the timeline mutably one after another; every
/// change goes through the recording helpers so the event log mirrors the
/// tags stored on the units.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTimeline {
    pub words: Vec<Unit>,
    pub phones: Vec<Unit>,
    index: WordPhoneIndex,
    events: Vec<CorrectionEvent>,
}

impl AlignedTimeline {
    pub fn new(
        words: Vec<Unit>,
        phones: Vec<Unit>,
        index: WordPhoneIndex,
    ) -> Result<Self, LipSyncError> {
        if index.word_count() != words.len() || index.phone_count() != phones.len() {
            return Err(LipSyncError::invalid_input(format!(
                "offset table covers {} words / {} phones, timeline has {} / {}",
                index.word_count(),
                index.phone_count(),
                words.len(),
                phones.len()
            )));
        }
        Ok(Self {
            words,
            phones,
            index,
            events: Vec::new(),
        })
    }

    pub fn index(&self) -> &WordPhoneIndex {
        &self.index
    }

    pub fn phone_span(&self, word: usize) -> std::ops::Range<usize> {
        self.index.span(word)
    }

    pub fn events(&self) -> &[CorrectionEvent] {
        &self.events
    }

    pub fn into_parts(self) -> (Vec<Unit>, Vec<Unit>, WordPhoneIndex, Vec<CorrectionEvent>) {
        (self.words, self.phones, self.index, self.events)
    }

    /// First and last placed phone of `word`.
    pub fn placed_phone_bounds(&self, word: usize) -> Option<(usize, usize)> {
        let span = self.phone_span(word);
        let first = span.clone().find(|&p| self.phones[p].is_placed())?;
        let last = span.rev().find(|&p| self.phones[p].is_placed())?;
        Some((first, last))
    }

    pub(crate) fn retime(
        &mut self,
        stage: CorrectionStage,
        unit: UnitRef,
        interval: Interval,
        kind: CorrectionKind,
    ) {
        let target = self.unit_mut(unit);
        target.resolved_interval = Some(interval);
        target.add_correction(kind);
        tracing::debug!(
            stage = ?stage,
            unit = ?unit,
            spelling = target.spelling.as_str(),
            start_ms = interval.start_ms,
            end_ms = interval.end_ms,
            kind = kind.as_str(),
            "correction: retimed"
        );
        self.events.push(CorrectionEvent {
            stage,
            unit,
            kind,
            action: CorrectionAction::Retimed(interval),
        });
    }

    pub(crate) fn ignore(&mut self, stage: CorrectionStage, unit: UnitRef, kind: CorrectionKind) {
        let target = self.unit_mut(unit);
        target.ignored = true;
        target.add_correction(kind);
        tracing::debug!(
            stage = ?stage,
            unit = ?unit,
            spelling = target.spelling.as_str(),
            kind = kind.as_str(),
            "correction: ignored"
        );
        self.events.push(CorrectionEvent {
            stage,
            unit,
            kind,
            action: CorrectionAction::Ignored,
        });
    }

    pub(crate) fn tag(&mut self, stage: CorrectionStage, unit: UnitRef, kind: CorrectionKind) {
        let target = self.unit_mut(unit);
        target.add_correction(kind);
        tracing::trace!(
            stage = ?stage,
            unit = ?unit,
            spelling = target.spelling.as_str(),
            kind = kind.as_str(),
            "correction: tagged"
        );
        self.events.push(CorrectionEvent {
            stage,
            unit,
            kind,
            action: CorrectionAction::Tagged,
        });
    }

    fn unit_mut(&mut self, unit: UnitRef) -> &mut Unit {
        match unit {
            UnitRef::Word(i) => &mut self.words[i],
            UnitRef::Phone(i) => &mut self.phones[i],
        }
    }
}
