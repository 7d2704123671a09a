use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl Interval {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start_ms <= other.start_ms && other.end_ms <= self.end_ms
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start_ms, self.end_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Word,
    Phone,
}

/// One entry produced by the speech aligner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedUnit {
    pub spelling: String,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Pronunciation chosen by the recognizer. Only words carry one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,
}

impl RecognizedUnit {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start_ms, self.end_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    MoveStart,
    MoveEnd,
    ShrinkToStart,
    ShrinkToEnd,
    MissingWord,
    GapNormal,
    GapTooBig,
    GapTooSmall,
}

impl CorrectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoveStart => "move_start",
            Self::MoveEnd => "move_end",
            Self::ShrinkToStart => "shrink_to_start",
            Self::ShrinkToEnd => "shrink_to_end",
            Self::MissingWord => "missing_word",
            Self::GapNormal => "gap_normal",
            Self::GapTooBig => "gap_too_big",
            Self::GapTooSmall => "gap_too_small",
        }
    }
}

/// A word or phone of the aligned transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub spelling: String,
    /// Timing reported by the recognizer; never rewritten.
    pub recognized_interval: Option<Interval>,
    /// Current timing after corrections. May hold a stale value when the
    /// unit is ignored; read it through [`Unit::interval`].
    pub resolved_interval: Option<Interval>,
    pub matched: bool,
    pub ignored: bool,
    pub corrections: Vec<CorrectionKind>,
}

impl Unit {
    pub fn matched(spelling: impl Into<String>, interval: Interval) -> Self {
        Self {
            spelling: spelling.into(),
            recognized_interval: Some(interval),
            resolved_interval: Some(interval),
            matched: true,
            ignored: false,
            corrections: Vec::new(),
        }
    }

    pub fn unmatched(spelling: impl Into<String>) -> Self {
        Self {
            spelling: spelling.into(),
            recognized_interval: None,
            resolved_interval: None,
            matched: false,
            ignored: false,
            corrections: Vec::new(),
        }
    }

    /// Timing visible to consumers: `None` for ignored units.
    pub fn interval(&self) -> Option<Interval> {
        if self.ignored {
            None
        } else {
            self.resolved_interval
        }
    }

    /// Placed units take part in the output timeline.
    pub fn is_placed(&self) -> bool {
        self.interval().is_some()
    }

    pub fn add_correction(&mut self, kind: CorrectionKind) {
        self.corrections.push(kind);
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.ignored {
            "- "
        } else if !self.matched {
            "? "
        } else {
            ""
        };
        match self.resolved_interval {
            Some(interval) => write!(f, "{marker}{} [{interval}]", self.spelling),
            None => write!(f, "{marker}{}", self.spelling),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum UnitRef {
    Word(usize),
    Phone(usize),
}

/// Correction stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStage {
    GapPatch,
    BoundaryReconcile,
    MissingWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "interval", rename_all = "snake_case")]
pub enum CorrectionAction {
    Retimed(Interval),
    Ignored,
    Tagged,
}

/// Structured record of one change applied by a correction stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionEvent {
    pub stage: CorrectionStage,
    pub unit: UnitRef,
    pub kind: CorrectionKind,
    #[serde(flatten)]
    pub action: CorrectionAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_unit_hides_stale_interval() {
        let mut unit = Unit::matched("aa", Interval::new(100, 180));
        assert_eq!(unit.interval(), Some(Interval::new(100, 180)));
        unit.ignored = true;
        assert_eq!(unit.interval(), None);
        assert!(unit.resolved_interval.is_some());
        assert!(!unit.is_placed());
    }

    #[test]
    fn recognized_unit_reads_phones_optionally() {
        let json = r#"{"spelling": "bb", "start_ms": 10, "end_ms": 40}"#;
        let unit: RecognizedUnit = serde_json::from_str(json).expect("valid unit json");
        assert!(unit.phones.is_empty());
        assert_eq!(unit.interval().duration_ms(), 30);
    }

    #[test]
    fn correction_event_serializes_flat() {
        let event = CorrectionEvent {
            stage: CorrectionStage::GapPatch,
            unit: UnitRef::Phone(3),
            kind: CorrectionKind::GapNormal,
            action: CorrectionAction::Retimed(Interval::new(570, 580)),
        };
        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(value["stage"], "gap_patch");
        assert_eq!(value["unit"]["kind"], "phone");
        assert_eq!(value["unit"]["index"], 3);
        assert_eq!(value["kind"], "gap_normal");
        assert_eq!(value["action"], "retimed");
        assert_eq!(value["interval"]["start_ms"], 570);
    }

    #[test]
    fn display_marks_ignored_and_unmatched() {
        let mut unit = Unit::unmatched("ou");
        assert_eq!(unit.to_string(), "? ou");
        unit.ignored = true;
        assert_eq!(unit.to_string(), "- ou");
    }
}
