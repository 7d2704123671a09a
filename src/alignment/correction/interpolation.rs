use crate::alignment::statistics::AlignmentStatistics;
use crate::config::CorrectionConfig;
use crate::types::CorrectionKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PhoneEstimate {
    pub mean: f64,
    pub deviation: f64,
}

/// Expected timing of a run of phones that has to fit a window.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GapEstimate {
    pub phones: Vec<PhoneEstimate>,
    /// Sum of the mean durations, each followed by one separation.
    pub total_expected: f64,
    pub total_deviation: f64,
}

impl GapEstimate {
    pub fn new<'a>(
        spellings: impl IntoIterator<Item = &'a str>,
        stats: &AlignmentStatistics,
        config: &CorrectionConfig,
    ) -> Self {
        let phones: Vec<PhoneEstimate> = spellings
            .into_iter()
            .map(|spelling| PhoneEstimate {
                mean: stats.mean(spelling),
                deviation: stats.deviation(spelling),
            })
            .collect();
        let separation = config.separation_ms as f64;
        let total_expected = phones.iter().map(|p| p.mean + separation).sum();
        let total_deviation = phones.iter().map(|p| p.deviation).sum();
        Self {
            phones,
            total_expected,
            total_deviation,
        }
    }

    /// How many deviations each phone must be stretched (positive) or
    /// compressed (negative) to fill `window_ms`. An unbounded window
    /// stretches without limit.
    pub fn factor(&self, window_ms: Option<i64>) -> f64 {
        let Some(window_ms) = window_ms else {
            return f64::INFINITY;
        };
        let slack = window_ms as f64 - self.total_expected;
        if self.total_deviation > f64::EPSILON {
            return slack / self.total_deviation;
        }
        if slack.abs() < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY.copysign(slack)
        }
    }

    /// Per-phone durations at `factor`, rounded to frames with the floor.
    pub fn durations(&self, factor: f64, config: &CorrectionConfig) -> Vec<i64> {
        self.phones
            .iter()
            .map(|p| config.round_duration(p.mean + p.deviation * factor))
            .collect()
    }

    /// Rounded length of the whole run at `factor`, separations included.
    pub fn block_length(&self, factor: f64, config: &CorrectionConfig) -> i64 {
        config.round_to_frame(self.total_expected + self.total_deviation * factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapRegime {
    /// Cannot fit even at maximum compression.
    TooSmall,
    Normal,
    /// Would need more than the maximum stretch.
    TooBig,
}

impl GapRegime {
    /// Both bounds belong to the normal regime.
    pub fn classify(factor: f64, config: &CorrectionConfig) -> Self {
        if factor > config.max_positive_deviation {
            Self::TooBig
        } else if factor < -config.max_negative_deviation {
            Self::TooSmall
        } else {
            Self::Normal
        }
    }

    pub fn kind(self) -> CorrectionKind {
        match self {
            Self::TooSmall => CorrectionKind::GapTooSmall,
            Self::Normal => CorrectionKind::GapNormal,
            Self::TooBig => CorrectionKind::GapTooBig,
        }
    }
}
