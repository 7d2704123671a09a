use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::Unit;

/// Running aggregate over a bag of durations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationStatistic {
    samples: Vec<i64>,
    sum: f64,
    sum_sq: f64,
    min: Option<i64>,
    max: Option<i64>,
}

impl DurationStatistic {
    pub fn push(&mut self, duration_ms: i64) {
        let d = duration_ms as f64;
        self.samples.push(duration_ms);
        self.sum += d;
        self.sum_sq += d * d;
        self.min = Some(self.min.map_or(duration_ms, |m| m.min(duration_ms)));
        self.max = Some(self.max.map_or(duration_ms, |m| m.max(duration_ms)));
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn min(&self) -> Option<i64> {
        self.min
    }

    pub fn max(&self) -> Option<i64> {
        self.max
    }

    /// 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.sum / self.count() as f64
    }

    /// Population standard deviation; 0 when empty.
    pub fn deviation(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.count() as f64 - mean * mean).max(0.0).sqrt()
    }

    /// Deviation of the samples at or above the mean, with their count.
    pub fn positive_deviation(&self) -> (f64, usize) {
        let mean = self.mean();
        self.one_sided_deviation(|d| d >= mean)
    }

    /// Deviation of the samples at or below the mean, with their count.
    pub fn negative_deviation(&self) -> (f64, usize) {
        let mean = self.mean();
        self.one_sided_deviation(|d| d <= mean)
    }

    fn one_sided_deviation(&self, keep: impl Fn(f64) -> bool) -> (f64, usize) {
        let mean = self.mean();
        let (count, sq_sum) = self
            .samples
            .iter()
            .map(|&d| d as f64)
            .filter(|&d| keep(d))
            .fold((0usize, 0.0f64), |(n, acc), d| (n + 1, acc + (d - mean) * (d - mean)));
        if count == 0 {
            return (0.0, 0);
        }
        ((sq_sum / count as f64).sqrt(), count)
    }

    pub fn summary(&self) -> DurationSummary {
        let (positive_deviation, positive_count) = self.positive_deviation();
        let (negative_deviation, negative_count) = self.negative_deviation();
        DurationSummary {
            count: self.count(),
            mean_ms: self.mean(),
            deviation_ms: self.deviation(),
            positive_deviation_ms: positive_deviation,
            positive_count,
            negative_deviation_ms: negative_deviation,
            negative_count,
            min_ms: self.min,
            max_ms: self.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationSummary {
    pub count: usize,
    pub mean_ms: f64,
    pub deviation_ms: f64,
    pub positive_deviation_ms: f64,
    pub positive_count: usize,
    pub negative_deviation_ms: f64,
    pub negative_count: usize,
    pub min_ms: Option<i64>,
    pub max_ms: Option<i64>,
}

/// Phone duration model learned from the recognized phones of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentStatistics {
    global: DurationStatistic,
    per_phone: BTreeMap<String, DurationStatistic>,
    low_sample_threshold: usize,
    phone_count: usize,
    unmatched_count: usize,
    inserted_count: usize,
}

impl AlignmentStatistics {
    /// Aggregates every matched, placed phone. `inserted_count` is the
    /// number of recognized phones the merge dropped.
    pub fn from_phones(phones: &[Unit], inserted_count: usize, low_sample_threshold: usize) -> Self {
        let mut global = DurationStatistic::default();
        let mut per_phone: BTreeMap<String, DurationStatistic> = BTreeMap::new();

        for phone in phones.iter().filter(|p| p.matched) {
            let Some(interval) = phone.interval() else {
                continue;
            };
            let duration = interval.duration_ms();
            global.push(duration);
            per_phone
                .entry(phone.spelling.clone())
                .or_default()
                .push(duration);
        }

        let stats = Self {
            global,
            per_phone,
            low_sample_threshold,
            phone_count: phones.len(),
            unmatched_count: phones.iter().filter(|p| !p.matched).count(),
            inserted_count,
        };
        tracing::info!(
            samples = stats.global.count(),
            distinct_phones = stats.per_phone.len(),
            mean_ms = format!("{:.2}", stats.global.mean()),
            deviation_ms = format!("{:.2}", stats.global.deviation()),
            unmatched = stats.unmatched_count,
            inserted = stats.inserted_count,
            "statistics: phone duration model built"
        );
        stats
    }

    pub fn global(&self) -> &DurationStatistic {
        &self.global
    }

    pub fn phone(&self, phone: &str) -> Option<&DurationStatistic> {
        self.per_phone.get(phone)
    }

    pub fn mean(&self, phone: &str) -> f64 {
        match self.phone(phone) {
            Some(stat) if stat.count() > 0 => stat.mean(),
            _ => self.global.mean(),
        }
    }

    /// Deviation of `phone`, borrowing the global coefficient of variation
    /// when the phone has too few samples for its own estimate.
    pub fn deviation(&self, phone: &str) -> f64 {
        let Some(stat) = self.phone(phone).filter(|s| s.count() > 0) else {
            return self.global.deviation();
        };
        let own = stat.deviation();
        if stat.count() > self.low_sample_threshold {
            return own;
        }
        own.max(self.global_variation() * stat.mean())
    }

    fn global_variation(&self) -> f64 {
        let mean = self.global.mean();
        if mean > 0.0 {
            self.global.deviation() / mean
        } else {
            0.0
        }
    }

    pub fn phone_count(&self) -> usize {
        self.phone_count
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched_count
    }

    pub fn inserted_count(&self) -> usize {
        self.inserted_count
    }

    pub fn summary(&self) -> StatisticsSummary {
        let unmatched_ratio = if self.phone_count == 0 {
            0.0
        } else {
            self.unmatched_count as f64 / self.phone_count as f64
        };
        StatisticsSummary {
            phone_count: self.phone_count,
            unmatched_count: self.unmatched_count,
            unmatched_ratio,
            inserted_count: self.inserted_count,
            global: self.global.summary(),
            per_phone: self
                .per_phone
                .iter()
                .map(|(phone, stat)| (phone.clone(), stat.summary()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub phone_count: usize,
    pub unmatched_count: usize,
    pub unmatched_ratio: f64,
    pub inserted_count: usize,
    pub global: DurationSummary,
    pub per_phone: BTreeMap<String, DurationSummary>,
}
