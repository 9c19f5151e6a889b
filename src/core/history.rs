/// Short rolling history of host metrics for the header sparklines

use chrono::{DateTime, Local};
use std::collections::VecDeque;

use crate::core::models::SystemMetrics;

/// Samples kept by default
pub const HISTORY_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSample {
    pub at: DateTime<Local>,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl MetricsSample {
    pub fn from_metrics(metrics: &SystemMetrics, at: DateTime<Local>) -> Self {
        Self {
            at,
            cpu: round1(metrics.cpu_percent),
            memory: round1(metrics.memory.percent),
            disk: round1(metrics.disk.percent),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone)]
pub struct MetricsHistory {
    samples: VecDeque<MetricsSample>,
    capacity: usize,
}

impl Default for MetricsHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_LEN)
    }
}

impl MetricsHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest once full
    pub fn record(&mut self, metrics: &SystemMetrics, at: DateTime<Local>) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(MetricsSample::from_metrics(metrics, at));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&MetricsSample> {
        self.samples.back()
    }

    /// Percentages as whole numbers, oldest first, for `ratatui::widgets::Sparkline`
    pub fn cpu_series(&self) -> Vec<u64> {
        self.series(|s| s.cpu)
    }

    pub fn memory_series(&self) -> Vec<u64> {
        self.series(|s| s.memory)
    }

    pub fn disk_series(&self) -> Vec<u64> {
        self.series(|s| s.disk)
    }

    fn series(&self, pick: impl Fn(&MetricsSample) -> f64) -> Vec<u64> {
        self.samples
            .iter()
            .map(|s| pick(s).clamp(0.0, 100.0).round() as u64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::UsageInfo;

    fn metrics(cpu: f64) -> SystemMetrics {
        SystemMetrics {
            cpu_percent: cpu,
            memory: UsageInfo { total_gb: 32.0, used_gb: 16.0, percent: 50.04 },
            disk: UsageInfo { total_gb: 1000.0, used_gb: 600.0, percent: 60.0 },
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = MetricsHistory::default();
        for i in 0..20 {
            history.record(&metrics(i as f64), Local::now());
        }

        assert_eq!(history.len(), HISTORY_LEN);
        assert_eq!(history.cpu_series().first(), Some(&8));
        assert_eq!(history.latest().map(|s| s.cpu), Some(19.0));
    }

    #[test]
    fn test_samples_are_rounded() {
        let mut history = MetricsHistory::with_capacity(3);
        history.record(&metrics(21.86), Local::now());

        let sample = history.latest().unwrap();
        assert_eq!(sample.cpu, 21.9);
        assert_eq!(sample.memory, 50.0);
        assert_eq!(history.memory_series(), vec![50]);
    }

    #[test]
    fn test_series_is_clamped() {
        let mut history = MetricsHistory::with_capacity(2);
        history.record(&metrics(250.0), Local::now());
        assert_eq!(history.cpu_series(), vec![100]);
    }
}
