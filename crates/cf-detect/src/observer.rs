//! Stage timing collection.
//!
//! Fit and apply report each stage they finish to a [`StageObserver`] passed
//! in by the caller. Stages are also logged at `debug` level.

use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

pub trait StageObserver {
    fn stage(&mut self, label: &str, elapsed: Duration);
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn stage(&mut self, _label: &str, _elapsed: Duration) {}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Ordered list of stage timings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.label.as_str())
    }
}

impl StageObserver for TimingBreakdown {
    fn stage(&mut self, label: &str, elapsed: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1e3;
        self.total_ms += elapsed_ms;
        self.stages.push(StageTiming {
            label: label.to_owned(),
            elapsed_ms,
        });
    }
}

pub(crate) fn record(observer: &mut dyn StageObserver, label: &str, start: Instant) {
    record_elapsed(observer, label, start.elapsed());
}

pub(crate) fn record_elapsed(observer: &mut dyn StageObserver, label: &str, elapsed: Duration) {
    debug!("{label}: {:.3} ms", elapsed.as_secs_f64() * 1e3);
    observer.stage(label, elapsed);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{StageObserver, TimingBreakdown};

    #[test]
    fn breakdown_accumulates_in_order() {
        let mut t = TimingBreakdown::default();
        t.stage("filter", Duration::from_millis(2));
        t.stage("combine", Duration::from_millis(3));

        assert_eq!(t.labels().collect::<Vec<_>>(), vec!["filter", "combine"]);
        assert!((t.total_ms - 5.0).abs() < 1e-9);

        let json = serde_json::to_string(&t).expect("serializable");
        assert!(json.contains("\"elapsedMs\""));
    }
}
