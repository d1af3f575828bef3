//! Load run summary.

use std::collections::BTreeMap;
use std::fmt;

use crate::loadgen::runner::LoadOutcome;
use crate::observability::stats::{mean, p95};

/// Mean and p95 of a latency sample set, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub avg_ms: f64,
    pub p95_ms: f64,
}

impl LatencySummary {
    fn of(samples: &[f64]) -> Self {
        Self {
            avg_ms: mean(samples),
            p95_ms: p95(samples),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub total: usize,
    pub success: usize,
    pub all: LatencySummary,
    /// `None` when no request succeeded.
    pub successful: Option<LatencySummary>,
    pub breaker_states: BTreeMap<String, usize>,
}

impl LoadSummary {
    pub fn from_outcomes(outcomes: &[LoadOutcome]) -> Self {
        let all: Vec<f64> = outcomes.iter().map(|o| o.latency_ms).collect();
        let ok: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.ok)
            .map(|o| o.latency_ms)
            .collect();

        let mut breaker_states = BTreeMap::new();
        for outcome in outcomes {
            *breaker_states.entry(outcome.breaker_state.clone()).or_insert(0) += 1;
        }

        Self {
            total: outcomes.len(),
            success: ok.len(),
            all: LatencySummary::of(&all),
            successful: (!ok.is_empty()).then(|| LatencySummary::of(&ok)),
            breaker_states,
        }
    }

    pub fn success_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.success as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== load test summary ===")?;
        writeln!(f, "Total requests: {}", self.total)?;
        writeln!(f, "Success: {} ({:.1}%)", self.success, self.success_pct())?;
        writeln!(f)?;
        writeln!(f, "Latency (all):")?;
        writeln!(f, "  avg: {:.2}ms", self.all.avg_ms)?;
        writeln!(f, "  p95: {:.2}ms", self.all.p95_ms)?;
        writeln!(f)?;
        writeln!(f, "Latency (successful only):")?;
        match &self.successful {
            Some(ok) => {
                writeln!(f, "  avg: {:.2}ms", ok.avg_ms)?;
                writeln!(f, "  p95: {:.2}ms", ok.p95_ms)?;
            }
            None => writeln!(f, "  n/a")?,
        }
        writeln!(f)?;
        writeln!(f, "Breaker states seen:")?;
        for (state, count) in &self.breaker_states {
            writeln!(f, "  {}: {}", state, count)?;
        }
        Ok(())
    }
}
