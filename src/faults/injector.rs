//! Latency and failure planning for `/work` calls.

use std::time::Duration;

use rand::Rng;

use crate::config::FaultConfig;

/// What a single `/work` call will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPlan {
    /// Fixed work time.
    pub base_delay: Duration,
    /// Uniform random extra delay in `[0, max_latency_ms]`.
    pub extra_delay: Duration,
    /// Whether the call ends in a simulated internal failure.
    pub fail: bool,
}

impl FaultPlan {
    pub fn total_delay(&self) -> Duration {
        self.base_delay + self.extra_delay
    }
}

/// Draws a [`FaultPlan`] per call from the configured rates.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    config: FaultConfig,
}

impl FaultInjector {
    pub fn new(config: FaultConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FaultConfig {
        &self.config
    }

    pub fn plan<R: Rng>(&self, rng: &mut R) -> FaultPlan {
        let extra_ms = rng.gen_range(0..=self.config.max_latency_ms);
        let fail = rng.gen::<f64>() < self.config.failure_rate;

        FaultPlan {
            base_delay: Duration::from_millis(self.config.base_latency_ms),
            extra_delay: Duration::from_millis(extra_ms),
            fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn injector(failure_rate: f64, base: u64, max: u64) -> FaultInjector {
        FaultInjector::new(FaultConfig {
            failure_rate,
            base_latency_ms: base,
            max_latency_ms: max,
            host: None,
        })
    }

    #[test]
    fn test_extremes_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let never = injector(0.0, 10, 0);
        let always = injector(1.0, 10, 0);
        for _ in 0..200 {
            let plan = never.plan(&mut rng);
            assert!(!plan.fail);
            assert_eq!(plan.total_delay(), Duration::from_millis(10));
            assert!(always.plan(&mut rng).fail);
        }
    }

    #[test]
    fn test_extra_delay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let faults = injector(0.3, 30, 800);
        for _ in 0..1000 {
            let plan = faults.plan(&mut rng);
            assert_eq!(plan.base_delay, Duration::from_millis(30));
            assert!(plan.extra_delay <= Duration::from_millis(800));
        }
    }

    #[test]
    fn test_failure_rate_is_roughly_honored() {
        let mut rng = StdRng::seed_from_u64(1234);
        let faults = injector(0.3, 0, 0);
        let failures = (0..10_000).filter(|_| faults.plan(&mut rng).fail).count();
        assert!((2_500..3_500).contains(&failures), "failures = {}", failures);
    }
}
