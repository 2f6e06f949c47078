use std::sync::Mutex;

use swarm_core::api::{ConcurrencyConfig, ConcurrencyContext, ConcurrencyStrategyPlugin};

/// Shrinks or grows the pool between stages based on host CPU load.
pub struct AdaptiveConcurrencyPlugin {
    config: ConcurrencyConfig,
    system: Mutex<sysinfo::System>,
}

/// Pins the pool to one value; used whenever the user asked for an exact
/// `--num-parallel`.
pub struct FixedConcurrencyPlugin {
    fixed: usize,
}

impl AdaptiveConcurrencyPlugin {
    pub fn new(config: ConcurrencyConfig) -> Self {
        let mut system = sysinfo::System::new();
        system.refresh_cpu();
        Self {
            config,
            system: Mutex::new(system),
        }
    }

    fn cpu_usage(&self) -> f32 {
        let mut system = match self.system.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_cpu();
        let cpus = system.cpus();
        if cpus.is_empty() {
            return 0.0;
        }
        cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
    }
}

impl FixedConcurrencyPlugin {
    pub fn new(fixed: usize) -> Self {
        Self { fixed }
    }
}

impl ConcurrencyStrategyPlugin for AdaptiveConcurrencyPlugin {
    fn name(&self) -> &str {
        "adaptive"
    }

    fn calculate_concurrency(&self, context: &ConcurrencyContext) -> usize {
        let cpu_usage = self.cpu_usage();
        let mut desired = context.base_concurrency;

        if cpu_usage >= self.config.cpu_threshold_high {
            desired = desired.saturating_div(2).max(self.config.min_concurrency);
        } else if cpu_usage <= self.config.cpu_threshold_low {
            desired = desired.saturating_mul(2).min(self.config.max_concurrency);
        }

        desired = desired.clamp(self.config.min_concurrency, self.config.max_concurrency);
        desired.clamp(1, num_cpus::get().max(1) * 8)
    }
}

impl ConcurrencyStrategyPlugin for FixedConcurrencyPlugin {
    fn name(&self) -> &str {
        "fixed"
    }

    fn calculate_concurrency(&self, _context: &ConcurrencyContext) -> usize {
        self.fixed.max(1)
    }
}
