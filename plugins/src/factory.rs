//! Config-driven plugin assembly for the execution engine.

use std::sync::Arc;

use swarm_core::api::{
    AgentConfig, AgentInvoker, ConcurrencyStrategyPlugin, ExecutionConfig, OutputRendererPlugin,
    RetryStrategyPlugin,
};

use crate::agent::ProcessInvoker;
use crate::executor::renderers::{JsonlRendererPlugin, TextRendererPlugin};
use crate::executor::strategies::{
    AdaptiveConcurrencyPlugin, ExponentialBackoffPlugin, FixedConcurrencyPlugin, LinearRetryPlugin,
};

/// Concurrency ceiling: no configuration or flag may push the pool past
/// this many in-flight agent invocations.
pub const MAX_CONCURRENCY: usize = 50;

pub fn build_renderer(
    stream_format: &str,
    cfg: &ExecutionConfig,
    verbose: bool,
) -> Arc<dyn OutputRendererPlugin> {
    match stream_format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(cfg.output.pretty_print)),
        // Anything other than jsonl behaves like text.
        _ => Arc::new(TextRendererPlugin::new(cfg.output.ascii_only, verbose)),
    }
}

pub fn build_retry_strategy(cfg: &ExecutionConfig) -> Arc<dyn RetryStrategyPlugin> {
    match cfg.retry.strategy.as_str() {
        "linear" => Arc::new(LinearRetryPlugin::new(cfg.retry.clone())),
        _ => Arc::new(ExponentialBackoffPlugin::new(cfg.retry.clone())),
    }
}

/// An explicit `--num-parallel` pins the pool to `base`; otherwise the
/// configured strategy decides around it. Either way the result respects
/// the hard ceiling.
pub fn build_concurrency_strategy(
    cfg: &ExecutionConfig,
    base: usize,
    pinned: bool,
) -> Arc<dyn ConcurrencyStrategyPlugin> {
    if !pinned && cfg.concurrency.strategy == "adaptive" {
        let mut conc = cfg.concurrency.clone();
        conc.max_concurrency = clamp_concurrency(conc.max_concurrency);
        return Arc::new(AdaptiveConcurrencyPlugin::new(conc));
    }

    Arc::new(FixedConcurrencyPlugin::new(clamp_concurrency(base)))
}

pub fn clamp_concurrency(n: usize) -> usize {
    n.clamp(1, MAX_CONCURRENCY)
}

pub fn build_invoker(cfg: &AgentConfig) -> Arc<dyn AgentInvoker> {
    Arc::new(ProcessInvoker::new(cfg.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::api::{ConcurrencyContext, ExecutionConfig};

    #[test]
    fn requested_concurrency_is_clamped_to_ceiling() {
        let cfg = ExecutionConfig::default();
        let strategy = build_concurrency_strategy(&cfg, 500, true);
        let n = strategy.calculate_concurrency(&ConcurrencyContext {
            pending_tasks: 1000,
            base_concurrency: 500,
        });
        assert_eq!(n, MAX_CONCURRENCY);
    }

    #[test]
    fn zero_concurrency_becomes_one() {
        assert_eq!(clamp_concurrency(0), 1);
    }

    #[test]
    fn renderer_follows_stream_format() {
        let cfg = ExecutionConfig::default();
        assert_eq!(build_renderer("jsonl", &cfg, false).format(), "jsonl");
        assert_eq!(build_renderer("text", &cfg, false).format(), "text");
        assert_eq!(build_renderer("anything", &cfg, false).format(), "text");
    }
}
