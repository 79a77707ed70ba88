//! Prometheus counters for monitoring invocations

use prometheus::{IntCounter, Registry};

/// Counters updated by the workflow
#[derive(Clone)]
pub struct MonitorMetrics {
    pub resources_evaluated: IntCounter,
    pub quota_exceeded: IntCounter,
    pub utilization_breaches: IntCounter,
    pub action_failures: IntCounter,
    pub pricing_fallbacks: IntCounter,
    pub resources_skipped: IntCounter,
}

impl MonitorMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            resources_evaluated: IntCounter::new(
                "netquota_resources_evaluated_total",
                "Resources whose usage was evaluated",
            )?,
            quota_exceeded: IntCounter::new(
                "netquota_quota_exceeded_total",
                "Resources found over their transfer quota",
            )?,
            utilization_breaches: IntCounter::new(
                "netquota_utilization_breaches_total",
                "Utilization thresholds breached",
            )?,
            action_failures: IntCounter::new(
                "netquota_action_failures_total",
                "Failed or timed out stop, notify and email calls",
            )?,
            pricing_fallbacks: IntCounter::new(
                "netquota_pricing_fallbacks_total",
                "Invocations priced with the fallback flat rate",
            )?,
            resources_skipped: IntCounter::new(
                "netquota_resources_skipped_total",
                "Resources skipped because metrics were unavailable",
            )?,
        })
    }

    /// Register every counter with `registry`
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        for counter in [
            &self.resources_evaluated,
            &self.quota_exceeded,
            &self.utilization_breaches,
            &self.action_failures,
            &self.pricing_fallbacks,
            &self.resources_skipped,
        ] {
            registry.register(Box::new(counter.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Encoder;

    #[test]
    fn test_register_and_encode() {
        let metrics = MonitorMetrics::new().unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();
        metrics.quota_exceeded.inc();

        let mut buffer = Vec::new();
        prometheus::TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("netquota_quota_exceeded_total 1"));

        // Second registration of the same names is rejected
        assert!(metrics.register(&registry).is_err());
    }
}
