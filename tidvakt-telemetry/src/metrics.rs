//! ## tidvakt-telemetry::metrics
//! **Prometheus counters and histograms for scheduler activity**

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: prometheus::Registry,
    pub dispatched_events: prometheus::Counter,
    pub dispatch_warnings: prometheus::Counter,
    pub handler_latency: prometheus::Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let dispatched_events =
            Counter::new("tidvakt_events_total", "Total dispatched simulation events").unwrap();

        let dispatch_warnings = Counter::new(
            "tidvakt_dispatch_warnings_total",
            "Events whose kind had no matching handler branch",
        )
        .unwrap();

        let handler_latency = Histogram::with_opts(
            HistogramOpts::new(
                "tidvakt_handler_latency_ns",
                "Wall-clock time spent inside module handlers",
            )
            .buckets(vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0]),
        )
        .unwrap();

        registry
            .register(Box::new(dispatched_events.clone()))
            .unwrap();
        registry
            .register(Box::new(dispatch_warnings.clone()))
            .unwrap();
        registry.register(Box::new(handler_latency.clone())).unwrap();

        Self {
            registry,
            dispatched_events,
            dispatch_warnings,
            handler_latency,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_gathered_output() {
        let metrics = MetricsRecorder::new();
        metrics.dispatched_events.inc();
        metrics.dispatch_warnings.inc();

        let output = metrics.gather_metrics().unwrap();
        assert!(output.contains("tidvakt_events_total 1"));
        assert!(output.contains("tidvakt_dispatch_warnings_total 1"));
    }
}
