use anyhow::Result;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Retrieval counters, kept in a registry owned by the service rather than the
/// process-wide default one.
pub struct Metrics {
    registry: Registry,
    process_total: IntCounterVec,
    degraded_total: IntCounterVec,
    retrieval_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let process_total = IntCounterVec::new(
            Opts::new("rag_process_total", "Processed utterances by outcome"),
            &["outcome"],
        )?;
        let degraded_total = IntCounterVec::new(
            Opts::new("rag_degraded_total", "Utterances passed through without context, by reason"),
            &["reason"],
        )?;
        let retrieval_seconds = HistogramVec::new(
            HistogramOpts::new("rag_retrieval_seconds", "Deadline-bounded retrieval duration")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0]),
            &["format"],
        )?;

        registry.register(Box::new(process_total.clone()))?;
        registry.register(Box::new(degraded_total.clone()))?;
        registry.register(Box::new(retrieval_seconds.clone()))?;

        Ok(Self {
            registry,
            process_total,
            degraded_total,
            retrieval_seconds,
        })
    }

    pub fn record_used(&self) {
        self.process_total.with_label_values(&["used"]).inc();
    }

    pub fn record_degraded(&self, reason: &str) {
        self.process_total.with_label_values(&["passthrough"]).inc();
        self.degraded_total.with_label_values(&[reason]).inc();
    }

    pub fn observe_retrieval(&self, format: &str, elapsed: Duration) {
        self.retrieval_seconds
            .with_label_values(&[format])
            .observe(elapsed.as_secs_f64());
    }

    /// Text exposition format for `/metrics`.
    pub fn render(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_series() {
        let metrics = Metrics::new().unwrap();
        metrics.record_used();
        metrics.record_degraded("timeout");
        metrics.observe_retrieval("modern", Duration::from_millis(120));

        let text = String::from_utf8(metrics.render().unwrap()).unwrap();
        assert!(text.contains("rag_process_total{outcome=\"used\"} 1"));
        assert!(text.contains("rag_degraded_total{reason=\"timeout\"} 1"));
        assert!(text.contains("rag_retrieval_seconds_count{format=\"modern\"} 1"));
    }
}
