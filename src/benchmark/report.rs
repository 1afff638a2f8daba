use std::error::Error;
use std::fs;
use std::path::Path;

use super::metrics::BenchmarkMetrics;

/// Generate benchmark reports in various formats
#[derive(Debug, Default)]
pub struct BenchmarkReport {
    metrics: Vec<BenchmarkMetrics>,
}

impl BenchmarkReport {
    /// Create a new benchmark report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add metrics to the report
    pub fn add_metrics(&mut self, metrics: BenchmarkMetrics) {
        self.metrics.push(metrics);
    }

    pub fn metrics(&self) -> &[BenchmarkMetrics] {
        &self.metrics
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.metrics)
    }

    /// Save report as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Generate a summary of the metrics
    pub fn summary(&self) -> String {
        if self.metrics.is_empty() {
            return "No metrics available".to_string();
        }

        let mut out = String::from("Benchmark Summary:\n");
        for m in &self.metrics {
            out.push_str(&format!(
                "  h={} w={} cache={}: keygen {:.3}s, sign {:.3}ms/sig, verify {:.3}ms/sig, {} bytes/sig\n",
                m.tree_height,
                m.winternitz_parameter,
                m.tree_caching,
                m.key_generation_time.as_secs_f64(),
                m.average_sign_time().as_secs_f64() * 1000.0,
                m.average_verify_time().as_secs_f64() * 1000.0,
                m.signature_size_bytes,
            ));
        }
        out
    }
}
