// Timing harness used by the xmss-bench binary

pub mod metrics;
pub mod report;

pub use metrics::BenchmarkMetrics;
pub use report::BenchmarkReport;
