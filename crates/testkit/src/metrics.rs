//! Metrics reports for prediction sweeps.
//!
//! Reports are exported as pretty JSON so CI can diff block counts between
//! runs and spot throughput regressions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level metrics report written by sweeps and benchmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Run identifier
    pub test_name: String,

    /// Timestamp when metrics were collected (RFC 3339)
    pub timestamp: String,

    /// Overall result
    pub result: TestResult,

    /// Sweep metrics, when the run simulated an area
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepMetrics>,

    /// Execution metrics
    pub test_execution: TestExecutionMetrics,
}

/// Overall result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    /// All validations passed
    Pass,
    /// Something failed
    Fail,
    /// Run was skipped or cancelled
    Skip,
}

/// Output and throughput of one area sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepMetrics {
    /// World seed swept
    pub world_seed: i64,
    /// Centre chunk `[x, z]`
    pub center: [i32; 2],
    /// Radius in chunks
    pub radius: i32,
    /// Chunks simulated
    pub chunks_simulated: usize,
    /// Predicted blocks across all ores
    pub blocks_total: usize,
    /// Predicted blocks per ore name
    pub blocks_per_ore: BTreeMap<String, usize>,
    /// Wall-clock time of the sweep (milliseconds)
    pub total_time_ms: f64,
    /// Throughput
    pub chunks_per_second: f64,
}

impl SweepMetrics {
    /// Fill in the throughput from `chunks_simulated` and `total_time_ms`.
    pub fn with_throughput(mut self) -> Self {
        self.chunks_per_second = if self.total_time_ms > 0.0 {
            self.chunks_simulated as f64 / (self.total_time_ms / 1000.0)
        } else {
            0.0
        };
        self
    }
}

/// Execution metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestExecutionMetrics {
    /// Total duration (seconds)
    pub duration_seconds: f64,

    /// Worker threads used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

/// Builder for constructing metrics reports
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Create a new builder, stamped with the current time
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            report: MetricsReport {
                test_name: test_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                result: TestResult::Pass,
                sweep: None,
                test_execution: TestExecutionMetrics::default(),
            },
        }
    }

    /// Set result
    pub fn result(mut self, result: TestResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set sweep metrics
    pub fn sweep(mut self, metrics: SweepMetrics) -> Self {
        self.report.sweep = Some(metrics);
        self
    }

    /// Set execution metrics
    pub fn execution(mut self, metrics: TestExecutionMetrics) -> Self {
        self.report.test_execution = metrics;
        self
    }

    /// Build the metrics report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Sink for writing metrics reports to JSON files
pub struct MetricsSink {
    path: PathBuf,
}

impl MetricsSink {
    /// Create a sink at `path`, creating parent directories as needed
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    /// Write the report as pretty JSON
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write metrics to {}", self.path.display()))
    }
}
