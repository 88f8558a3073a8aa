use crate::{Error, Metric, Result, RunMetrics};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Per-benchmark metrics of one policy, index-aligned with the benchmark list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyMetrics {
    pub policy: String,
    pub cycles: Vec<f64>,
    pub ipc: Vec<f64>,
    pub mpki: Vec<f64>,
}

impl PolicyMetrics {
    pub fn new(policy: &str) -> Self {
        Self {
            policy: policy.to_string(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, run: RunMetrics) {
        self.cycles.push(run.cycles);
        self.ipc.push(run.ipc);
        self.mpki.push(run.mpki);
    }

    pub fn get(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Cycles => &self.cycles,
            Metric::Ipc => &self.ipc,
            Metric::Mpki => &self.mpki,
        }
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    fn is_aligned(&self) -> bool {
        self.ipc.len() == self.cycles.len() && self.mpki.len() == self.cycles.len()
    }

    fn slice(&self, range: Range<usize>) -> Self {
        Self {
            policy: self.policy.clone(),
            cycles: self.cycles[range.clone()].to_vec(),
            ipc: self.ipc[range.clone()].to_vec(),
            mpki: self.mpki[range].to_vec(),
        }
    }
}

/// policy -> metric -> per-benchmark values
///
/// Policies keep the order they were added in, values keep benchmark order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct MetricsTable {
    benchmarks: Vec<String>,
    policies: Vec<PolicyMetrics>,
}

/// Unchecked form of a table as stored in a summary
#[derive(Deserialize)]
struct RawTable {
    benchmarks: Vec<String>,
    policies: Vec<PolicyMetrics>,
}

impl TryFrom<RawTable> for MetricsTable {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        MetricsTable::new(raw.benchmarks, raw.policies)
    }
}

impl MetricsTable {
    /// Build a table, checking that every series has one value per benchmark
    pub fn new(benchmarks: Vec<String>, policies: Vec<PolicyMetrics>) -> Result<Self> {
        for (i, metrics) in policies.iter().enumerate() {
            if !metrics.is_aligned() || metrics.len() != benchmarks.len() {
                let actual = [metrics.cycles.len(), metrics.ipc.len(), metrics.mpki.len()]
                    .into_iter()
                    .find(|len| *len != benchmarks.len())
                    .unwrap_or(metrics.len());
                return Err(Error::LengthMismatch {
                    series: metrics.policy.clone(),
                    expected: benchmarks.len(),
                    actual,
                });
            }
            if policies[..i].iter().any(|other| other.policy == metrics.policy) {
                return Err(Error::Config(format!(
                    "policy `{}` appears twice",
                    metrics.policy
                )));
            }
        }
        Ok(Self {
            benchmarks,
            policies,
        })
    }

    pub fn benchmarks(&self) -> &[String] {
        &self.benchmarks
    }

    pub fn policies(&self) -> &[PolicyMetrics] {
        &self.policies
    }

    pub fn policy_names(&self) -> impl Iterator<Item = &str> {
        self.policies.iter().map(|metrics| metrics.policy.as_str())
    }

    pub fn policy(&self, policy: &str) -> Option<&PolicyMetrics> {
        self.policies.iter().find(|metrics| metrics.policy == policy)
    }

    pub fn series(&self, policy: &str, metric: Metric) -> Option<&[f64]> {
        self.policy(policy).map(|metrics| metrics.get(metric))
    }

    /// Number of benchmarks
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Restrict every policy to a contiguous range of benchmarks
    ///
    /// The range is clamped to the table.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let range = range.start.min(end)..end;
        Self {
            benchmarks: self.benchmarks[range.clone()].to_vec(),
            policies: self
                .policies
                .iter()
                .map(|metrics| metrics.slice(range.clone()))
                .collect(),
        }
    }

    /// The first `n` benchmarks
    pub fn head(&self, n: usize) -> Self {
        self.slice(0..n)
    }

    /// Everything after the first `n` benchmarks
    pub fn tail(&self, n: usize) -> Self {
        self.slice(n..self.len())
    }

    pub fn split_at(&self, n: usize) -> (Self, Self) {
        (self.head(n), self.tail(n))
    }
}
