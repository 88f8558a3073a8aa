use crate::{Error, Metric, MetricsTable, Result};
use serde::{Deserialize, Serialize};

/// Per-benchmark speedup of a policy over the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedupSeries {
    pub policy: String,
    /// baseline cycles / policy cycles, NaN for zero policy cycles
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageSpeedup {
    pub policy: String,
    /// mean speedup in percent, NaN without any valid benchmark
    pub percent: f64,
}

/// Speedup of every policy in the table over `baseline`, in table order
pub fn derive_speedup(table: &MetricsTable, baseline: &str) -> Result<Vec<SpeedupSeries>> {
    let baseline_cycles = table
        .series(baseline, Metric::Cycles)
        .ok_or_else(|| Error::UnknownPolicy(baseline.to_string()))?;

    Ok(table
        .policies()
        .iter()
        .map(|metrics| {
            let values = if metrics.policy == baseline {
                // constant one, never computed by self-division
                vec![1.0; baseline_cycles.len()]
            } else {
                baseline_cycles
                    .iter()
                    .zip(&metrics.cycles)
                    .map(|(base, cycles)| {
                        if *cycles == 0.0 {
                            f64::NAN
                        } else {
                            base / cycles
                        }
                    })
                    .collect()
            };
            SpeedupSeries {
                policy: metrics.policy.clone(),
                values,
            }
        })
        .collect())
}

/// Mean of the non-NaN values, NaN if there are none
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|value| !value.is_nan())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

pub fn average_speedup(speedups: &[SpeedupSeries]) -> Vec<AverageSpeedup> {
    speedups
        .iter()
        .map(|series| {
            let percent: Vec<f64> = series.values.iter().map(|value| value * 100.0).collect();
            AverageSpeedup {
                policy: series.policy.clone(),
                percent: nan_mean(&percent),
            }
        })
        .collect()
}
