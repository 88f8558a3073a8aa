use crate::{Error, Result, Snapshot};
use serde::{Deserialize, Serialize};

/// per-core counters
pub const CORE_CYCLES: &str = "cycles";
pub const CORE_CONTENTION_CYCLES: &str = "cCycles";
pub const CORE_INSTRUCTIONS: &str = "instrs";

/// last-level cache miss counters: GETS misses, GETX misses on invalid and on shared lines
pub const LLC_MISSES: [&str; 3] = ["mGETS", "mGETXIM", "mGETXSM"];

/// Where the counters live inside a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSchema {
    /// group named after the core microarchitecture
    #[serde(default = "default_core_group")]
    pub core_group: String,
    #[serde(default = "default_llc_group")]
    pub llc_group: String,
}

fn default_core_group() -> String {
    "westmere".to_string()
}

fn default_llc_group() -> String {
    "l3".to_string()
}

impl Default for CounterSchema {
    fn default() -> Self {
        Self {
            core_group: default_core_group(),
            llc_group: default_llc_group(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cycles,
    Ipc,
    Mpki,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cycles, Metric::Ipc, Metric::Mpki];

    /// Name used in file names and column keys
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Cycles => "cycles",
            Metric::Ipc => "ipc",
            Metric::Mpki => "mpki",
        }
    }

    /// Axis label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Cycles => "Cycles",
            Metric::Ipc => "IPC",
            Metric::Mpki => "LLC MPKI",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Total cycles across cores: active plus contention cycles, summed rather than averaged
pub fn cycles(snapshot: &Snapshot, schema: &CounterSchema) -> Result<f64> {
    let cores = snapshot.group(&schema.core_group)?;
    let active = cores.total(&schema.core_group, CORE_CYCLES)?;
    let contention = cores.total(&schema.core_group, CORE_CONTENTION_CYCLES)?;
    let total = active
        .checked_add(contention)
        .ok_or_else(|| Error::CounterOverflow {
            group: schema.core_group.clone(),
            counter: format!("{}+{}", CORE_CYCLES, CORE_CONTENTION_CYCLES),
        })?;
    Ok(total as f64)
}

/// Retired instructions across cores
pub fn instructions(snapshot: &Snapshot, schema: &CounterSchema) -> Result<f64> {
    let cores = snapshot.group(&schema.core_group)?;
    Ok(cores.total(&schema.core_group, CORE_INSTRUCTIONS)? as f64)
}

/// Last-level cache misses across banks
pub fn llc_misses(snapshot: &Snapshot, schema: &CounterSchema) -> Result<f64> {
    let llc = snapshot.group(&schema.llc_group)?;
    let mut misses = 0u64;
    for counter in LLC_MISSES {
        misses = misses
            .checked_add(llc.total(&schema.llc_group, counter)?)
            .ok_or_else(|| Error::CounterOverflow {
                group: schema.llc_group.clone(),
                counter: LLC_MISSES.join("+"),
            })?;
    }
    Ok(misses as f64)
}

/// Divide, yielding NaN for a zero denominator instead of an infinity
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Instructions per cycle, NaN without retired instructions
pub fn ipc(snapshot: &Snapshot, schema: &CounterSchema) -> Result<f64> {
    Ok(RunMetrics::extract(snapshot, schema)?.ipc)
}

/// LLC misses per kilo instructions, NaN without retired instructions
pub fn mpki(snapshot: &Snapshot, schema: &CounterSchema) -> Result<f64> {
    Ok(RunMetrics::extract(snapshot, schema)?.mpki)
}

/// All metrics of one (policy, benchmark) run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub cycles: f64,
    pub ipc: f64,
    pub mpki: f64,
}

impl RunMetrics {
    /// Metrics of a run that could not be loaded
    pub const UNAVAILABLE: RunMetrics = RunMetrics {
        cycles: f64::NAN,
        ipc: f64::NAN,
        mpki: f64::NAN,
    };

    pub fn extract(snapshot: &Snapshot, schema: &CounterSchema) -> Result<Self> {
        // ipc must be derived from the very cycle count that is reported
        let cycles = cycles(snapshot, schema)?;
        let instructions = instructions(snapshot, schema)?;
        let misses = llc_misses(snapshot, schema)?;

        let ipc = if instructions == 0.0 {
            f64::NAN
        } else {
            instructions / cycles
        };
        let mpki = ratio(misses, instructions) * 1000.0;
        Ok(Self { cycles, ipc, mpki })
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cycles => self.cycles,
            Metric::Ipc => self.ipc,
            Metric::Mpki => self.mpki,
        }
    }
}
