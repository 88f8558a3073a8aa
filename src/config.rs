use crate::{CounterSchema, Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs::File, io::BufReader, path::Path, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy name, also the directory holding its runs
    pub name: String,
    /// Matplotlib color of its bars
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    /// Suite name, e.g. SPEC or PARSEC
    pub name: String,
    /// Appended to the benchmark name in result paths, e.g. `_8c_simlarge`
    #[serde(default)]
    pub suffix: String,
    pub benchmarks: Vec<String>,
}

/// A benchmark together with the suite it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Benchmark {
    pub name: String,
    pub suite: String,
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `{policy}/{benchmark}{suffix}/{stats_file}`
    pub stats_dir: PathBuf,
    #[serde(default = "default_stats_file")]
    pub stats_file: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Policy used as speedup denominator
    pub baseline: String,
    /// Width of a single bar, groups are one unit apart
    #[serde(default = "default_bar_width")]
    pub bar_width: f64,
    /// Record NaN for runs that cannot be loaded instead of failing
    #[serde(default)]
    pub allow_missing_runs: bool,
    #[serde(default)]
    pub schema: CounterSchema,
    pub policies: Vec<Policy>,
    pub suites: Vec<Suite>,
}

fn default_stats_file() -> String {
    "zsim-ev.json".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_bar_width() -> f64 {
    0.15
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Config = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.policies.is_empty() {
            return Err(Error::Config("no policy given".to_string()));
        }
        let mut names = HashSet::new();
        for policy in &self.policies {
            if !names.insert(policy.name.as_str()) {
                return Err(Error::Config(format!("policy `{}` listed twice", policy.name)));
            }
        }
        if !names.contains(self.baseline.as_str()) {
            return Err(Error::Config(format!(
                "baseline `{}` is not one of the policies",
                self.baseline
            )));
        }

        let mut benchmarks = HashSet::new();
        for suite in &self.suites {
            for benchmark in &suite.benchmarks {
                if !benchmarks.insert(benchmark.as_str()) {
                    return Err(Error::Config(format!(
                        "benchmark `{}` listed twice",
                        benchmark
                    )));
                }
            }
        }
        if benchmarks.is_empty() {
            return Err(Error::Config("no benchmark given".to_string()));
        }

        if !(self.bar_width > 0.0) {
            return Err(Error::Config(format!(
                "bar width must be positive, got {}",
                self.bar_width
            )));
        }
        Ok(())
    }

    pub fn policy_names(&self) -> Vec<String> {
        self.policies.iter().map(|policy| policy.name.clone()).collect()
    }

    /// All benchmarks, suite by suite, in listed order
    pub fn benchmarks(&self) -> Vec<Benchmark> {
        self.suites
            .iter()
            .flat_map(|suite| {
                suite.benchmarks.iter().map(|name| Benchmark {
                    name: name.clone(),
                    suite: suite.name.clone(),
                    suffix: suite.suffix.clone(),
                })
            })
            .collect()
    }

    /// Contiguous benchmark index range of each suite
    pub fn suite_ranges(&self) -> Vec<(&str, std::ops::Range<usize>)> {
        let mut start = 0;
        self.suites
            .iter()
            .map(|suite| {
                let range = start..start + suite.benchmarks.len();
                start = range.end;
                (suite.name.as_str(), range)
            })
            .collect()
    }

    pub fn color_of(&self, policy: &str) -> Option<&str> {
        self.policies
            .iter()
            .find(|p| p.name == policy)
            .and_then(|p| p.color.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Config {
        serde_json::from_value(json!({
            "stats_dir": "simulation/zsim/outputs/hw4",
            "baseline": "LRU",
            "policies": [
                { "name": "LRU", "color": "tab:blue" },
                { "name": "SRRIP" }
            ],
            "suites": [
                { "name": "SPEC", "benchmarks": ["bzip2", "gcc", "mcf"] },
                { "name": "PARSEC", "suffix": "_8c_simlarge", "benchmarks": ["canneal", "x264"] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn defaults() {
        let config = config();
        config.validate().unwrap();
        assert_eq!(config.stats_file, "zsim-ev.json");
        assert_eq!(config.bar_width, 0.15);
        assert!(!config.allow_missing_runs);
        assert_eq!(config.schema, CounterSchema::default());
        assert_eq!(config.color_of("LRU"), Some("tab:blue"));
        assert_eq!(config.color_of("SRRIP"), None);
    }

    #[test]
    fn benchmarks_follow_suite_order() {
        let config = config();
        let benchmarks = config.benchmarks();
        let names: Vec<_> = benchmarks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["bzip2", "gcc", "mcf", "canneal", "x264"]);
        assert_eq!(benchmarks[3].suite, "PARSEC");
        assert_eq!(benchmarks[3].suffix, "_8c_simlarge");
        assert_eq!(benchmarks[0].suffix, "");
        assert_eq!(
            config.suite_ranges(),
            [("SPEC", 0..3), ("PARSEC", 3..5)]
        );
    }

    #[test]
    fn baseline_must_be_a_policy() {
        let mut config = config();
        config.baseline = "Mockingjay".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn duplicate_benchmark() {
        let mut config = config();
        config.suites[1].benchmarks.push("gcc".to_string());
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn bar_width_positive() {
        let mut config = config();
        config.bar_width = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
