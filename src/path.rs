// simulation output folder structure:
// {stats_dir}/
// \- {policy}/
//    |- {spec-benchmark}/
//    |  \- zsim-ev.json
//    \- {parsec-benchmark}_8c_simlarge/
//       \- zsim-ev.json
//
// analysis output folder structure:
// {output_dir}/
// |- metrics.tsv
// |- summary.json
// |- {metric}.tex
// |- {metric}.png
// |- {metric}-{suite}.png
// |- speedup.tex
// \- speedup.png

use crate::{Benchmark, Config, Metric};
use std::path::{Path, PathBuf};

pub fn get_stats_path<P: AsRef<Path>>(
    stats_dir: P,
    stats_file: &str,
    policy: &str,
    benchmark: &Benchmark,
) -> PathBuf {
    stats_dir
        .as_ref()
        .join(policy)
        .join(format!("{}{}", benchmark.name, benchmark.suffix))
        .join(stats_file)
}

/// Path resolver for [`crate::aggregate`] following the configured layout
pub fn stats_path_resolver(config: &Config) -> impl Fn(&str, &Benchmark) -> PathBuf + '_ {
    move |policy, benchmark| {
        get_stats_path(&config.stats_dir, &config.stats_file, policy, benchmark)
    }
}

pub fn get_tsv_path<P: AsRef<Path>>(output_dir: P) -> PathBuf {
    output_dir.as_ref().join("metrics.tsv")
}

pub fn get_summary_path<P: AsRef<Path>>(output_dir: P) -> PathBuf {
    output_dir.as_ref().join("summary.json")
}

pub fn get_latex_path<P: AsRef<Path>>(output_dir: P, name: &str) -> PathBuf {
    output_dir.as_ref().join(format!("{}.tex", name))
}

pub fn get_chart_path<P: AsRef<Path>>(output_dir: P, name: &str, suite: Option<&str>) -> PathBuf {
    match suite {
        Some(suite) => output_dir.as_ref().join(format!("{}-{}.png", name, suite)),
        None => output_dir.as_ref().join(format!("{}.png", name)),
    }
}

pub fn get_metric_chart_path<P: AsRef<Path>>(
    output_dir: P,
    metric: Metric,
    suite: Option<&str>,
) -> PathBuf {
    get_chart_path(output_dir, metric.name(), suite)
}
