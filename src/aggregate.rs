use crate::{
    Benchmark, CounterSchema, Error, MetricsTable, PolicyMetrics, Result, RunMetrics,
    load_latest_snapshot,
};
use log::{debug, error, info, warn};
use std::path::PathBuf;

/// Collect cycles, IPC and MPKI of every (policy, benchmark) run
///
/// `path_for_run` maps a run to its statistics container. Every run is loaded
/// exactly once. The first run that cannot be loaded aborts the aggregation.
pub fn aggregate<F>(
    policies: &[String],
    benchmarks: &[Benchmark],
    path_for_run: F,
    schema: &CounterSchema,
) -> Result<MetricsTable>
where
    F: Fn(&str, &Benchmark) -> PathBuf,
{
    aggregate_runs(policies, benchmarks, path_for_run, schema, false)
}

/// Like [`aggregate`], but a run without a readable container yields NaN
/// for all of its metrics and a warning instead of an error
pub fn aggregate_partial<F>(
    policies: &[String],
    benchmarks: &[Benchmark],
    path_for_run: F,
    schema: &CounterSchema,
) -> Result<MetricsTable>
where
    F: Fn(&str, &Benchmark) -> PathBuf,
{
    aggregate_runs(policies, benchmarks, path_for_run, schema, true)
}

fn aggregate_runs<F>(
    policies: &[String],
    benchmarks: &[Benchmark],
    path_for_run: F,
    schema: &CounterSchema,
    allow_missing: bool,
) -> Result<MetricsTable>
where
    F: Fn(&str, &Benchmark) -> PathBuf,
{
    let mut columns: Vec<PolicyMetrics> = policies
        .iter()
        .map(|policy| PolicyMetrics::new(policy))
        .collect();
    let mut missing = 0;

    // benchmarks outermost so that every policy sees them in the same order
    for benchmark in benchmarks {
        for column in columns.iter_mut() {
            let path = path_for_run(&column.policy, benchmark);
            debug!(
                "Loading {} on {} from {}",
                column.policy,
                benchmark.name,
                path.display()
            );

            let run = match load_latest_snapshot(&path) {
                Ok(snapshot) => match RunMetrics::extract(&snapshot, schema) {
                    Ok(run) => run,
                    Err(err) => {
                        error!(
                            "Unexpected counters for {} on {}: {}",
                            column.policy, benchmark.name, err
                        );
                        return Err(Error::BadRun {
                            policy: column.policy.clone(),
                            benchmark: benchmark.name.clone(),
                            path,
                            source: Box::new(err),
                        });
                    }
                },
                Err(err @ Error::MissingRun { .. }) if allow_missing => {
                    warn!(
                        "Skipping {} on {}: {}",
                        column.policy, benchmark.name, err
                    );
                    missing += 1;
                    RunMetrics::UNAVAILABLE
                }
                Err(err) => {
                    error!(
                        "Cannot load {} on {}: {}",
                        column.policy, benchmark.name, err
                    );
                    return Err(err);
                }
            };
            column.push(run);
        }
    }

    info!(
        "Aggregated {} runs of {} policies on {} benchmarks ({} missing)",
        policies.len() * benchmarks.len() - missing,
        policies.len(),
        benchmarks.len(),
        missing
    );

    MetricsTable::new(
        benchmarks.iter().map(|benchmark| benchmark.name.clone()).collect(),
        columns,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Metric, get_stats_path};
    use serde_json::json;
    use std::{cell::Cell, path::Path};

    fn benchmark(name: &str) -> Benchmark {
        Benchmark {
            name: name.to_string(),
            suite: "SPEC".to_string(),
            suffix: String::new(),
        }
    }

    fn write_run(path: &Path, cycles: u64, instrs: u64) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let stats = json!({
            "stats": { "root": [
                { "westmere": [ { "cycles": 1, "cCycles": 1, "instrs": 1 } ],
                  "l3": [ { "mGETS": 0, "mGETXIM": 0, "mGETXSM": 0 } ] },
                { "westmere": [
                    { "cycles": cycles, "cCycles": 0, "instrs": instrs },
                    { "cycles": cycles, "cCycles": 0, "instrs": instrs }
                  ],
                  "l3": [ { "mGETS": 6, "mGETXIM": 2, "mGETXSM": 2 } ] }
            ] }
        });
        std::fs::write(path, stats.to_string()).unwrap();
    }

    #[test]
    fn same_snapshot_everywhere_gives_identical_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zsim-ev.json");
        write_run(&path, 500, 1000);

        let policies = vec!["LRU".to_string(), "LFU".to_string(), "SRRIP".to_string()];
        let benchmarks = vec![benchmark("gcc"), benchmark("mcf")];
        let table = aggregate(
            &policies,
            &benchmarks,
            |_, _| path.clone(),
            &CounterSchema::default(),
        )
        .unwrap();

        assert_eq!(table.benchmarks(), ["gcc", "mcf"]);
        for policy in &policies {
            assert_eq!(table.series(policy, Metric::Cycles).unwrap(), [1000.0, 1000.0]);
            assert_eq!(table.series(policy, Metric::Ipc).unwrap(), [2.0, 2.0]);
            assert_eq!(table.series(policy, Metric::Mpki).unwrap(), [5.0, 5.0]);
        }
    }

    #[test]
    fn each_run_is_loaded_once_in_benchmark_order() {
        let dir = tempfile::tempdir().unwrap();
        let policies = vec!["LRU".to_string(), "SRRIP".to_string()];
        let benchmarks = vec![benchmark("bzip2"), benchmark("gcc"), benchmark("mcf")];
        for (i, b) in benchmarks.iter().enumerate() {
            write_run(&get_stats_path(dir.path(), "zsim-ev.json", "LRU", b), 100 * (i as u64 + 1), 10);
            write_run(&get_stats_path(dir.path(), "zsim-ev.json", "SRRIP", b), 50 * (i as u64 + 1), 10);
        }

        let calls = Cell::new(0);
        let table = aggregate(
            &policies,
            &benchmarks,
            |policy, benchmark| {
                calls.set(calls.get() + 1);
                get_stats_path(dir.path(), "zsim-ev.json", policy, benchmark)
            },
            &CounterSchema::default(),
        )
        .unwrap();

        assert_eq!(calls.get(), 6);
        assert_eq!(table.series("LRU", Metric::Cycles).unwrap(), [200.0, 400.0, 600.0]);
        assert_eq!(table.series("SRRIP", Metric::Cycles).unwrap(), [100.0, 200.0, 300.0]);
        assert_eq!(table.policy_names().collect::<Vec<_>>(), ["LRU", "SRRIP"]);
    }

    #[test]
    fn missing_run_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let policies = vec!["LRU".to_string(), "SRRIP".to_string()];
        let benchmarks = vec![benchmark("gcc")];
        write_run(&get_stats_path(dir.path(), "zsim-ev.json", "LRU", &benchmarks[0]), 10, 10);

        let result = aggregate(
            &policies,
            &benchmarks,
            |policy, benchmark| get_stats_path(dir.path(), "zsim-ev.json", policy, benchmark),
            &CounterSchema::default(),
        );
        match result {
            Err(Error::MissingRun { path, .. }) => {
                assert!(path.ends_with("SRRIP/gcc/zsim-ev.json"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn partial_aggregation_records_nan() {
        let dir = tempfile::tempdir().unwrap();
        let policies = vec!["LRU".to_string(), "SRRIP".to_string()];
        let benchmarks = vec![benchmark("gcc"), benchmark("mcf")];
        for b in &benchmarks {
            write_run(&get_stats_path(dir.path(), "zsim-ev.json", "LRU", b), 10, 10);
        }
        write_run(&get_stats_path(dir.path(), "zsim-ev.json", "SRRIP", &benchmarks[1]), 5, 10);

        let table = aggregate_partial(
            &policies,
            &benchmarks,
            |policy, benchmark| get_stats_path(dir.path(), "zsim-ev.json", policy, benchmark),
            &CounterSchema::default(),
        )
        .unwrap();

        let cycles = table.series("SRRIP", Metric::Cycles).unwrap();
        assert!(cycles[0].is_nan());
        assert_eq!(cycles[1], 10.0);
        assert!(table.series("SRRIP", Metric::Ipc).unwrap()[0].is_nan());
        assert_eq!(table.series("LRU", Metric::Cycles).unwrap(), [20.0, 20.0]);
    }

    #[test]
    fn schema_errors_are_fatal_even_when_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zsim-ev.json");
        std::fs::write(
            &path,
            json!({ "stats": { "root": [ { "l3": [] } ] } }).to_string(),
        )
        .unwrap();

        let result = aggregate_partial(
            &["LRU".to_string()],
            &[benchmark("gcc")],
            |_, _| path.clone(),
            &CounterSchema::default(),
        );
        match result {
            Err(Error::BadRun { source, .. }) => {
                assert!(matches!(*source, Error::MissingGroup(ref group) if group == "westmere"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn schema_error_names_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let policies = vec!["LRU".to_string(), "A".to_string()];
        let benchmarks = vec![benchmark("mcf")];
        write_run(&get_stats_path(dir.path(), "zsim-ev.json", "LRU", &benchmarks[0]), 10, 10);
        let broken = get_stats_path(dir.path(), "zsim-ev.json", "A", &benchmarks[0]);
        std::fs::create_dir_all(broken.parent().unwrap()).unwrap();
        std::fs::write(
            &broken,
            json!({ "stats": { "root": [
                { "westmere": [ { "cycles": 1, "cCycles": 0, "instrs": 1 } ] }
            ] } })
            .to_string(),
        )
        .unwrap();

        let err = aggregate(
            &policies,
            &benchmarks,
            |policy, benchmark| get_stats_path(dir.path(), "zsim-ev.json", policy, benchmark),
            &CounterSchema::default(),
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains(&broken.display().to_string()), "{message}");
        assert!(message.contains("A on mcf"), "{message}");
        assert!(message.contains("`l3`"), "{message}");
        match err {
            Error::BadRun {
                policy,
                benchmark,
                path,
                ..
            } => {
                assert_eq!(policy, "A");
                assert_eq!(benchmark, "mcf");
                assert_eq!(path, broken);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
