use clap::Parser;
use cli_table::{Cell, Table, print_stdout};
use repl_analysis::{
    CORE_CONTENTION_CYCLES, CORE_CYCLES, CORE_INSTRUCTIONS, CounterSchema, LLC_MISSES, Metric,
    RunMetrics, StatsFile, format_value,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to statistics container
    stats: PathBuf,

    /// Counter group of the cores
    #[arg(long, default_value = "westmere")]
    core_group: String,

    /// Counter group of the last-level cache
    #[arg(long, default_value = "l3")]
    llc_group: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let schema = CounterSchema {
        core_group: args.core_group,
        llc_group: args.llc_group,
    };

    let stats = StatsFile::open(&args.stats)?;
    println!("Got {} snapshots", stats.snapshot_count());
    let Some(snapshot) = stats.latest() else {
        anyhow::bail!("No snapshot recorded in {}", args.stats.display());
    };
    println!(
        "Counter groups in the last snapshot: {}",
        snapshot.group_names().collect::<Vec<_>>().join(", ")
    );

    let cores = snapshot.group(&schema.core_group)?;
    let llc = snapshot.group(&schema.llc_group)?;
    println!(
        "- {}: {} cores, {} cycles, {} contention cycles, {} instructions",
        schema.core_group,
        cores.num_units(),
        cores.total(&schema.core_group, CORE_CYCLES)?,
        cores.total(&schema.core_group, CORE_CONTENTION_CYCLES)?,
        cores.total(&schema.core_group, CORE_INSTRUCTIONS)?,
    );
    print!("- {}: {} banks", schema.llc_group, llc.num_units());
    for counter in LLC_MISSES {
        print!(", {} {}", llc.total(&schema.llc_group, counter)?, counter);
    }
    println!();

    let run = RunMetrics::extract(snapshot, &schema)?;
    let table = Metric::ALL
        .iter()
        .map(|metric| vec![metric.label().cell(), format_value(run.get(*metric), 4).cell()])
        .collect::<Vec<_>>()
        .table()
        .title(vec!["Metric".cell(), "Value".cell()]);
    print_stdout(table)?;

    Ok(())
}
