//! Compare replacement policies across benchmarks
use anyhow::Context;
use clap::Parser;
use log::info;
use repl_analysis::{
    BarChart, Config, Metric, Summary, aggregate, aggregate_partial, average_speedup,
    derive_speedup, display_path, get_chart_path, get_latex_path, get_metric_chart_path,
    get_summary_path, get_tqdm_style, get_tsv_path, print_metric_table, print_speedup_table,
    render_grouped_bars, stats_path_resolver, write_latex, write_speedup_latex, write_tsv,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to experiment config
    #[arg(short, long)]
    config: PathBuf,

    /// Override the output directory from the config
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Record missing runs as NaN instead of failing
    #[arg(short, long)]
    allow_missing: bool,

    /// Only write tables, skip the charts
    #[arg(long)]
    no_plots: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    println!("Loading experiment config from {}", args.config.display());
    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    config.allow_missing_runs |= args.allow_missing;

    let policies = config.policy_names();
    let benchmarks = config.benchmarks();
    println!(
        "Got {} policies and {} benchmarks, baseline is {}",
        policies.len(),
        benchmarks.len(),
        config.baseline
    );

    let pbar = indicatif::ProgressBar::new((policies.len() * benchmarks.len()) as u64);
    pbar.set_style(get_tqdm_style());
    let resolve = stats_path_resolver(&config);
    let path_for_run = |policy: &str, benchmark: &repl_analysis::Benchmark| {
        pbar.inc(1);
        pbar.set_message(format!("{} on {}", policy, benchmark.name));
        resolve(policy, benchmark)
    };
    let table = if config.allow_missing_runs {
        aggregate_partial(&policies, &benchmarks, path_for_run, &config.schema)
    } else {
        aggregate(&policies, &benchmarks, path_for_run, &config.schema)
    }
    .with_context(|| {
        format!(
            "Failed to collect metrics from {}",
            display_path(&config.stats_dir).display()
        )
    })?;
    pbar.finish_and_clear();

    for metric in Metric::ALL {
        print_metric_table(&table, metric)?;
    }

    let speedups = derive_speedup(&table, &config.baseline)?;
    let averages = average_speedup(&speedups);
    print_speedup_table(table.benchmarks(), &speedups, &averages)?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let tsv_path = get_tsv_path(&config.output_dir);
    write_tsv(&table, &tsv_path)?;
    println!("Metrics written to {}", display_path(&tsv_path).display());

    for metric in Metric::ALL {
        let latex_path = get_latex_path(&config.output_dir, metric.name());
        write_latex(&table, metric, &latex_path)?;
        println!("Table written to {}", display_path(&latex_path).display());
    }
    let latex_path = get_latex_path(&config.output_dir, "speedup");
    write_speedup_latex(table.benchmarks(), &speedups, &averages, &latex_path)?;
    println!("Table written to {}", display_path(&latex_path).display());

    let summary_path = get_summary_path(&config.output_dir);
    Summary {
        baseline: &config.baseline,
        metrics: &table,
        speedups: &speedups,
        average_speedups: &averages,
    }
    .write(&summary_path)?;
    println!("Summary written to {}", display_path(&summary_path).display());

    if args.no_plots {
        return Ok(());
    }

    let color_of = |policy: &str| config.color_of(policy);
    for metric in Metric::ALL {
        let chart = BarChart::from_metric(&table, metric, config.bar_width, color_of);
        let plot_path = get_metric_chart_path(&config.output_dir, metric, None);
        render_grouped_bars(&chart, &plot_path);
        println!("Chart generated to {}", display_path(&plot_path).display());

        // one chart per suite, each on its own slice of the benchmarks
        if config.suites.len() > 1 {
            for (suite, range) in config.suite_ranges() {
                let chart = BarChart::from_metric(
                    &table.slice(range),
                    metric,
                    config.bar_width,
                    color_of,
                );
                let plot_path = get_metric_chart_path(&config.output_dir, metric, Some(suite));
                render_grouped_bars(&chart, &plot_path);
                info!("Chart for {} generated to {}", suite, plot_path.display());
            }
        }
    }

    let chart = BarChart::from_speedup(table.benchmarks(), &speedups, config.bar_width, color_of);
    let plot_path = get_chart_path(&config.output_dir, "speedup", None);
    render_grouped_bars(&chart, &plot_path);
    println!("Chart generated to {}", display_path(&plot_path).display());

    Ok(())
}
