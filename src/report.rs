//! Tables and charts built from aggregated metrics
use crate::{
    AverageSpeedup, Error, Metric, MetricsTable, Result, SpeedupSeries, format_value, nan_mean,
};
use cli_table::{Cell, CellStruct, Table, print_stdout};
use log::warn;
use matplotlib::{Matplotlib, Mpl, Run, serde_json::Value};
use serde::Serialize;
use std::path::Path;

fn precision(metric: Metric) -> usize {
    match metric {
        // cycles are integral counts
        Metric::Cycles => 0,
        Metric::Ipc | Metric::Mpki => 4,
    }
}

/// Write every metric of every policy as tab separated values,
/// one row per benchmark and one `{policy}_{metric}` column per series
pub fn write_tsv<P: AsRef<Path>>(table: &MetricsTable, path: P) -> Result<()> {
    let mut content = String::from("Benchmark");
    for policy in table.policy_names() {
        for metric in Metric::ALL {
            content.push_str(&format!("\t{}_{}", policy, metric.name()));
        }
    }
    content.push('\n');

    for (i, benchmark) in table.benchmarks().iter().enumerate() {
        content.push_str(benchmark);
        for metrics in table.policies() {
            for metric in Metric::ALL {
                content.push('\t');
                content.push_str(&format_value(metrics.get(metric)[i], precision(metric)));
            }
        }
        content.push('\n');
    }

    std::fs::write(path, content)?;
    Ok(())
}

fn latex_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '_' | '%' | '&' | '#' | '$' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

fn latex_value(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "--".to_string()
    } else {
        format!("{:.*}", precision, value)
    }
}

fn latex_tabular(header: &[String], rows: &[Vec<String>], footer: Option<&[String]>) -> String {
    let mut content = format!(
        "% generated on {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    content.push_str(&format!(
        "\\begin{{tabular}}{{l|{}}}\n",
        "r".repeat(header.len().saturating_sub(1))
    ));
    content.push_str("\\hline\n");
    content.push_str(&format!("{} \\\\\n", header.join(" & ")));
    content.push_str("\\hline\n");
    for row in rows {
        content.push_str(&format!("{} \\\\\n", row.join(" & ")));
    }
    if let Some(footer) = footer {
        content.push_str("\\hline\n");
        content.push_str(&format!("{} \\\\\n", footer.join(" & ")));
    }
    content.push_str("\\hline\n\\end{tabular}\n");
    content
}

/// Write one metric as a LaTeX tabular, benchmarks as rows and policies as columns
pub fn write_latex<P: AsRef<Path>>(table: &MetricsTable, metric: Metric, path: P) -> Result<()> {
    let mut header = vec!["Benchmark".to_string()];
    header.extend(table.policy_names().map(latex_escape));

    let rows: Vec<Vec<String>> = table
        .benchmarks()
        .iter()
        .enumerate()
        .map(|(i, benchmark)| {
            let mut row = vec![latex_escape(benchmark)];
            row.extend(
                table
                    .policies()
                    .iter()
                    .map(|metrics| latex_value(metrics.get(metric)[i], precision(metric))),
            );
            row
        })
        .collect();

    std::fs::write(path, latex_tabular(&header, &rows, None))?;
    Ok(())
}

/// Speedup series that cover every benchmark, the others are logged and left out
fn fitting_series<'a>(
    table: &str,
    benchmarks: &[String],
    speedups: &'a [SpeedupSeries],
) -> Vec<&'a SpeedupSeries> {
    speedups
        .iter()
        .filter(|series| {
            match check_series_length(&series.policy, series.values.len(), benchmarks.len()) {
                Ok(()) => true,
                Err(err) => {
                    warn!("Skipping series of table \"{}\": {}", table, err);
                    false
                }
            }
        })
        .collect()
}

/// Average speedup of a policy in percent, NaN if none was computed
fn average_percent(averages: &[AverageSpeedup], policy: &str) -> f64 {
    averages
        .iter()
        .find(|average| average.policy == policy)
        .map_or(f64::NAN, |average| average.percent)
}

/// Write per-benchmark speedups with the average speedup in percent as last row
pub fn write_speedup_latex<P: AsRef<Path>>(
    benchmarks: &[String],
    speedups: &[SpeedupSeries],
    averages: &[AverageSpeedup],
    path: P,
) -> Result<()> {
    let speedups = fitting_series("speedup", benchmarks, speedups);
    let mut header = vec!["Benchmark".to_string()];
    header.extend(speedups.iter().map(|series| latex_escape(&series.policy)));

    let mut rows = vec![];
    for (i, benchmark) in benchmarks.iter().enumerate() {
        let mut row = vec![latex_escape(benchmark)];
        for series in &speedups {
            row.push(latex_value(series.values[i], 3));
        }
        rows.push(row);
    }

    let mut footer = vec!["Average (\\%)".to_string()];
    footer.extend(
        speedups
            .iter()
            .map(|series| latex_value(average_percent(averages, &series.policy), 2)),
    );

    std::fs::write(path, latex_tabular(&header, &rows, Some(&footer)))?;
    Ok(())
}

/// Everything computed by one analysis, NaN is stored as `null`
#[derive(Debug, Clone, Serialize)]
pub struct Summary<'a> {
    pub baseline: &'a str,
    pub metrics: &'a MetricsTable,
    pub speedups: &'a [SpeedupSeries],
    pub average_speedups: &'a [AverageSpeedup],
}

impl Summary<'_> {
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

fn to_cells(rows: Vec<Vec<String>>) -> Vec<Vec<CellStruct>> {
    rows.into_iter()
        .map(|row| row.into_iter().map(|text| text.cell()).collect())
        .collect()
}

/// Rows of the terminal table of one metric, the column averages last
fn metric_rows(table: &MetricsTable, metric: Metric) -> Vec<Vec<String>> {
    let mut rows = vec![];
    for (i, benchmark) in table.benchmarks().iter().enumerate() {
        let mut row = vec![benchmark.clone()];
        for metrics in table.policies() {
            row.push(format_value(metrics.get(metric)[i], precision(metric)));
        }
        rows.push(row);
    }

    let mut average = vec!["Average".to_string()];
    for metrics in table.policies() {
        average.push(format_value(nan_mean(metrics.get(metric)), precision(metric)));
    }
    rows.push(average);
    rows
}

/// Print one metric of all policies to the terminal, with a column average
pub fn print_metric_table(table: &MetricsTable, metric: Metric) -> Result<()> {
    let rows = to_cells(metric_rows(table, metric));
    let mut title = vec![format!("Benchmark ({})", metric.label()).cell()];
    title.extend(table.policy_names().map(|policy| policy.cell()));
    print_stdout(rows.table().title(title))?;
    Ok(())
}

/// Print speedups over the baseline, with the average speedup in percent
pub fn print_speedup_table(
    benchmarks: &[String],
    speedups: &[SpeedupSeries],
    averages: &[AverageSpeedup],
) -> Result<()> {
    let mut rows = speedup_rows(benchmarks, speedups, averages);
    let title: Vec<CellStruct> = rows.remove(0).into_iter().map(|text| text.cell()).collect();
    print_stdout(to_cells(rows).table().title(title))?;
    Ok(())
}

/// Title row, one row per benchmark, then the average speedups in percent
fn speedup_rows(
    benchmarks: &[String],
    speedups: &[SpeedupSeries],
    averages: &[AverageSpeedup],
) -> Vec<Vec<String>> {
    let speedups = fitting_series("speedup", benchmarks, speedups);
    let mut title = vec!["Benchmark (speedup)".to_string()];
    title.extend(speedups.iter().map(|series| series.policy.clone()));

    let mut rows = vec![title];
    for (i, benchmark) in benchmarks.iter().enumerate() {
        let mut row = vec![benchmark.clone()];
        for series in &speedups {
            row.push(format_value(series.values[i], 3));
        }
        rows.push(row);
    }

    let mut average = vec!["Average (%)".to_string()];
    for series in &speedups {
        average.push(format_value(average_percent(averages, &series.policy), 2));
    }
    rows.push(average);
    rows
}

pub fn check_series_length(series: &str, actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            series: series.to_string(),
            expected,
            actual,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    pub color: Option<String>,
    pub values: Vec<f64>,
}

/// Grouped bar chart: one group per benchmark, one bar per policy
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub ylabel: String,
    pub labels: Vec<String>,
    pub series: Vec<BarSeries>,
    pub bar_width: f64,
    /// dashed horizontal reference line
    pub reference: Option<f64>,
}

impl BarChart {
    pub fn new(title: &str, ylabel: &str, labels: &[String], bar_width: f64) -> Self {
        Self {
            title: title.to_string(),
            ylabel: ylabel.to_string(),
            labels: labels.to_vec(),
            series: vec![],
            bar_width,
            reference: None,
        }
    }

    /// Add a series, refusing one whose length differs from the labels
    pub fn add_series(&mut self, series: BarSeries) -> Result<()> {
        check_series_length(&series.name, series.values.len(), self.labels.len())?;
        self.series.push(series);
        Ok(())
    }

    /// Add a series, logging and dropping it if it does not fit
    pub fn add_series_or_skip(&mut self, series: BarSeries) {
        if let Err(err) = self.add_series(series) {
            warn!("Skipping series of chart \"{}\": {}", self.title, err);
        }
    }

    pub fn from_metric<'a>(
        table: &MetricsTable,
        metric: Metric,
        bar_width: f64,
        color_of: impl Fn(&str) -> Option<&'a str>,
    ) -> Self {
        let mut chart = Self::new(metric.label(), metric.label(), table.benchmarks(), bar_width);
        for metrics in table.policies() {
            chart.add_series_or_skip(BarSeries {
                name: metrics.policy.clone(),
                color: color_of(&metrics.policy).map(str::to_string),
                values: metrics.get(metric).to_vec(),
            });
        }
        chart
    }

    pub fn from_speedup<'a>(
        benchmarks: &[String],
        speedups: &[SpeedupSeries],
        bar_width: f64,
        color_of: impl Fn(&str) -> Option<&'a str>,
    ) -> Self {
        let mut chart = Self::new("Speedup", "Speedup over baseline", benchmarks, bar_width);
        chart.reference = Some(1.0);
        for series in speedups {
            chart.add_series_or_skip(BarSeries {
                name: series.policy.clone(),
                color: color_of(&series.policy).map(str::to_string),
                values: series.values.clone(),
            });
        }
        chart
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CustomPrelude;

impl Matplotlib for CustomPrelude {
    fn is_prelude(&self) -> bool {
        true
    }

    fn data(&self) -> Option<Value> {
        None
    }

    fn py_cmd(&self) -> String {
        "\
import json
import matplotlib
matplotlib.use(\"Agg\")
import matplotlib.pyplot as plt
import numpy as np
"
        .into()
    }
}

impl Matplotlib for BarChart {
    fn is_prelude(&self) -> bool {
        false
    }

    fn data(&self) -> Option<Value> {
        let series: Vec<Value> = self
            .series
            .iter()
            .map(|series| {
                let mut object = matplotlib::serde_json::Map::new();
                object.insert("name".into(), Value::from(series.name.as_str()));
                object.insert(
                    "color".into(),
                    series
                        .color
                        .as_deref()
                        .map(Value::from)
                        .unwrap_or(Value::Null),
                );
                // NaN becomes null, plotted as a missing bar
                object.insert(
                    "values".into(),
                    Value::from_iter(series.values.iter().map(|value| Value::from(*value))),
                );
                Value::Object(object)
            })
            .collect();

        let mut object = matplotlib::serde_json::Map::new();
        object.insert("title".into(), Value::from(self.title.as_str()));
        object.insert("ylabel".into(), Value::from(self.ylabel.as_str()));
        object.insert(
            "labels".into(),
            Value::from_iter(self.labels.iter().map(|label| Value::from(label.as_str()))),
        );
        object.insert("width".into(), Value::from(self.bar_width));
        object.insert(
            "reference".into(),
            self.reference.map(Value::from).unwrap_or(Value::Null),
        );
        object.insert("series".into(), Value::Array(series));
        Some(Value::Object(object))
    }

    fn py_cmd(&self) -> String {
        "\
labels = data[\"labels\"]
width = data[\"width\"]
fig, ax = plt.subplots(figsize=(max(6.4, 0.6 * len(labels)), 4.8))
x = np.arange(len(labels))
n = len(data[\"series\"])
for (k, s) in enumerate(data[\"series\"]):
    offset = (k - (n - 1) / 2) * width
    kwargs = {} if s[\"color\"] is None else {\"color\": s[\"color\"]}
    ax.bar(x + offset, np.array(s[\"values\"], dtype=float), width, label=s[\"name\"], **kwargs)
if data[\"reference\"] is not None:
    ax.axhline(data[\"reference\"], color=\"black\", linewidth=0.8, linestyle=\"--\")
ax.set_xticks(x)
ax.set_xticklabels(labels, rotation=45, ha=\"right\")
ax.set_ylabel(data[\"ylabel\"])
ax.set_title(data[\"title\"])
if n > 0:
    ax.legend(ncol=min(n, 6), fontsize=\"small\")
fig.tight_layout()
"
        .into()
    }
}

/// Render a grouped bar chart to an image file
pub fn render_grouped_bars<P: AsRef<Path>>(chart: &BarChart, path: P) {
    Mpl::new() & CustomPrelude & chart.clone() | Run::Save(path.as_ref().to_path_buf());
}
