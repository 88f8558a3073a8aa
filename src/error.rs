use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// the statistics container of a run is absent, unreadable or has no snapshot
    #[error("missing run at {}: {source}", path.display())]
    MissingRun {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// a loaded run whose counters do not match the expected schema
    #[error("bad run {policy} on {benchmark} at {}: {source}", path.display())]
    BadRun {
        policy: String,
        benchmark: String,
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
    #[error("snapshot has no counter group `{0}`")]
    MissingGroup(String),
    #[error("unit {unit} of counter group `{group}` has no counter `{counter}`")]
    MissingCounter {
        group: String,
        unit: usize,
        counter: String,
    },
    #[error("sum of `{counter}` in counter group `{group}` overflows")]
    CounterOverflow { group: String, counter: String },
    #[error("series `{series}` has {actual} values but {expected} benchmarks are charted")]
    LengthMismatch {
        series: String,
        expected: usize,
        actual: usize,
    },
    #[error("unknown policy `{0}`")]
    UnknownPolicy(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn missing_run(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::MissingRun {
            path: path.into(),
            source: source.into(),
        }
    }
}
