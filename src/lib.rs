mod aggregate;
mod config;
mod error;
mod metrics;
mod path;
mod report;
mod snapshot;
mod speedup;
mod table;
mod utils;

pub use aggregate::*;
pub use config::*;
pub use error::*;
pub use metrics::*;
pub use path::*;
pub use report::*;
pub use snapshot::*;
pub use speedup::*;
pub use table::*;
pub use utils::*;
