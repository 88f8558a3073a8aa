// statistics container layout, as exported from zsim's hdf5 output:
// {
//   "stats": {
//     "root": [
//       { "<group>": [ { "<counter>": <u64>, ... }, ... ], ... },  <- earlier phases
//       ...
//       { ... }                                                      <- final phase
//     ]
//   }
// }
// a group is an array with one entry per hardware unit (core, cache bank)
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

/// Counters of one hardware unit
pub type Counters = BTreeMap<String, serde_json::Value>;

/// Counters of all units of one kind, e.g. all cores or all l3 banks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterGroup {
    units: Vec<Counters>,
}

impl CounterGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit with the given counters
    pub fn push<S: Into<String>>(&mut self, counters: impl IntoIterator<Item = (S, u64)>) {
        self.units.push(
            counters
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        );
    }

    pub fn with_unit<S: Into<String>>(
        mut self,
        counters: impl IntoIterator<Item = (S, u64)>,
    ) -> Self {
        self.push(counters);
        self
    }

    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    /// Sum a counter across all units, zero for an empty group
    pub fn total(&self, group: &str, counter: &str) -> Result<u64> {
        let mut sum = 0u64;
        for (unit, counters) in self.units.iter().enumerate() {
            let value = counters
                .get(counter)
                .and_then(serde_json::Value::as_u64)
                .ok_or_else(|| Error::MissingCounter {
                    group: group.to_string(),
                    unit,
                    counter: counter.to_string(),
                })?;
            sum = sum
                .checked_add(value)
                .ok_or_else(|| Error::CounterOverflow {
                    group: group.to_string(),
                    counter: counter.to_string(),
                })?;
        }
        Ok(sum)
    }
}

/// Anything recorded at the top level of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Group(CounterGroup),
    /// scalars and nested records we do not interpret
    Other(serde_json::Value),
}

/// One point-in-time dump of the simulator counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    nodes: BTreeMap<String, Node>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, name: &str, group: CounterGroup) -> Self {
        self.nodes.insert(name.to_string(), Node::Group(group));
        self
    }

    pub fn group(&self, name: &str) -> Result<&CounterGroup> {
        match self.nodes.get(name) {
            Some(Node::Group(group)) => Ok(group),
            _ => Err(Error::MissingGroup(name.to_string())),
        }
    }

    /// Names of the counter groups in this snapshot
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|(name, node)| match node {
            Node::Group(_) => Some(name.as_str()),
            Node::Other(_) => None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsTree {
    /// snapshots in recording order
    pub root: Vec<Snapshot>,
}

/// A whole statistics container of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsFile {
    pub stats: StatsTree,
}

impl StatsFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| Error::missing_run(path, err))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|err| Error::missing_run(path, err))
    }

    pub fn snapshot_count(&self) -> usize {
        self.stats.root.len()
    }

    /// The final snapshot, holding end-of-run cumulative counters
    pub fn latest(&self) -> Option<&Snapshot> {
        self.stats.root.last()
    }

    pub fn into_latest(mut self) -> Option<Snapshot> {
        self.stats.root.pop()
    }
}

/// Load the last recorded snapshot of a run, earlier snapshots are discarded
pub fn load_latest_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let path = path.as_ref();
    // the file is closed once parsed
    let stats = StatsFile::open(path)?;
    stats
        .into_latest()
        .ok_or_else(|| Error::missing_run(path, "no snapshot recorded under stats/root"))
}
