#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Partitions a machine's logical CPUs into disjoint, NUMA-aware pools and expresses each pool
//! as a compact CPU range string for pinning tools such as `taskset` or container cpusets.
//!
//! The input is a topology listing with one whitespace-separated `CPU NODE CORE` row per logical
//! CPU, as produced by `lscpu -e=CPU,NODE,CORE`. The comma-separated `lscpu -p` format is not
//! supported; its rows are skipped like any other malformed line. From the listing, this crate
//! can:
//!
//! * list the NUMA nodes of the machine ([`TopologyTable::distinct_nodes()`]),
//! * list every CPU of a node or only the primary thread of each physical core
//!   ([`TopologyTable::all_cpus_on_node()`], [`TopologyTable::primary_cpus_on_node()`]),
//! * split the machine into named pools according to a [`PoolPlan`] ([`allocate()`]),
//! * strip unit suffixes from memory sizes ([`extract_numeric_value()`]).
//!
//! Range strings are produced and consumed by the [`cpu_ranges`] crate, whose core types are
//! re-exported here.
//!
//! # Example
//!
//! ```
//! use numa_pools::{PoolPlan, TopologyTable, allocate};
//!
//! let table = TopologyTable::parse(
//!     "0 0 0\n1 0 0\n2 0 1\n3 0 1\n\
//!      32 1 16\n33 1 16\n34 1 17\n35 1 17\n\
//!      64 2 32\n65 2 32\n66 2 33\n67 2 33",
//! );
//!
//! let allocation = allocate(&table, &PoolPlan::default()).unwrap();
//!
//! assert_eq!(allocation.pool("housekeeping").unwrap().range(), "0-3");
//! assert_eq!(allocation.pool("load_generator").unwrap().range(), "32,34");
//! assert_eq!(allocation.pool("server").unwrap().range(), "64,66");
//! ```

mod allocation;
mod error;
mod extract;
mod pal;
mod plan;
mod size;
mod topology;
mod types;

use std::path::{Path, PathBuf};

pub use allocation::*;
pub use cpu_ranges::{CpuId, CpuList, CpuSet};
pub use error::*;
use itertools::Itertools;
use pal::{Filesystem, FilesystemFacade};
pub use plan::*;
pub use size::*;
pub use topology::*;
use tracing::debug;
pub use types::*;

/// Identifies a NUMA node, matching the numbering used by the operating system.
pub type NodeId = u32;

/// Identifies a physical core. Only meaningful as a grouping key within one topology listing.
pub type CoreId = u32;

/// Core logic of the `numa-pools` tool, extracted for testability.
///
/// Returns the text the tool prints to standard output on success.
///
/// # Errors
///
/// Returns an error if an input cannot be read or parsed, or if the requested operation fails.
#[doc(hidden)]
pub fn run(command: &Command) -> Result<String> {
    run_with_filesystem(command, &FilesystemFacade::target())
}

fn run_with_filesystem(command: &Command, fs: &impl Filesystem) -> Result<String> {
    debug!(?command, "running");

    match command {
        Command::Encode { cpus } => Ok(CpuList::Text(cpus.clone()).to_range_string()?),
        Command::Merge { ranges } => Ok(cpu_ranges::merge(ranges)?),
        Command::Nodes { topology } => {
            let table = read_topology(topology, fs)?;
            Ok(table.distinct_nodes().iter().join(","))
        }
        Command::Cpus {
            topology,
            node,
            primary,
        } => {
            let table = read_topology(topology, fs)?;

            let cpus = if *primary {
                table.primary_cpus_on_node(*node)
            } else {
                table.all_cpus_on_node(*node)
            };

            Ok(cpu_ranges::encode(cpus))
        }
        Command::Plan { topology, config } => {
            let plan = match config {
                Some(path) => PoolPlan::from_toml(&read_file(path, fs)?)?,
                None => PoolPlan::default(),
            };

            let table = read_topology(topology, fs)?;

            Ok(allocate(&table, &plan)?.to_env_lines().join("\n"))
        }
        Command::Size { value } => Ok(extract_numeric_value(value.as_str())?.to_string()),
    }
}

fn read_topology(source: &TopologySource, fs: &impl Filesystem) -> Result<TopologyTable> {
    let raw = match source {
        TopologySource::Stdin => fs.read_stdin().map_err(|source| Error::Io {
            path: PathBuf::from("-"),
            source,
        })?,
        TopologySource::File(path) => read_file(path, fs)?,
    };

    Ok(TopologyTable::parse(&raw))
}

fn read_file(path: &Path, fs: &impl Filesystem) -> Result<String> {
    fs.read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
