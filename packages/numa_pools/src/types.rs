// Public API types for the numa-pools tool.
//
// main.rs translates command-line arguments into these types and hands them to `run()`.

use std::path::{Path, PathBuf};

/// Where to read a topology listing from.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum TopologySource {
    /// Standard input, typically piped from `lscpu -e=CPU,NODE,CORE`.
    #[default]
    Stdin,

    /// A file containing the listing.
    File(PathBuf),
}

impl TopologySource {
    /// Interprets an optional command-line path. A missing path or `-` means standard input.
    #[must_use]
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if path != Path::new("-") => Self::File(path),
            _ => Self::Stdin,
        }
    }
}

/// One invocation of the tool.
///
/// Each variant matches a subcommand of the `numa-pools` binary.
#[doc(hidden)]
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Command {
    /// Prints the canonical range string of a CPU list.
    Encode {
        /// The CPU list, in range syntax or as a plain comma-separated list.
        cpus: String,
    },

    /// Prints the union of several range strings.
    Merge {
        /// The range strings to merge.
        ranges: Vec<String>,
    },

    /// Prints the NUMA nodes of a topology.
    Nodes {
        /// Where to read the topology from.
        topology: TopologySource,
    },

    /// Prints the CPUs of one NUMA node.
    Cpus {
        /// Where to read the topology from.
        topology: TopologySource,

        /// The node to list.
        node: crate::NodeId,

        /// Whether to list only the primary thread of each core.
        primary: bool,
    },

    /// Applies a pool plan to a topology and prints the allocation as environment lines.
    Plan {
        /// Where to read the topology from.
        topology: TopologySource,

        /// A TOML plan file. The default plan is used if `None`.
        config: Option<PathBuf>,
    },

    /// Prints the bare magnitude of a size.
    Size {
        /// The size, e.g. `40GiB`.
        value: String,
    },
}
