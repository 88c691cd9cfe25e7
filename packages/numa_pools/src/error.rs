use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::NodeId;

/// Errors that can occur when extracting, planning or allocating CPU pools.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A range string or CPU list could not be decoded.
    #[error(transparent)]
    Range(#[from] cpu_ranges::Error),

    /// A size string did not match the `NUMBER [UNIT]` syntax.
    #[error("invalid size format: '{value}' (expected a number with an optional unit, e.g. '40GiB' or '1024')")]
    InvalidSizeFormat {
        /// The raw value that could not be parsed.
        value: String,
    },

    /// A dynamically typed value (for example from a configuration file) had the wrong shape.
    #[error("'{field}' expects {expected}, got {found}")]
    InvalidArgumentType {
        /// The name of the field or argument that received the value.
        field: String,

        /// A description of the accepted shapes.
        expected: &'static str,

        /// A description of what was actually received.
        found: String,
    },

    /// A pool plan was structurally valid TOML but did not make sense.
    #[error("invalid pool plan: {problem}")]
    InvalidConfig {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// A pool was pinned to a NUMA node that does not appear in the topology.
    #[error("pool '{pool}' requests NUMA node {node}, which has no CPUs in the topology")]
    UnknownNode {
        /// The name of the pool.
        pool: String,

        /// The requested node.
        node: NodeId,
    },

    /// There are more pools awaiting a node than there are unclaimed nodes.
    #[error("{required} pool(s) need a NUMA node of their own but only {available} unclaimed node(s) exist")]
    NotEnoughNodes {
        /// How many pools needed an automatically assigned node.
        required: usize,

        /// How many nodes were left to assign.
        available: usize,
    },

    /// A pool asked for more CPUs than its node can provide.
    #[error("pool '{pool}' requests {requested} CPU(s) but only {available} are available")]
    InsufficientCpus {
        /// The name of the pool.
        pool: String,

        /// How many CPUs were requested.
        requested: usize,

        /// How many CPUs were available for the pool.
        available: u64,
    },

    /// Two pools ended up sharing CPUs.
    #[error("pools '{first}' and '{second}' overlap on CPUs {overlap}")]
    PoolOverlap {
        /// The name of the earlier pool in plan order.
        first: String,

        /// The name of the later pool in plan order.
        second: String,

        /// The shared CPUs, as a range string.
        overlap: String,
    },

    /// An input file or stream could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        /// The path that was being read. Standard input is reported as `-`.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
