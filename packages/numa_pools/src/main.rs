#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the numa-pools tool.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use numa_pools::{Command, NodeId, TopologySource, run};
use tracing_subscriber::EnvFilter;

/// Partition a machine's CPUs into disjoint NUMA-aware pools and print them as CPU range
/// strings.
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Subcommand,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Subcommand {
    Encode(EncodeArgs),
    Merge(MergeArgs),
    Nodes(NodesArgs),
    Cpus(CpusArgs),
    Plan(PlanArgs),
    Size(SizeArgs),
}

/// print the canonical range string of a CPU list
#[derive(FromArgs)]
#[argh(subcommand, name = "encode")]
struct EncodeArgs {
    /// CPU list such as "67,64,65,66" or "0-3,16"
    #[argh(positional)]
    cpus: String,
}

/// print the union of several range strings
#[derive(FromArgs)]
#[argh(subcommand, name = "merge")]
struct MergeArgs {
    /// range strings to merge
    #[argh(positional, greedy)]
    ranges: Vec<String>,
}

/// print the NUMA nodes of a topology listing
#[derive(FromArgs)]
#[argh(subcommand, name = "nodes")]
struct NodesArgs {
    /// file with "CPU NODE CORE" rows (default: standard input, also selected by "-")
    #[argh(option)]
    topology: Option<PathBuf>,
}

/// print the CPUs of one NUMA node as a range string
#[derive(FromArgs)]
#[argh(subcommand, name = "cpus")]
struct CpusArgs {
    /// NUMA node to list
    #[argh(option)]
    node: NodeId,

    /// list only the primary thread of each physical core
    #[argh(switch)]
    primary: bool,

    /// file with "CPU NODE CORE" rows (default: standard input, also selected by "-")
    #[argh(option)]
    topology: Option<PathBuf>,
}

/// split the machine into pools and print one environment variable line per pool
#[derive(FromArgs)]
#[argh(subcommand, name = "plan")]
struct PlanArgs {
    /// file with "CPU NODE CORE" rows (default: standard input, also selected by "-")
    #[argh(option)]
    topology: Option<PathBuf>,

    /// TOML pool plan (default: housekeeping, load generator and server pools on a node each)
    #[argh(option)]
    config: Option<PathBuf>,
}

/// print the bare magnitude of a size such as "40GiB"
#[derive(FromArgs)]
#[argh(subcommand, name = "size")]
struct SizeArgs {
    /// size value, e.g. "40GiB" or "1024"
    #[argh(positional)]
    value: String,
}

impl From<Subcommand> for Command {
    fn from(subcommand: Subcommand) -> Self {
        match subcommand {
            Subcommand::Encode(args) => Self::Encode { cpus: args.cpus },
            Subcommand::Merge(args) => Self::Merge {
                ranges: args.ranges,
            },
            Subcommand::Nodes(args) => Self::Nodes {
                topology: TopologySource::from_arg(args.topology),
            },
            Subcommand::Cpus(args) => Self::Cpus {
                topology: TopologySource::from_arg(args.topology),
                node: args.node,
                primary: args.primary,
            },
            Subcommand::Plan(args) => Self::Plan {
                topology: TopologySource::from_arg(args.topology),
                config: args.config,
            },
            Subcommand::Size(args) => Self::Size { value: args.value },
        }
    }
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    // Logs go to stderr so that stdout carries only the result, which callers capture.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args: Args = argh::from_env();

    match run(&Command::from(args.command)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
