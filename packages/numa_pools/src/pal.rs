// Platform abstraction layer for numa_pools.
//
// Reading topology listings and plan files goes through a trait so tests can substitute a mock
// for the real filesystem and standard input.

mod filesystem;

pub(crate) use filesystem::*;
