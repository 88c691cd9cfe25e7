#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Utilities for encoding, decoding and merging compact CPU range strings, the textual syntax
//! used by CPU affinity and pinning mechanisms to describe sets of logical processors.
//!
//! Example range string: `0-3,8-11,16`
//!
//! # Format
//!
//! The value is a comma-separated list of zero or more tokens, where each token is either:
//!
//! * a single integer (e.g. `16`)
//! * an inclusive range of integers (e.g. `0-3`)
//!
//! The identifiers in the list are of size `u32`.
//!
//! [`encode()`] always produces the canonical form: tokens in ascending order, with no two
//! tokens overlapping or adjacent (`0-3,4-7` is written as `0-7`). [`decode()`] accepts any
//! valid input, canonical or not, and tolerates whitespace around tokens and empty tokens.
//!
//! # Example
//!
//! Basic conversion from/to strings:
//!
//! ```
//! let server = cpu_ranges::decode("64,66,68-71").unwrap();
//! assert_eq!(server.iter().collect::<Vec<_>>(), vec![64, 66, 68, 69, 70, 71]);
//!
//! println!("Server CPUs: {server}");
//! println!("As range string: {}", cpu_ranges::encode([3, 1, 2, 0, 10, 8, 9]));
//! ```
//!
//! Merging ranges computed separately:
//! ```
//! let housekeeping = cpu_ranges::encode([0, 1, 2, 3]);
//! let load_generator = cpu_ranges::encode([4, 5, 6, 7]);
//!
//! let non_server = cpu_ranges::merge([housekeeping, load_generator]).unwrap();
//!
//! assert_eq!(non_server, "0-7");
//! ```

mod cpu_list;
mod cpu_set;
mod decode;
mod encode;
mod error;
mod merge;

pub use cpu_list::*;
pub use cpu_set::*;
pub use decode::*;
pub use encode::encode;
pub(crate) use encode::collect_runs;
pub use error::*;
pub use merge::*;

/// Identifies a single logical CPU (hardware thread).
///
/// This matches the numeric identifier used by standard operating system tooling. The values
/// are not guaranteed to be contiguous or to start from zero.
pub type CpuId = u32;
