use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::iter::FusedIterator;
use std::ops::RangeInclusive;
use std::slice;
use std::str::FromStr;

use crate::{CpuId, Error, collect_runs, decode};

/// A set of CPU identifiers, the decoded form of a range string.
///
/// The set is stored as a list of inclusive runs, so a range such as `0-4294967295` costs one
/// entry rather than four billion. Two sets compare equal whenever they contain the same
/// identifiers, regardless of how the source strings were written.
///
/// The [`Display`] implementation emits the canonical range string and [`FromStr`] accepts any
/// valid range string, canonical or not.
///
/// # Example
///
/// ```
/// use cpu_ranges::CpuSet;
///
/// let housekeeping: CpuSet = "0-3".parse().unwrap();
/// let load_generator: CpuSet = [4, 5, 6, 7].into_iter().collect();
///
/// let combined = housekeeping.union(&load_generator);
///
/// assert_eq!(combined.to_string(), "0-7");
/// assert_eq!(combined.len(), 8);
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct CpuSet {
    // Sorted by start, each run inclusive, and each start is more than (previous end + 1).
    runs: Vec<(CpuId, CpuId)>,
}

impl CpuSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Builds a set from arbitrary inclusive runs, which may overlap, touch or be unordered.
    pub(crate) fn from_runs(mut runs: Vec<(CpuId, CpuId)>) -> Self {
        runs.sort_unstable();

        let mut normalized: Vec<(CpuId, CpuId)> = Vec::with_capacity(runs.len());

        for (start, end) in runs {
            debug_assert!(start <= end, "runs must be validated by the caller");

            match normalized.last_mut() {
                // Overlapping or adjacent to the previous run, so absorb it.
                Some((_, last_end)) if start <= last_end.saturating_add(1) => {
                    *last_end = (*last_end).max(end);
                }
                _ => normalized.push((start, end)),
            }
        }

        Self { runs: normalized }
    }

    /// Whether the set contains no identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The number of identifiers in the set.
    ///
    /// This is a `u64` because the full `u32` identifier space has one more member than
    /// `u32::MAX`.
    #[must_use]
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "end >= start for every run and the total cannot exceed 2^32"
    )]
    pub fn len(&self) -> u64 {
        self.runs
            .iter()
            .map(|&(start, end)| u64::from(end - start) + 1)
            .sum()
    }

    /// Whether the set contains the given identifier.
    #[must_use]
    pub fn contains(&self, cpu: CpuId) -> bool {
        self.runs
            .binary_search_by(|&(start, end)| {
                if end < cpu {
                    Ordering::Less
                } else if start > cpu {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Iterates over the identifiers in ascending order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            runs: self.runs.iter(),
            current: None,
        }
    }

    /// Iterates over the maximal runs of consecutive identifiers in ascending order.
    ///
    /// Each run corresponds to one token of the canonical range string.
    pub fn runs(&self) -> impl ExactSizeIterator<Item = RangeInclusive<CpuId>> + '_ {
        self.runs.iter().map(|&(start, end)| start..=end)
    }

    /// Returns the set of identifiers present in either set.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::from_runs(self.runs.iter().chain(other.runs.iter()).copied().collect())
    }

    /// Returns the set of identifiers present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut ours = self.runs.iter().copied();
        let mut theirs = other.runs.iter().copied();

        let mut a = ours.next();
        let mut b = theirs.next();

        let mut overlap = Vec::new();

        while let (Some((a_start, a_end)), Some((b_start, b_end))) = (a, b) {
            let start = a_start.max(b_start);
            let end = a_end.min(b_end);

            if start <= end {
                overlap.push((start, end));
            }

            // Advance whichever run finishes first; the other may still overlap the next one.
            if a_end < b_end {
                a = ours.next();
            } else {
                b = theirs.next();
            }
        }

        Self::from_runs(overlap)
    }

    /// Whether the two sets have no identifiers in common.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.intersection(other).is_empty()
    }

    /// Returns a set of the `n` lowest identifiers, or the whole set if it has fewer than `n`.
    #[must_use]
    pub fn first_n(&self, n: usize) -> Self {
        self.iter().take(n).collect()
    }
}

impl Display for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, &(start, end)) in self.runs.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }

            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}-{end}")?;
            }
        }

        Ok(())
    }
}

impl FromStr for CpuSet {
    type Err = Error;

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl FromIterator<CpuId> for CpuSet {
    fn from_iter<I: IntoIterator<Item = CpuId>>(iter: I) -> Self {
        // Already sorted and coalesced, no need to normalize again.
        Self {
            runs: collect_runs(iter),
        }
    }
}

impl<'a> IntoIterator for &'a CpuSet {
    type Item = CpuId;
    type IntoIter = Iter<'a>;

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the identifiers of a [`CpuSet`], in ascending order.
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    runs: slice::Iter<'a, (CpuId, CpuId)>,
    current: Option<RangeInclusive<CpuId>>,
}

impl Iterator for Iter<'_> {
    type Item = CpuId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cpu) = self.current.as_mut().and_then(Iterator::next) {
                return Some(cpu);
            }

            let &(start, end) = self.runs.next()?;
            self.current = Some(start..=end);
        }
    }
}

impl FusedIterator for Iter<'_> {}
