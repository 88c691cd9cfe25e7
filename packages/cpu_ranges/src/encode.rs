use itertools::Itertools;

use crate::{CpuId, CpuSet};

/// Generates the canonical range string for a collection of CPU identifiers.
///
/// The input may be in any order and may contain duplicates. The output lists ascending,
/// non-overlapping and non-adjacent tokens, each either a single number (`16`) or an inclusive
/// range (`0-3`). An empty input produces an empty string.
///
/// ```
/// assert_eq!(cpu_ranges::encode([0, 1, 2, 3, 8, 9, 10, 11, 16]), "0-3,8-11,16");
/// assert_eq!(cpu_ranges::encode([3, 1, 2, 0, 10, 8, 9]), "0-3,8-10");
/// assert_eq!(cpu_ranges::encode([]), "");
/// ```
pub fn encode(cpus: impl IntoIterator<Item = CpuId>) -> String {
    cpus.into_iter().collect::<CpuSet>().to_string()
}

/// Coalesces CPU identifiers into inclusive `(start, end)` runs in a single pass over the
/// sorted, deduplicated input.
pub(crate) fn collect_runs(cpus: impl IntoIterator<Item = CpuId>) -> Vec<(CpuId, CpuId)> {
    let mut runs: Vec<(CpuId, CpuId)> = Vec::new();

    for cpu in cpus.into_iter().sorted_unstable().dedup() {
        match runs.last_mut() {
            // This item extends the current run.
            Some((_, end)) if end.checked_add(1) == Some(cpu) => *end = cpu,
            // Gap of at least 2, or the very first item.
            _ => runs.push((cpu, cpu)),
        }
    }

    runs
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn encode_smoke_test() {
        assert_eq!(encode([]), "");

        assert_eq!(encode([555]), "555");

        assert_eq!(encode([555, 666]), "555,666");

        assert_eq!(encode([0, 1, 2, 3]), "0-3");

        assert_eq!(encode([0, 1, 2, 3, 6, 7, 8, 11, 12, 13]), "0-3,6-8,11-13");

        assert_eq!(encode([0, 1, 3]), "0-1,3");

        assert_eq!(encode([0, 5, 10]), "0,5,10");

        assert_eq!(encode([0, 1, 2, 5, 10, 11, 20]), "0-2,5,10-11,20");
    }

    #[test]
    fn encode_sorts_and_deduplicates() {
        assert_eq!(encode([3, 1, 2, 0, 10, 8, 9]), "0-3,8-10");

        assert_eq!(encode([0, 1, 1, 2, 2, 3]), "0-3");

        assert_eq!(encode([16, 11, 10, 9, 8, 3, 2, 1, 0]), "0-3,8-11,16");
    }

    #[test]
    fn encode_at_the_top_of_the_id_space() {
        assert_eq!(encode([CpuId::MAX]), CpuId::MAX.to_string());

        assert_eq!(
            encode([CpuId::MAX, CpuId::MAX - 1, 0]),
            format!("0,{}-{}", CpuId::MAX - 1, CpuId::MAX)
        );
    }

    #[test]
    fn token_count_matches_run_count() {
        let runs = collect_runs([0, 2, 4, 5, 6, 9]);

        assert_eq!(runs, vec![(0, 0), (2, 2), (4, 6), (9, 9)]);
        assert_eq!(encode([0, 2, 4, 5, 6, 9]).split(',').count(), runs.len());
    }

    #[test]
    fn even_cpus_compress() {
        let cpus = (0..96).step_by(2).collect::<Vec<CpuId>>();
        let plain = cpus.iter().map(ToString::to_string).join(",");

        let encoded = encode(cpus);

        // No two even numbers are adjacent, so nothing coalesces.
        assert_eq!(encoded, plain);

        let consecutive = encode(0..96);
        assert_eq!(consecutive, "0-95");
        assert!(consecutive.len() < plain.len());
    }
}
