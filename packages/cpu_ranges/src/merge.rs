use crate::{CpuSet, Error, decode};

/// Merges several range strings into one canonical range string.
///
/// Overlapping inputs are absorbed and adjacent inputs coalesce, so merging `"0-3"` with `"4-7"`
/// yields `"0-7"`. Empty (or whitespace-only) inputs are skipped. The result does not depend on
/// the order of the inputs.
///
/// # Errors
///
/// Returns [`Error::MalformedRange`] naming the first offending token if any input cannot be
/// decoded. This includes tokens that [`decode()`] itself reports as
/// [`Error::MalformedCpu`].
///
/// ```
/// assert_eq!(cpu_ranges::merge(["0-3", "4-7"]).unwrap(), "0-7");
/// assert_eq!(cpu_ranges::merge(["0-5", "3-8"]).unwrap(), "0-8");
/// assert_eq!(cpu_ranges::merge(["0-3", "16-19"]).unwrap(), "0-3,16-19");
/// ```
pub fn merge<I, S>(ranges: I) -> crate::Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    merge_sets(ranges).map(|merged| merged.to_string())
}

/// Like [`merge()`] but returns the merged [`CpuSet`] instead of its range string.
///
/// # Errors
///
/// Same as [`merge()`].
pub fn merge_sets<I, S>(ranges: I) -> crate::Result<CpuSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut runs = Vec::new();

    for range in ranges {
        let range = range.as_ref();

        if range.trim().is_empty() {
            continue;
        }

        let cpus = decode(range).map_err(|error| match error {
            Error::MalformedCpu { token, problem } => Error::MalformedRange { token, problem },
            other => other,
        })?;

        runs.extend(cpus.runs().map(|run| (*run.start(), *run.end())));
    }

    Ok(CpuSet::from_runs(runs))
}
