use crate::{CpuId, CpuSet, Error};

/// Parses a range string and returns the set of CPU identifiers it describes.
///
/// The input does not need to be canonical: tokens may be in any order, may overlap and may be
/// adjacent. Whitespace around tokens and empty tokens (e.g. from a stray trailing comma) are
/// tolerated. An empty string is valid input and returns an empty set.
///
/// # Errors
///
/// * [`Error::MalformedRange`] if a token contains `-` but is not a valid `start-end` pair
///   (non-numeric bounds, more than one `-`, or `start > end`).
/// * [`Error::MalformedCpu`] if a token without `-` is not a valid CPU identifier.
///
/// ```
/// let cpus = cpu_ranges::decode("8-11,0-3,16").unwrap();
///
/// assert_eq!(cpus.to_string(), "0-3,8-11,16");
/// assert!(cpus.contains(9));
/// assert!(!cpus.contains(12));
/// ```
pub fn decode(range: &str) -> crate::Result<CpuSet> {
    let runs = range
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(decode_token)
        .collect::<crate::Result<Vec<_>>>()?;

    Ok(CpuSet::from_runs(runs))
}

fn decode_token(token: &str) -> crate::Result<(CpuId, CpuId)> {
    if let Some((range_start, range_end_inc)) = token.split_once('-') {
        decode_range(token, range_start, range_end_inc)
    } else {
        decode_single(token).map(|cpu| (cpu, cpu))
    }
}

fn decode_range(
    token: &str,
    range_start: &str,
    range_end_inc: &str,
) -> crate::Result<(CpuId, CpuId)> {
    let range_start =
        range_start
            .trim()
            .parse::<CpuId>()
            .map_err(|inner| Error::MalformedRange {
                token: token.to_string(),
                problem: format!("range start could not be parsed as an integer: {inner}"),
            })?;

    // Anything after the first '-' must be a plain integer, which also rejects "0-3-5".
    let range_end_inc =
        range_end_inc
            .trim()
            .parse::<CpuId>()
            .map_err(|inner| Error::MalformedRange {
                token: token.to_string(),
                problem: format!("range end could not be parsed as an integer: {inner}"),
            })?;

    if range_start > range_end_inc {
        return Err(Error::MalformedRange {
            token: token.to_string(),
            problem: "range start must be <= end".to_string(),
        });
    }

    Ok((range_start, range_end_inc))
}

fn decode_single(token: &str) -> crate::Result<CpuId> {
    token
        .parse::<CpuId>()
        .map_err(|inner| Error::MalformedCpu {
            token: token.to_string(),
            problem: format!(
                "token was not a range but could not be parsed as an integer either: {inner}"
            ),
        })
}
