use crate::{CpuId, CpuSet, decode};

/// A CPU list as supplied by a caller, either as text or as explicit identifiers.
///
/// Automation tends to hand over CPU lists in whichever shape it happens to have at hand: the
/// output of a previous extraction (`"64,65,66,67"`), a manually written range (`"0-3,16"`) or a
/// list of numbers. This type accepts both shapes and normalizes them into a [`CpuSet`].
///
/// # Example
///
/// ```
/// use cpu_ranges::CpuList;
///
/// let from_text = CpuList::from("64,65,66,67");
/// let from_values = CpuList::from(vec![67, 66, 65, 64]);
///
/// assert_eq!(from_text.to_range_string().unwrap(), "64-67");
/// assert_eq!(from_values.to_range_string().unwrap(), "64-67");
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a CPU list is either text or numbers, there is no third shape"
)]
pub enum CpuList {
    /// Comma-separated text using range syntax. Plain lists such as `0,1,2` are valid too.
    Text(String),

    /// Explicit identifiers in any order, possibly with duplicates.
    Values(Vec<CpuId>),
}

impl CpuList {
    /// Converts the list into a [`CpuSet`].
    ///
    /// # Errors
    ///
    /// Returns the [`decode()`] error if the list is [`CpuList::Text`] and the text is not a
    /// valid range string. [`CpuList::Values`] always converts successfully.
    pub fn to_cpu_set(&self) -> crate::Result<CpuSet> {
        match self {
            Self::Text(text) => decode(text),
            Self::Values(values) => Ok(values.iter().copied().collect()),
        }
    }

    /// Converts the list into its canonical range string.
    ///
    /// # Errors
    ///
    /// Same as [`to_cpu_set()`][Self::to_cpu_set].
    pub fn to_range_string(&self) -> crate::Result<String> {
        self.to_cpu_set().map(|cpus| cpus.to_string())
    }
}

impl From<&str> for CpuList {
    #[cfg_attr(test, mutants::skip)] // Trivial conversion.
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CpuList {
    #[cfg_attr(test, mutants::skip)] // Trivial conversion.
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<CpuId>> for CpuList {
    #[cfg_attr(test, mutants::skip)] // Trivial conversion.
    fn from(value: Vec<CpuId>) -> Self {
        Self::Values(value)
    }
}

impl From<&[CpuId]> for CpuList {
    #[cfg_attr(test, mutants::skip)] // Trivial conversion.
    fn from(value: &[CpuId]) -> Self {
        Self::Values(value.to_vec())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn text_and_values_agree() {
        assert_eq!(
            CpuList::from("0,1,2,3,8,9,10,11,16")
                .to_range_string()
                .unwrap(),
            "0-3,8-11,16"
        );
        assert_eq!(
            CpuList::from(vec![0, 1, 2, 3, 8, 9, 10, 11, 16])
                .to_range_string()
                .unwrap(),
            "0-3,8-11,16"
        );
        assert_eq!(
            CpuList::from("0,1,2,3,8,9,10").to_range_string().unwrap(),
            "0-3,8-10"
        );
    }

    #[test]
    fn empty_lists() {
        assert_eq!(CpuList::from("").to_range_string().unwrap(), "");
        assert_eq!(CpuList::from("   ").to_range_string().unwrap(), "");
        assert_eq!(CpuList::from(Vec::new()).to_range_string().unwrap(), "");
    }

    #[test]
    fn text_accepts_ranges() {
        let list = CpuList::from("16,0-3".to_string());

        assert_eq!(list.to_range_string().unwrap(), "0-3,16");
    }

    #[test]
    fn slice_of_values() {
        let values: &[CpuId] = &[5];

        assert_eq!(CpuList::from(values).to_range_string().unwrap(), "5");
    }

    #[test]
    fn conversions_pick_the_matching_variant() {
        let values: &[CpuId] = &[3, 1];

        assert_eq!(CpuList::from("0-3"), CpuList::Text("0-3".to_string()));
        assert_eq!(
            CpuList::from("0-3".to_string()),
            CpuList::Text("0-3".to_string())
        );
        assert_eq!(CpuList::from(vec![3, 1]), CpuList::Values(vec![3, 1]));
        assert_eq!(CpuList::from(values), CpuList::Values(vec![3, 1]));
    }

    #[test]
    fn malformed_text_is_error() {
        let error = CpuList::from("0,one,2").to_cpu_set().unwrap_err();

        assert!(matches!(error, Error::MalformedCpu { .. }));
        assert_eq!(error.token(), "one");
    }

    #[test]
    fn first_entries_of_a_primary_cpu_list() {
        // Automation takes the first N primary CPUs of a node and pins to them.
        let primary = "64,65,66,67,68,69,70,71";
        let requested = primary.split(',').take(4).collect::<Vec<_>>().join(",");

        assert_eq!(
            CpuList::from(requested).to_range_string().unwrap(),
            "64-67"
        );
    }
}
