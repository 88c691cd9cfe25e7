use std::fmt::{self, Display};
use std::str::SplitWhitespace;

use tracing::{debug, trace};

use crate::{CoreId, CpuId, NodeId};

/// One row of a topology listing: a logical CPU, the NUMA node it belongs to and the physical
/// core it is a hardware thread of.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TopologyRow {
    cpu: CpuId,
    node: NodeId,
    core: CoreId,
}

impl TopologyRow {
    /// Creates a row from its three columns.
    #[must_use]
    pub const fn new(cpu: CpuId, node: NodeId, core: CoreId) -> Self {
        Self { cpu, node, core }
    }

    /// The logical CPU identifier.
    #[cfg_attr(test, mutants::skip)] // Trivial accessor.
    #[inline]
    #[must_use]
    pub const fn cpu(&self) -> CpuId {
        self.cpu
    }

    /// The NUMA node the CPU belongs to.
    #[cfg_attr(test, mutants::skip)] // Trivial accessor.
    #[inline]
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// The physical core the CPU is a hardware thread of.
    ///
    /// Core identifiers are only used as a grouping key and are not assumed to be globally unique.
    #[cfg_attr(test, mutants::skip)] // Trivial accessor.
    #[inline]
    #[must_use]
    pub const fn core(&self) -> CoreId {
        self.core
    }

    /// Parses one line of a `CPU NODE CORE` listing. Extra columns are ignored.
    fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();

        let cpu = next_field(&mut fields)?;
        let node = next_field(&mut fields)?;
        let core = next_field(&mut fields)?;

        Some(Self::new(cpu, node, core))
    }
}

fn next_field(fields: &mut SplitWhitespace<'_>) -> Option<u32> {
    fields.next()?.parse().ok()
}

impl Display for TopologyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu {} [node {}, core {}]", self.cpu, self.node, self.core)
    }
}

/// The parsed form of a raw topology listing, such as the output of `lscpu -e=CPU,NODE,CORE`.
///
/// A table is built once and never modified. Rows are kept in the order they appeared in the
/// listing.
///
/// # Example
///
/// ```
/// use numa_pools::TopologyTable;
///
/// let table = TopologyTable::parse(
///     "CPU NODE CORE\n\
///      0   0    0\n\
///      1   0    0\n\
///      2   0    1\n\
///      3   0    1\n",
/// );
///
/// // The header row is not a valid triple and is skipped.
/// assert_eq!(table.len(), 4);
/// assert_eq!(table.primary_cpus_on_node(0), vec![0, 2]);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TopologyTable {
    rows: Vec<TopologyRow>,
}

impl TopologyTable {
    /// Parses a raw topology listing.
    ///
    /// Each non-empty line must start with three whitespace-separated integers: the CPU, the NUMA
    /// node and the core. Any line that does not (header rows, blank lines, truncated rows,
    /// comma-separated `lscpu -p` rows or non-numeric noise) is skipped. Parsing never fails;
    /// input that contains no valid rows at all produces an empty table.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut rows = Vec::new();
        let mut skipped: usize = 0;

        for (index, line) in raw.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            if let Some(row) = TopologyRow::parse_line(line) {
                rows.push(row);
            } else {
                trace!(line_number = index.saturating_add(1), line, "skipping topology line");
                skipped = skipped.saturating_add(1);
            }
        }

        debug!(rows = rows.len(), skipped, "parsed topology listing");

        Self { rows }
    }

    /// Builds a table from rows that have already been parsed.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = TopologyRow>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    /// The rows of the table, in listing order.
    #[must_use]
    pub fn rows(&self) -> &[TopologyRow] {
        &self.rows
    }

    /// The number of rows in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over rows that belong to the given NUMA node.
    pub(crate) fn rows_on_node(&self, node: NodeId) -> impl Iterator<Item = &TopologyRow> {
        self.rows.iter().filter(move |row| row.node == node)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(TopologyTable: Send, Sync);
    assert_impl_all!(TopologyRow: Send, Sync, Copy);

    #[test]
    fn parses_simple_listing() {
        let table = TopologyTable::parse("0 0 0\n1 0 0\n2 0 1\n3 0 1");

        assert_eq!(
            table.rows(),
            &[
                TopologyRow::new(0, 0, 0),
                TopologyRow::new(1, 0, 0),
                TopologyRow::new(2, 0, 1),
                TopologyRow::new(3, 0, 1),
            ]
        );
    }

    #[test]
    fn preserves_input_order() {
        let table = TopologyTable::parse("65 2 32\n0 0 0\n64 2 32");

        let cpus = table.rows().iter().map(TopologyRow::cpu).collect::<Vec<_>>();
        assert_eq!(cpus, vec![65, 0, 64]);
    }

    #[test]
    fn extra_columns_and_whitespace_are_ignored() {
        let table = TopologyTable::parse("  0\t0   0  yes 4.2GHz\r\n1 0 0 no\n");

        assert_eq!(
            table.rows(),
            &[TopologyRow::new(0, 0, 0), TopologyRow::new(1, 0, 0)]
        );
    }

    // Skipping malformed lines is intentional: the listing comes from a command whose output
    // includes headers and noise, and one bad line must not discard the whole topology.
    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let table = TopologyTable::parse(
            "CPU NODE CORE\n\
             0 0 0\n\
             invalid line\n\
             \n\
             1 0\n\
             1 0 0\n\
             -1 0 0\n\
             2 zero 1\n\
             2 0 1\n",
        );

        assert_eq!(
            table.rows(),
            &[
                TopologyRow::new(0, 0, 0),
                TopologyRow::new(1, 0, 0),
                TopologyRow::new(2, 0, 1),
            ]
        );
    }

    #[test]
    fn comma_separated_rows_are_not_supported() {
        // `lscpu -p` output; only the whitespace-separated `lscpu -e` form is understood.
        let table = TopologyTable::parse("# CPU,Node,Core\n0,0,0\n1,0,0\n2,0,1\n3,0,1\n");

        assert!(table.is_empty());
        assert!(table.all_cpus_on_node(0).is_empty());
    }

    #[test]
    fn empty_or_garbage_input_is_empty_table() {
        assert!(TopologyTable::parse("").is_empty());
        assert!(TopologyTable::parse("\n\n   \n").is_empty());
        assert!(TopologyTable::parse("CPU NODE CORE\nnothing here").is_empty());
        assert_eq!(TopologyTable::parse(""), TopologyTable::default());
    }

    #[test]
    fn from_rows_matches_parse() {
        let parsed = TopologyTable::parse("0 0 0\n64 2 32");
        let built = TopologyTable::from_rows([TopologyRow::new(0, 0, 0), TopologyRow::new(64, 2, 32)]);

        assert_eq!(parsed, built);
        assert_eq!(built.len(), 2);
    }

    #[test]
    fn row_accessors_and_display() {
        let row = TopologyRow::new(66, 2, 33);

        assert_eq!(row.cpu(), 66);
        assert_eq!(row.node(), 2);
        assert_eq!(row.core(), 33);
        assert_eq!(row.to_string(), "cpu 66 [node 2, core 33]");
    }
}
