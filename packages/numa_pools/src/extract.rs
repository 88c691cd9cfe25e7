use foldhash::{HashMap, HashMapExt};
use itertools::Itertools;

use crate::{CoreId, CpuId, NodeId, TopologyRow, TopologyTable};

impl TopologyTable {
    /// Returns every logical CPU on the given NUMA node, including SMT siblings, in ascending
    /// order and without duplicates.
    ///
    /// A node with no rows yields an empty list.
    ///
    /// ```
    /// use numa_pools::TopologyTable;
    ///
    /// let table = TopologyTable::parse("0 0 0\n1 0 0\n2 0 1\n3 0 1\n64 2 32\n65 2 32");
    ///
    /// assert_eq!(table.all_cpus_on_node(0), vec![0, 1, 2, 3]);
    /// assert!(table.all_cpus_on_node(1).is_empty());
    /// ```
    #[must_use]
    pub fn all_cpus_on_node(&self, node: NodeId) -> Vec<CpuId> {
        self.rows_on_node(node)
            .map(TopologyRow::cpu)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Returns one CPU per physical core on the given NUMA node, in ascending order.
    ///
    /// The representative of a core is its lowest-numbered logical CPU, conventionally the
    /// primary hardware thread. Pinning work to primary CPUs only avoids contention between SMT
    /// siblings.
    ///
    /// ```
    /// use numa_pools::TopologyTable;
    ///
    /// let table = TopologyTable::parse("64 2 32\n65 2 32\n66 2 33\n67 2 33");
    ///
    /// assert_eq!(table.primary_cpus_on_node(2), vec![64, 66]);
    /// ```
    #[must_use]
    pub fn primary_cpus_on_node(&self, node: NodeId) -> Vec<CpuId> {
        let mut primary_by_core: HashMap<CoreId, CpuId> = HashMap::new();

        for row in self.rows_on_node(node) {
            primary_by_core
                .entry(row.core())
                .and_modify(|primary| *primary = (*primary).min(row.cpu()))
                .or_insert(row.cpu());
        }

        primary_by_core.into_values().sorted_unstable().collect()
    }

    /// Returns every NUMA node that appears in the table, in ascending order and without
    /// duplicates.
    #[must_use]
    pub fn distinct_nodes(&self) -> Vec<NodeId> {
        self.rows()
            .iter()
            .map(TopologyRow::node)
            .sorted_unstable()
            .dedup()
            .collect()
    }
}
