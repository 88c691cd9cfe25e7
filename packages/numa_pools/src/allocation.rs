use cpu_ranges::CpuSet;
use itertools::Itertools;
use tracing::debug;

use crate::{
    Error, NodeId, PoolPlan, PoolSource, PoolSpec, SizeValue, ThreadSelection, TopologyTable,
    extract_numeric_value,
};

/// The CPUs assigned to one pool of a plan.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolAllocation {
    name: String,
    node: Option<NodeId>,
    cpus: CpuSet,
}

impl PoolAllocation {
    /// The name of the pool.
    #[cfg_attr(test, mutants::skip)] // Trivial accessor.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The NUMA node the pool's CPUs were taken from, or `None` for pools with explicit CPUs.
    #[cfg_attr(test, mutants::skip)] // Trivial accessor.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// The CPUs assigned to the pool.
    #[cfg_attr(test, mutants::skip)] // Trivial accessor.
    #[must_use]
    pub fn cpus(&self) -> &CpuSet {
        &self.cpus
    }

    /// The CPUs assigned to the pool as a canonical range string, ready to hand to a pinning
    /// tool.
    #[must_use]
    pub fn range(&self) -> String {
        self.cpus.to_string()
    }

    /// The name of the environment variable that carries this pool's range string.
    ///
    /// The pool name is upper-cased and every character that is not an ASCII letter or digit is
    /// replaced by `_`, then `_CPUS` is appended.
    #[must_use]
    pub fn env_var_name(&self) -> String {
        env_var_name(&self.name)
    }
}

pub(crate) fn env_var_name(pool_name: &str) -> String {
    let stem = pool_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect::<String>();

    format!("{stem}_CPUS")
}

/// The result of applying a [`PoolPlan`] to a topology: pairwise disjoint CPU sets, one per
/// pool, in plan order.
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
    pools: Vec<PoolAllocation>,
    kv_cache_space: Option<SizeValue>,
}

impl Allocation {
    /// The pools, in plan order.
    #[must_use]
    pub fn pools(&self) -> &[PoolAllocation] {
        &self.pools
    }

    /// Looks up a pool by name.
    #[must_use]
    pub fn pool(&self, name: &str) -> Option<&PoolAllocation> {
        self.pools.iter().find(|pool| pool.name == name)
    }

    /// The bare magnitude of the plan's KV cache size, if the plan had one.
    #[must_use]
    pub fn kv_cache_space(&self) -> Option<SizeValue> {
        self.kv_cache_space
    }

    /// Renders the allocation as `NAME=value` lines suitable for sourcing into a shell script.
    ///
    /// ```
    /// use numa_pools::{PoolPlan, TopologyTable, allocate};
    ///
    /// let table = TopologyTable::parse("0 0 0\n1 0 0\n32 1 16\n33 1 16\n64 2 32\n65 2 32");
    /// let plan = PoolPlan::default().with_kv_cache_space("40GiB");
    ///
    /// let allocation = allocate(&table, &plan).unwrap();
    ///
    /// assert_eq!(
    ///     allocation.to_env_lines(),
    ///     vec![
    ///         "HOUSEKEEPING_CPUS=0-1",
    ///         "LOAD_GENERATOR_CPUS=32",
    ///         "SERVER_CPUS=64",
    ///         "KV_CACHE_SPACE=40",
    ///     ]
    /// );
    /// ```
    #[must_use]
    pub fn to_env_lines(&self) -> Vec<String> {
        self.pools
            .iter()
            .map(|pool| format!("{}={}", pool.env_var_name(), pool.range()))
            .chain(
                self.kv_cache_space
                    .map(|size| format!("KV_CACHE_SPACE={size}")),
            )
            .collect()
    }
}

/// Assigns CPUs from the topology to every pool of the plan.
///
/// Pools pinned to a node claim that node first. The remaining node-sourced pools then take the
/// unclaimed nodes in ascending order, in plan order. Explicit pools use their CPU list as is.
///
/// # Errors
///
/// * [`Error::UnknownNode`] if a pool is pinned to a node that has no CPUs in the topology.
/// * [`Error::NotEnoughNodes`] if there are fewer unclaimed nodes than pools waiting for one.
/// * [`Error::InsufficientCpus`] if a pool asks for more CPUs than its node provides.
/// * [`Error::InvalidConfig`] if a pool ends up with no CPUs at all.
/// * [`Error::PoolOverlap`] if two pools share any CPU.
/// * [`Error::Range`] if an explicit CPU list cannot be decoded.
/// * [`Error::InvalidSizeFormat`] if the plan's KV cache size cannot be parsed.
pub fn allocate(table: &TopologyTable, plan: &PoolPlan) -> crate::Result<Allocation> {
    let nodes = resolve_nodes(table, plan.pools())?;

    let pools = plan
        .pools()
        .iter()
        .zip(nodes)
        .map(|(spec, node)| allocate_pool(table, spec, node))
        .collect::<crate::Result<Vec<_>>>()?;

    for (first, second) in pools.iter().tuple_combinations() {
        let overlap = first.cpus.intersection(&second.cpus);

        if !overlap.is_empty() {
            return Err(Error::PoolOverlap {
                first: first.name.clone(),
                second: second.name.clone(),
                overlap: overlap.to_string(),
            });
        }
    }

    let kv_cache_space = plan
        .kv_cache_space()
        .cloned()
        .map(extract_numeric_value)
        .transpose()?;

    Ok(Allocation {
        pools,
        kv_cache_space,
    })
}

/// Picks the node for each pool of the plan, in plan order. Explicit pools get `None`.
fn resolve_nodes(table: &TopologyTable, pools: &[PoolSpec]) -> crate::Result<Vec<Option<NodeId>>> {
    let available = table.distinct_nodes();

    let mut claimed = Vec::new();

    for spec in pools {
        if let PoolSource::Node {
            node: Some(node), ..
        } = spec.source()
        {
            if !available.contains(node) {
                return Err(Error::UnknownNode {
                    pool: spec.name().to_string(),
                    node: *node,
                });
            }

            claimed.push(*node);
        }
    }

    let unclaimed = available
        .iter()
        .copied()
        .filter(|node| !claimed.contains(node))
        .collect::<Vec<_>>();

    let waiting = pools
        .iter()
        .filter(|spec| matches!(spec.source(), PoolSource::Node { node: None, .. }))
        .count();

    if waiting > unclaimed.len() {
        return Err(Error::NotEnoughNodes {
            required: waiting,
            available: unclaimed.len(),
        });
    }

    let mut unclaimed = unclaimed.into_iter();

    Ok(pools
        .iter()
        .map(|spec| match spec.source() {
            PoolSource::Node { node: Some(node), .. } => Some(*node),
            PoolSource::Node { node: None, .. } => unclaimed.next(),
            PoolSource::Explicit(_) => None,
        })
        .collect())
}

fn allocate_pool(
    table: &TopologyTable,
    spec: &PoolSpec,
    node: Option<NodeId>,
) -> crate::Result<PoolAllocation> {
    let cpus = match (spec.source(), node) {
        (PoolSource::Node { threads, cores, .. }, Some(node)) => {
            let selected = match threads {
                ThreadSelection::All => table.all_cpus_on_node(node),
                ThreadSelection::Primary => table.primary_cpus_on_node(node),
            }
            .into_iter()
            .collect::<CpuSet>();

            match cores {
                Some(cores) => {
                    let requested = cores.get();

                    let enough = u64::try_from(requested)
                        .is_ok_and(|requested| selected.len() >= requested);

                    if !enough {
                        return Err(Error::InsufficientCpus {
                            pool: spec.name().to_string(),
                            requested,
                            available: selected.len(),
                        });
                    }

                    selected.first_n(requested)
                }
                None => selected,
            }
        }
        (PoolSource::Explicit(list), _) => list.to_cpu_set()?,
        // Node-sourced pools always have a node once resolution has succeeded.
        (PoolSource::Node { .. }, None) => CpuSet::new(),
    };

    if cpus.is_empty() {
        return Err(Error::InvalidConfig {
            problem: format!("pool '{}' has no CPUs", spec.name()),
        });
    }

    debug!(
        pool = spec.name(),
        node,
        cpus = %cpus,
        count = cpus.len(),
        "allocated pool"
    );

    Ok(PoolAllocation {
        name: spec.name().to_string(),
        node,
        cpus,
    })
}
