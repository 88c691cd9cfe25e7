use std::num::NonZero;

use cpu_ranges::{CpuId, CpuList};
use itertools::Itertools;
use serde::Deserialize;
use toml::Value;

use crate::allocation::env_var_name;
use crate::{Error, NodeId, SizeInput};

/// Which hardware threads of a NUMA node a pool receives.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
#[expect(
    clippy::exhaustive_enums,
    reason = "a node offers either all of its threads or one per core"
)]
pub enum ThreadSelection {
    /// Every logical CPU on the node, including SMT siblings. Suits I/O-bound pools.
    All,

    /// Only the primary (lowest-numbered) thread of each physical core. Avoids SMT contention
    /// for latency-sensitive work.
    #[default]
    Primary,
}

/// Where a pool gets its CPUs from.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PoolSource {
    /// CPUs selected from one NUMA node of the topology.
    Node {
        /// The node to use. If `None`, the allocator assigns the next unclaimed node.
        node: Option<NodeId>,

        /// Which threads of the node to take.
        threads: ThreadSelection,

        /// If set, keep only this many of the selected CPUs (the lowest-numbered ones).
        cores: Option<NonZero<usize>>,
    },

    /// A fixed list of CPUs, independent of the topology.
    Explicit(CpuList),
}

/// One named pool in a [`PoolPlan`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolSpec {
    name: String,
    source: PoolSource,
}

impl PoolSpec {
    /// A pool that takes CPUs from an automatically assigned NUMA node.
    #[must_use]
    pub fn on_node(name: impl Into<String>, threads: ThreadSelection) -> Self {
        Self {
            name: name.into(),
            source: PoolSource::Node {
                node: None,
                threads,
                cores: None,
            },
        }
    }

    /// A pool with a fixed list of CPUs.
    #[must_use]
    pub fn explicit(name: impl Into<String>, cpus: impl Into<CpuList>) -> Self {
        Self {
            name: name.into(),
            source: PoolSource::Explicit(cpus.into()),
        }
    }

    /// Pins a node-sourced pool to a specific NUMA node. Has no effect on explicit pools.
    #[must_use]
    pub fn with_node(mut self, node: NodeId) -> Self {
        if let PoolSource::Node { node: current, .. } = &mut self.source {
            *current = Some(node);
        }

        self
    }

    /// Limits a node-sourced pool to its `cores` lowest-numbered CPUs. Has no effect on explicit
    /// pools.
    #[must_use]
    pub fn with_cores(mut self, cores: NonZero<usize>) -> Self {
        if let PoolSource::Node { cores: current, .. } = &mut self.source {
            *current = Some(cores);
        }

        self
    }

    /// The name of the pool.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the pool gets its CPUs from.
    #[must_use]
    pub fn source(&self) -> &PoolSource {
        &self.source
    }
}

/// A description of how to partition a machine's CPUs into named pools.
///
/// The default plan is the one used for inference benchmarking: a housekeeping pool with every
/// thread of one node, then a load generator pool and a server pool with primary threads of one
/// node each. Nodes are assigned in ascending order.
///
/// Plans can also be loaded from TOML:
///
/// ```
/// use numa_pools::PoolPlan;
///
/// let plan = PoolPlan::from_toml(
///     r#"
///     kv_cache_space = "40GiB"
///
///     [[pool]]
///     name = "housekeeping"
///     threads = "all"
///     node = 0
///
///     [[pool]]
///     name = "server"
///     cores = 4
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(plan.pools().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PoolPlan {
    pools: Vec<PoolSpec>,
    kv_cache_space: Option<SizeInput>,
}

impl PoolPlan {
    /// Creates a plan from pool specifications.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if there are no pools, if a pool name is empty or used
    /// twice, or if two pool names map to the same environment variable (`a-b` and `a_b`).
    pub fn new(pools: Vec<PoolSpec>) -> crate::Result<Self> {
        if pools.is_empty() {
            return Err(Error::InvalidConfig {
                problem: "a plan must contain at least one pool".to_string(),
            });
        }

        if let Some(unnamed) = pools.iter().position(|pool| pool.name.trim().is_empty()) {
            return Err(Error::InvalidConfig {
                problem: format!("pool #{} has an empty name", unnamed.saturating_add(1)),
            });
        }

        if let Some(duplicate) = pools.iter().map(|pool| pool.name.as_str()).duplicates().next() {
            return Err(Error::InvalidConfig {
                problem: format!("pool name '{duplicate}' is used more than once"),
            });
        }

        if let Some((first, second)) = pools
            .iter()
            .tuple_combinations()
            .find(|(first, second)| env_var_name(&first.name) == env_var_name(&second.name))
        {
            return Err(Error::InvalidConfig {
                problem: format!(
                    "pool names '{}' and '{}' both map to the variable {}",
                    first.name,
                    second.name,
                    env_var_name(&first.name)
                ),
            });
        }

        Ok(Self {
            pools,
            kv_cache_space: None,
        })
    }

    /// Attaches a KV cache size to the plan. The bare magnitude is emitted with the allocation.
    #[must_use]
    pub fn with_kv_cache_space(mut self, size: impl Into<SizeInput>) -> Self {
        self.kv_cache_space = Some(size.into());
        self
    }

    /// Parses a plan from TOML text.
    ///
    /// A document without any `[[pool]]` tables uses the default pools, which allows a file to
    /// set only `kv_cache_space`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidConfig`] if the text is not valid TOML, has unknown keys, or describes
    ///   an invalid plan (see [`new()`][Self::new]).
    /// * [`Error::InvalidArgumentType`] if `cpus` or `kv_cache_space` has an unsupported shape.
    pub fn from_toml(text: &str) -> crate::Result<Self> {
        let file: PlanFile = toml::from_str(text).map_err(|error| Error::InvalidConfig {
            problem: error.to_string(),
        })?;

        let pools = if file.pools.is_empty() {
            standard_pools()
        } else {
            file.pools
                .into_iter()
                .map(PoolFile::into_spec)
                .collect::<crate::Result<Vec<_>>>()?
        };

        let mut plan = Self::new(pools)?;

        if let Some(value) = &file.kv_cache_space {
            plan.kv_cache_space = Some(size_from_value(value)?);
        }

        Ok(plan)
    }

    /// The pools, in plan order.
    #[must_use]
    pub fn pools(&self) -> &[PoolSpec] {
        &self.pools
    }

    /// The KV cache size to emit alongside the allocation, if any.
    #[must_use]
    pub fn kv_cache_space(&self) -> Option<&SizeInput> {
        self.kv_cache_space.as_ref()
    }
}

impl Default for PoolPlan {
    fn default() -> Self {
        Self {
            pools: standard_pools(),
            kv_cache_space: None,
        }
    }
}

fn standard_pools() -> Vec<PoolSpec> {
    vec![
        PoolSpec::on_node("housekeeping", ThreadSelection::All),
        PoolSpec::on_node("load_generator", ThreadSelection::Primary),
        PoolSpec::on_node("server", ThreadSelection::Primary),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanFile {
    kv_cache_space: Option<Value>,

    #[serde(default, rename = "pool")]
    pools: Vec<PoolFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PoolFile {
    name: String,
    node: Option<NodeId>,
    threads: Option<ThreadSelection>,
    cores: Option<NonZero<usize>>,
    cpus: Option<Value>,
}

impl PoolFile {
    fn into_spec(self) -> crate::Result<PoolSpec> {
        let Some(cpus) = self.cpus else {
            return Ok(PoolSpec {
                name: self.name,
                source: PoolSource::Node {
                    node: self.node,
                    threads: self.threads.unwrap_or_default(),
                    cores: self.cores,
                },
            });
        };

        if self.node.is_some() || self.threads.is_some() || self.cores.is_some() {
            return Err(Error::InvalidConfig {
                problem: format!(
                    "pool '{}' lists explicit cpus and cannot also set node, threads or cores",
                    self.name
                ),
            });
        }

        let cpus = cpus_from_value(&format!("pool.{}.cpus", self.name), &cpus)?;

        Ok(PoolSpec::explicit(self.name, cpus))
    }
}

const CPUS_EXPECTED: &str = "a range string or an array of CPU numbers";
const SIZE_EXPECTED: &str = "a size string or a non-negative number";

fn cpus_from_value(field: &str, value: &Value) -> crate::Result<CpuList> {
    let wrong_shape = |found: String| Error::InvalidArgumentType {
        field: field.to_string(),
        expected: CPUS_EXPECTED,
        found,
    };

    match value {
        Value::String(text) => Ok(CpuList::Text(text.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Integer(number) => CpuId::try_from(*number)
                    .map_err(|_out_of_range| wrong_shape(format!("integer {number}"))),
                other => Err(wrong_shape(format!("an array containing {}", other.type_str()))),
            })
            .collect::<crate::Result<Vec<_>>>()
            .map(CpuList::Values),
        other => Err(wrong_shape(other.type_str().to_string())),
    }
}

fn size_from_value(value: &Value) -> crate::Result<SizeInput> {
    let wrong_shape = |found: String| Error::InvalidArgumentType {
        field: "kv_cache_space".to_string(),
        expected: SIZE_EXPECTED,
        found,
    };

    match value {
        Value::String(text) => Ok(SizeInput::Text(text.clone())),
        Value::Integer(number) => u64::try_from(*number)
            .map(SizeInput::Integer)
            .map_err(|_negative| wrong_shape(format!("integer {number}"))),
        Value::Float(number) if *number >= 0.0 => Ok(SizeInput::Float(*number)),
        Value::Float(number) => Err(wrong_shape(format!("float {number}"))),
        other => Err(wrong_shape(other.type_str().to_string())),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn nz(value: usize) -> NonZero<usize> {
        NonZero::new(value).unwrap()
    }

    #[test]
    fn default_plan_has_three_auto_assigned_pools() {
        let plan = PoolPlan::default();

        let names = plan.pools().iter().map(PoolSpec::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["housekeeping", "load_generator", "server"]);

        assert_eq!(
            plan.pools()[0].source(),
            &PoolSource::Node {
                node: None,
                threads: ThreadSelection::All,
                cores: None
            }
        );
        assert!(plan.kv_cache_space().is_none());
    }

    #[test]
    fn builder_sets_node_and_cores() {
        let spec = PoolSpec::on_node("server", ThreadSelection::Primary)
            .with_node(2)
            .with_cores(nz(4));

        assert_eq!(
            spec.source(),
            &PoolSource::Node {
                node: Some(2),
                threads: ThreadSelection::Primary,
                cores: Some(nz(4))
            }
        );

        // Explicit pools ignore node-only settings.
        let spec = PoolSpec::explicit("manual", "0-3").with_node(1).with_cores(nz(1));
        assert_eq!(spec.source(), &PoolSource::Explicit(CpuList::from("0-3")));
    }

    #[test]
    fn names_must_be_unique_and_non_empty() {
        let error = PoolPlan::new(vec![
            PoolSpec::on_node("a", ThreadSelection::All),
            PoolSpec::on_node("a", ThreadSelection::Primary),
        ])
        .unwrap_err();
        assert!(matches!(error, Error::InvalidConfig { .. }));
        assert!(error.to_string().contains("'a'"));

        let error = PoolPlan::new(vec![PoolSpec::on_node(" ", ThreadSelection::All)]).unwrap_err();
        assert!(matches!(error, Error::InvalidConfig { .. }));

        let error = PoolPlan::new(Vec::new()).unwrap_err();
        assert!(matches!(error, Error::InvalidConfig { .. }));
    }

    #[test]
    fn names_must_map_to_distinct_variables() {
        let error = PoolPlan::new(vec![
            PoolSpec::explicit("a-b", "0"),
            PoolSpec::explicit("a_b", "1"),
        ])
        .unwrap_err();

        assert!(matches!(error, Error::InvalidConfig { .. }));
        assert!(error.to_string().contains("A_B_CPUS"));

        // Case differences collapse too.
        let error = PoolPlan::from_toml(
            "[[pool]]\nname = \"server\"\ncpus = \"0\"\n\n[[pool]]\nname = \"Server\"\ncpus = \"1\"",
        )
        .unwrap_err();

        assert!(matches!(error, Error::InvalidConfig { .. }));
    }

    #[test]
    fn parses_full_plan() {
        let plan = PoolPlan::from_toml(
            r#"
            kv_cache_space = "40GiB"

            [[pool]]
            name = "housekeeping"
            threads = "all"
            node = 0

            [[pool]]
            name = "server"
            cores = 4

            [[pool]]
            name = "manual"
            cpus = [96, 97, 98, 99]
            "#,
        )
        .unwrap();

        assert_eq!(
            plan.pools(),
            &[
                PoolSpec::on_node("housekeeping", ThreadSelection::All).with_node(0),
                PoolSpec::on_node("server", ThreadSelection::Primary).with_cores(nz(4)),
                PoolSpec::explicit("manual", vec![96, 97, 98, 99]),
            ]
        );
        assert_eq!(
            plan.kv_cache_space(),
            Some(&SizeInput::Text("40GiB".to_string()))
        );
    }

    #[test]
    fn file_without_pools_uses_standard_pools() {
        let plan = PoolPlan::from_toml("kv_cache_space = 40").unwrap();

        assert_eq!(plan.pools(), PoolPlan::default().pools());
        assert_eq!(plan.kv_cache_space(), Some(&SizeInput::Integer(40)));

        assert_eq!(PoolPlan::from_toml("").unwrap(), PoolPlan::default());
    }

    #[test]
    fn explicit_cpus_accept_strings() {
        let plan = PoolPlan::from_toml("[[pool]]\nname = \"manual\"\ncpus = \"0-3,16\"").unwrap();

        assert_eq!(
            plan.pools()[0].source(),
            &PoolSource::Explicit(CpuList::from("0-3,16"))
        );
    }

    #[test]
    fn wrong_shaped_cpus_are_rejected() {
        for cpus in ["42", "true", "{ first = 0 }", "[0, \"one\"]", "[-1]", "[4294967296]"] {
            let error =
                PoolPlan::from_toml(&format!("[[pool]]\nname = \"manual\"\ncpus = {cpus}"))
                    .unwrap_err();

            assert!(
                matches!(error, Error::InvalidArgumentType { .. }),
                "cpus = {cpus} should be rejected, got {error}"
            );
            assert!(error.to_string().contains("pool.manual.cpus"));
        }
    }

    #[test]
    fn wrong_shaped_kv_cache_space_is_rejected() {
        for value in ["true", "[40]", "-1", "-1.5"] {
            let error = PoolPlan::from_toml(&format!("kv_cache_space = {value}")).unwrap_err();

            assert!(
                matches!(error, Error::InvalidArgumentType { .. }),
                "kv_cache_space = {value} should be rejected, got {error}"
            );
        }
    }

    #[test]
    fn explicit_cpus_exclude_node_settings() {
        let error = PoolPlan::from_toml("[[pool]]\nname = \"manual\"\ncpus = \"0-3\"\nnode = 1")
            .unwrap_err();

        assert!(matches!(error, Error::InvalidConfig { .. }));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        for text in [
            "[[pool]]\nname = ",
            "[[pool]]\nthreads = \"all\"",
            "[[pool]]\nname = \"x\"\nthreads = \"some\"",
            "[[pool]]\nname = \"x\"\ncores = 0",
            "[[pool]]\nname = \"x\"\nnode = -1",
            "unknown_key = 1",
        ] {
            let error = PoolPlan::from_toml(text).unwrap_err();

            assert!(
                matches!(error, Error::InvalidConfig { .. }),
                "{text:?} should be rejected, got {error}"
            );
        }
    }

    #[test]
    fn kv_cache_space_from_builder() {
        let plan = PoolPlan::default().with_kv_cache_space("512MiB");

        assert_eq!(
            plan.kv_cache_space(),
            Some(&SizeInput::Text("512MiB".to_string()))
        );
    }
}
