//! Applies the default pool plan to a small three-node topology and prints the result in the
//! same form as the `numa-pools plan` command.

use numa_pools::{PoolPlan, TopologyTable, allocate};

const LISTING: &str = "\
CPU NODE CORE
0 0 0
1 0 0
2 0 1
3 0 1
32 1 16
33 1 16
34 1 17
35 1 17
64 2 32
65 2 32
66 2 33
67 2 33
";

fn main() {
    let table = TopologyTable::parse(LISTING);
    let plan = PoolPlan::default().with_kv_cache_space("40GiB");

    match allocate(&table, &plan) {
        Ok(allocation) => {
            for pool in allocation.pools() {
                println!(
                    "{:<16} node {:?}: {} CPU(s) {}",
                    pool.name(),
                    pool.node(),
                    pool.cpus().len(),
                    pool.range()
                );
            }

            println!();

            for line in allocation.to_env_lines() {
                println!("{line}");
            }
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}
