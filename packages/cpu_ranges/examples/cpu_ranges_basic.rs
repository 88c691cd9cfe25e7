//! Demonstrates converting between CPU lists and range strings and merging pools.

fn main() {
    let selected_processors = cpu_ranges::decode("0-9,32-35,40").unwrap();
    assert_eq!(selected_processors.len(), 15);

    println!("Selected processors: {selected_processors}");
    println!(
        "Re-encoded from a list: {}",
        cpu_ranges::encode(selected_processors.iter())
    );

    let merged = cpu_ranges::merge(["0-3", "4-7", "16-19"]).unwrap();
    println!("Merged pools: {merged}");
}
