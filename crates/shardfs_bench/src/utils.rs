//! Benchmark utilities.

use rand::Rng;

/// Generate random entry data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a batch of series keys.
pub fn generate_keys(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| format!("host{}.cpu.{}", rng.gen_range(0..1000), i))
        .collect()
}

/// Generate entries with the specified payload size.
pub fn generate_entries(count: usize, payload_size: usize) -> Vec<(String, Vec<u8>)> {
    generate_keys(count)
        .into_iter()
        .map(|key| (key, random_data(payload_size)))
        .collect()
}
