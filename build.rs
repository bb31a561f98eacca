//! Build script for shardalloc.
//!
//! Emits feature diagnostics for users integrating the allocator.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");

    let parking_lot_enabled = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    if parking_lot_enabled {
        println!("cargo:warning=[shardalloc] Using parking_lot for arena and pool mutexes");
    } else if profile == "release" {
        println!("cargo:warning=[shardalloc] Tip: enable 'parking_lot' for cheaper trylock probing:");
        println!("cargo:warning=[shardalloc]   shardalloc = {{ version = \"0.3\", features = [\"parking_lot\"] }}");
    }
}
