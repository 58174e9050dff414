//! Shared utilities for the visualization binaries.
//!
//! Each viz binary (src/bin/viz_*.rs) imports this module for dataset
//! bootstrapping and argument parsing.

use crate::ModelSet;
use std::path::PathBuf;

/// Parse the --data argument from the command line, defaulting to
/// "topic_models.json".
pub fn parse_data_path() -> PathBuf {
    std::env::args()
        .skip_while(|a| a != "--data")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("topic_models.json"))
}

/// Load the dataset, printing progress to stdout. Falls back to the
/// built-in sample grid when no file is present, so the viz binaries work
/// out of the box.
pub fn load_data() -> ModelSet {
    let path = parse_data_path();
    if path.exists() {
        println!("Loading dataset from {:?}...", path);
        match ModelSet::load(&path) {
            Some(data) => {
                println!(
                    "Loaded {} models, {} groups.",
                    data.models.len(),
                    data.groups.len()
                );
                data
            }
            None => {
                eprintln!("Failed to parse {:?}; using the built-in sample grid.", path);
                ModelSet::sample()
            }
        }
    } else {
        println!("No dataset at {:?}; using the built-in sample grid.", path);
        ModelSet::sample()
    }
}
