//! Manifest written next to the generated programs.
//!
//! `sysy-stress.json` records what is needed to regenerate the same files:
//! the seed, the profile and the number of programs.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "sysy-stress.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub seed: u64,
    pub profile: String,
    pub files: Vec<String>,
    pub generator_version: String,
}

impl Manifest {
    pub fn new(seed: u64, profile: String, files: Vec<String>) -> Self {
        Self {
            seed,
            profile,
            files,
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Write the manifest to `dir/sysy-stress.json`.
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(dir.join(MANIFEST_FILE), json)
    }
}
