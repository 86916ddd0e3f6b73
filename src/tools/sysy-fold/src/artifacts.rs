// artifacts.rs
//! Files the harness leaves behind for a human to look at.
//!
//!   <dir>/bad_program.txt     - source that crashed or hung the compiler
//!   <dir>/{n}_expected.txt    - reference stdout of divergence n
//!   <dir>/{n}_actual.txt      - subject stdout of divergence n
//!   <dir>/{n}_program.txt     - expressions of divergence n, one per line
//!
//! The directory is created the first time something is written to it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FoldError;

pub const BAD_PROGRAM_FILE: &str = "bad_program.txt";

#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    divergences: usize,
}

impl ArtifactStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            divergences: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of divergences recorded so far.
    pub fn divergences(&self) -> usize {
        self.divergences
    }

    /// Save the source of a program that triggered a subject defect,
    /// replacing any previous one.
    pub fn archive_bad_program(&self, source: &str) -> Result<PathBuf, FoldError> {
        self.ensure_dir()?;
        let path = self.dir.join(BAD_PROGRAM_FILE);
        write(&path, source)?;
        Ok(path)
    }

    /// Save one divergence triple and return its index.
    pub fn record_divergence(
        &mut self,
        expected: &str,
        actual: &str,
        listing: &str,
    ) -> Result<usize, FoldError> {
        self.ensure_dir()?;
        let index = self.divergences;
        write(&self.dir.join(format!("{index}_expected.txt")), expected)?;
        write(&self.dir.join(format!("{index}_actual.txt")), actual)?;
        write(&self.dir.join(format!("{index}_program.txt")), listing)?;
        self.divergences += 1;
        Ok(index)
    }

    fn ensure_dir(&self) -> Result<(), FoldError> {
        fs::create_dir_all(&self.dir).map_err(|source| FoldError::Io {
            path: self.dir.clone(),
            source,
        })
    }
}

fn write(path: &Path, contents: &str) -> Result<(), FoldError> {
    fs::write(path, contents).map_err(|source| FoldError::Io {
        path: path.to_path_buf(),
        source,
    })
}
