// driver.rs
//! The fuzzing loop: `outer x rounds` oracle rounds, strictly sequential.

use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, info_span, warn};

use crate::artifacts::ArtifactStore;
use crate::batch::{Batch, BatchConfig};
use crate::error::FoldError;
use crate::render::{Language, render};
use crate::toolchain::Toolchain;

/// Shape of one invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub outer: usize,
    pub rounds: usize,
    pub batch: BatchConfig,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Match,
    /// Outputs differed; the triple was saved under this index.
    Divergence(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub rounds: usize,
    pub divergences: usize,
}

pub struct Fuzzer<'a> {
    toolchain: &'a Toolchain,
    store: ArtifactStore,
    config: RunConfig,
    rng: StdRng,
}

impl<'a> Fuzzer<'a> {
    pub fn new(toolchain: &'a Toolchain, store: ArtifactStore, config: RunConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            toolchain,
            store,
            config,
            rng,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run every round inside one scratch directory, removed on every exit
    /// path. Stops at the first error.
    pub fn run(&mut self) -> Result<RunSummary, FoldError> {
        let scratch = tempfile::Builder::new()
            .prefix("sysy-fold-")
            .tempdir()
            .map_err(|source| FoldError::Io {
                path: std::env::temp_dir(),
                source,
            })?;

        let mut rounds = 0;
        for outer in 0..self.config.outer {
            for round in 0..self.config.rounds {
                let _span = info_span!("round", outer, round).entered();
                if let RoundOutcome::Divergence(index) = self.run_round(scratch.path())? {
                    debug!(index, "round diverged");
                }
                rounds += 1;
            }
            info!(
                outer,
                divergences = self.store.divergences(),
                "outer iteration done"
            );
        }

        Ok(RunSummary {
            rounds,
            divergences: self.store.divergences(),
        })
    }

    /// Build, run and compare one batch. Intermediate files go in `dir`.
    pub fn run_round(&mut self, dir: &Path) -> Result<RoundOutcome, FoldError> {
        let batch = Batch::generate(&mut self.rng, &self.config.batch);
        let input = batch.input_bytes();
        debug!(input = batch.input, cases = batch.cases.len(), "batch drawn");

        let subject_source = render(Language::Subject, &batch);
        let reference_source = render(Language::Reference, &batch);
        let subject_path = write_source(dir, Language::Subject, &subject_source)?;
        let reference_path = write_source(dir, Language::Reference, &reference_source)?;

        let expected = self
            .toolchain
            .compile_and_run_reference(&reference_path, &input)?;
        if let Some(model) = batch.expected_output()
            && model != expected.stdout
        {
            warn!(
                input = batch.input,
                "reference output disagrees with C integer semantics"
            );
        }

        let actual = match self.toolchain.compile_and_run(&subject_path, &input) {
            Ok(output) => output,
            Err(e) if e.is_subject_defect() => {
                let path = self.store.archive_bad_program(&subject_source)?;
                eprintln!("program archived to {}", path.display());
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if actual.stdout == expected.stdout {
            return Ok(RoundOutcome::Match);
        }

        let index =
            self.store
                .record_divergence(&expected.record(), &actual.record(), &batch.listing())?;
        println!(
            "Error! Divergence #{index} recorded ({} so far)",
            self.store.divergences()
        );
        Ok(RoundOutcome::Divergence(index))
    }
}

fn write_source(dir: &Path, language: Language, text: &str) -> Result<PathBuf, FoldError> {
    let path = dir.join("file").with_extension(language.extension());
    fs::write(&path, text).map_err(|source| FoldError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
