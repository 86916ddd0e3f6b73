// toolchain.rs
//! The two build-and-run pipelines a round compares.
//!
//! Subject: `compiler src -o asm`, `cross-cc asm runtime -static -o bin`,
//! `emulator bin`. Reference: `reference-cc src -o bin`, `bin`.
//!
//! Every round reuses the same scratch paths, so each stage's output is
//! removed before the stage runs and must exist once it reports success.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use crate::error::{FoldError, describe_status, snippet};
use crate::exec::{self, Outcome};

#[derive(Debug, Clone)]
pub struct Toolchain {
    pub compiler: PathBuf,
    pub cross_cc: PathBuf,
    pub runtime_lib: PathBuf,
    pub emulator: PathBuf,
    pub reference_cc: PathBuf,
    pub timeout: Duration,
}

/// What a finished program printed and how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOutput {
    pub stdout: String,
    /// `exit code N` or `signal N`.
    pub status: String,
}

impl ProgramOutput {
    /// Text saved in a divergence record. Never empty: a program that printed
    /// nothing is recorded by how it ended.
    pub fn record(&self) -> String {
        if self.stdout.is_empty() {
            format!("<no output: {}>\n", self.status)
        } else {
            self.stdout.clone()
        }
    }
}

impl Toolchain {
    /// Compile `source` with the compiler under test, link it against the
    /// runtime library and run it under the emulator.
    ///
    /// A non-zero exit of the emulated program is not an error: whatever it
    /// printed is returned and compared.
    pub fn compile_and_run(
        &self,
        source: &Path,
        input: &[u8],
    ) -> Result<ProgramOutput, FoldError> {
        let asm = source.with_extension("s");
        let binary = source.with_extension("elf");

        remove_stale(&asm)?;
        let mut compile = Command::new(&self.compiler);
        compile.arg(source).arg("-o").arg(&asm);
        match self.run("compile", &mut compile, None, Some(self.timeout))? {
            Outcome::Success { .. } if !asm.exists() => {
                return Err(FoldError::CompilerCrash {
                    status: describe_status(Some(0), None),
                    stderr: format!("no assembly written to {}", asm.display()),
                });
            }
            Outcome::Success { .. } => {}
            Outcome::Failed {
                code,
                signal,
                stderr,
                ..
            } => {
                return Err(FoldError::CompilerCrash {
                    status: describe_status(code, signal),
                    stderr: snippet(&stderr),
                });
            }
            Outcome::TimedOut => {
                return Err(FoldError::CompilerTimeout(self.timeout.as_secs_f64()));
            }
        }

        remove_stale(&binary)?;
        let mut link = Command::new(&self.cross_cc);
        link.arg(&asm)
            .arg(&self.runtime_lib)
            .arg("-static")
            .arg("-o")
            .arg(&binary);
        match self.run("link", &mut link, None, None)? {
            Outcome::Success { .. } if !binary.exists() => {
                return Err(FoldError::LinkFailed {
                    status: describe_status(Some(0), None),
                    stderr: format!("no binary written to {}", binary.display()),
                });
            }
            Outcome::Failed {
                code,
                signal,
                stderr,
                ..
            } => {
                return Err(FoldError::LinkFailed {
                    status: describe_status(code, signal),
                    stderr: snippet(&stderr),
                });
            }
            _ => {}
        }

        let mut emulate = Command::new(&self.emulator);
        emulate.arg(&binary);
        match self.run("emulate", &mut emulate, Some(input), Some(self.timeout))? {
            Outcome::Success { stdout, .. } => Ok(ProgramOutput {
                stdout,
                status: describe_status(Some(0), None),
            }),
            Outcome::Failed {
                code,
                signal,
                stdout,
                ..
            } => {
                let status = describe_status(code, signal);
                debug!(status = %status, "subject program exited unsuccessfully");
                Ok(ProgramOutput { stdout, status })
            }
            Outcome::TimedOut => Err(FoldError::ProgramTimeout(self.timeout.as_secs_f64())),
        }
    }

    /// Compile `source` with the reference compiler and run the native binary.
    pub fn compile_and_run_reference(
        &self,
        source: &Path,
        input: &[u8],
    ) -> Result<ProgramOutput, FoldError> {
        let binary = source.with_extension("native");

        remove_stale(&binary)?;
        let mut compile = Command::new(&self.reference_cc);
        compile.arg(source).arg("-o").arg(&binary);
        match self.run("reference compile", &mut compile, None, None)? {
            Outcome::Success { .. } if !binary.exists() => {
                return Err(FoldError::Reference {
                    stage: "compile",
                    detail: format!("no binary written to {}", binary.display()),
                });
            }
            Outcome::Success { .. } => {}
            Outcome::Failed {
                code,
                signal,
                stderr,
                ..
            } => {
                return Err(FoldError::Reference {
                    stage: "compile",
                    detail: format!("{}: {}", describe_status(code, signal), snippet(&stderr)),
                });
            }
            Outcome::TimedOut => {
                return Err(FoldError::Reference {
                    stage: "compile",
                    detail: "timed out".to_string(),
                });
            }
        }

        let mut program = Command::new(&binary);
        match self.run("reference run", &mut program, Some(input), Some(self.timeout))? {
            Outcome::Success { stdout, .. } => Ok(ProgramOutput {
                stdout,
                status: describe_status(Some(0), None),
            }),
            Outcome::Failed { code, signal, .. } => Err(FoldError::Reference {
                stage: "run",
                detail: describe_status(code, signal),
            }),
            Outcome::TimedOut => Err(FoldError::Reference {
                stage: "run",
                detail: format!("timed out after {:.1}s", self.timeout.as_secs_f64()),
            }),
        }
    }

    fn run(
        &self,
        stage: &'static str,
        command: &mut Command,
        input: Option<&[u8]>,
        deadline: Option<Duration>,
    ) -> Result<Outcome, FoldError> {
        let program = command.get_program().to_owned();
        let execution =
            exec::run(command, input, deadline).map_err(|source| FoldError::Spawn {
                program: display_program(&program),
                source,
            })?;
        debug!(
            stage,
            elapsed_ms = execution.duration.as_millis() as u64,
            outcome = outcome_name(&execution.outcome),
            stderr = %snippet(execution.outcome.stderr()),
            "subprocess finished"
        );
        Ok(execution.outcome)
    }
}

/// Delete an output left behind by an earlier round.
fn remove_stale(path: &Path) -> Result<(), FoldError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(FoldError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
        _ => Ok(()),
    }
}

fn display_program(program: &OsStr) -> String {
    program.to_string_lossy().into_owned()
}

fn outcome_name(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Success { .. } => "success",
        Outcome::Failed { .. } => "failed",
        Outcome::TimedOut => "timed-out",
    }
}
