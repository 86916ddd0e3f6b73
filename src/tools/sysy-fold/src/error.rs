//! Errors that end a fuzzing run.
//!
//! Only failures that stop the run are errors; a divergence between the two
//! toolchains is a normal round outcome and never reaches this type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FoldError {
    /// The compiler under test exited unsuccessfully.
    #[error("compiler failed with {status}: {stderr}")]
    CompilerCrash { status: String, stderr: String },

    #[error("compiler did not finish within {0:.1}s")]
    CompilerTimeout(f64),

    /// The cross toolchain rejected the assembly the compiler produced.
    #[error("assembling the compiler output failed with {status}: {stderr}")]
    LinkFailed { status: String, stderr: String },

    /// The compiled program did not finish under the emulator.
    #[error("compiled program did not finish within {0:.1}s")]
    ProgramTimeout(f64),

    #[error("reference toolchain failed to {stage}: {detail}")]
    Reference { stage: &'static str, detail: String },

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FoldError {
    /// Whether the error points at a defect in the compiler under test.
    ///
    /// These are the failures whose triggering program gets archived.
    pub fn is_subject_defect(&self) -> bool {
        matches!(
            self,
            FoldError::CompilerCrash { .. }
                | FoldError::CompilerTimeout(_)
                | FoldError::LinkFailed { .. }
                | FoldError::ProgramTimeout(_)
        )
    }

    /// One-line console headline for the failure class.
    pub fn headline(&self) -> &'static str {
        match self {
            FoldError::CompilerCrash { .. } | FoldError::CompilerTimeout(_) => {
                "Compiler internal error."
            }
            FoldError::LinkFailed { .. } => "Compiler produced invalid assembly.",
            FoldError::ProgramTimeout(_) => "Program timeout.",
            FoldError::Reference { .. } => "Reference toolchain failure.",
            FoldError::Spawn { .. } | FoldError::Io { .. } => "Harness failure.",
        }
    }
}

/// Describe how a process ended, e.g. `exit code 3` or `signal 11`.
pub fn describe_status(code: Option<i32>, signal: Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(signal)) => format!("signal {signal}"),
        (None, None) => "unknown status".to_string(),
    }
}

/// First non-blank line of a stream, capped at 200 characters.
pub fn snippet(text: &str) -> String {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .chars()
        .take(200)
        .collect()
}
