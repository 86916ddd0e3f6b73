// cli.rs
//! CLI argument parsing for sysy-fold.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::toolchain::Toolchain;

/// Differential fuzzer for constant folding in the SysY compiler.
///
/// Each round writes a batch of paired `x OP c1 COMP c2` / `c1 OP x COMP c2`
/// expressions as a SysY program and as a C program, runs both with the same
/// input and compares their output. Compiler crashes and hangs abort the run
/// and leave the offending program in the artifacts directory.
#[derive(Parser, Debug)]
#[command(name = "sysy-fold")]
#[command(version)]
#[command(about = "Differential fuzzer for constant folding in the SysY compiler")]
pub struct Cli {
    // -- Toolchains --
    /// Compiler under test (`<compiler> <src> -o <asm>`)
    #[arg(long, value_name = "PATH", default_value = "build/sysc")]
    pub compiler: PathBuf,

    /// Cross compiler used to assemble and link the compiler output
    #[arg(long, value_name = "PATH", default_value = "riscv64-linux-gnu-gcc")]
    pub cross_cc: PathBuf,

    /// Runtime support library linked into every subject program
    #[arg(long, value_name = "PATH", default_value = "test/official/sylib.c")]
    pub runtime_lib: PathBuf,

    /// Emulator that runs the linked subject program
    #[arg(long, value_name = "PATH", default_value = "qemu-riscv64-static")]
    pub emulator: PathBuf,

    /// Trusted native C compiler
    #[arg(long, value_name = "PATH", default_value = "clang")]
    pub reference_cc: PathBuf,

    // -- Run shape --
    /// Directory for archived programs and divergence records
    #[arg(long, value_name = "DIR", default_value = "temp")]
    pub artifacts: PathBuf,

    /// Per-step timeout for compiling and running, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 5.0)]
    pub timeout: f64,

    /// Outer iterations
    #[arg(long, default_value_t = 20)]
    pub outer: usize,

    /// Rounds per outer iteration
    #[arg(long, default_value_t = 20)]
    pub rounds: usize,

    /// Cases per batch; each case yields two expressions
    #[arg(long, default_value_t = 20)]
    pub cases: usize,

    /// Random seed for reproducibility (default: derived from the clock)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            compiler: self.compiler.clone(),
            cross_cc: self.cross_cc.clone(),
            runtime_lib: self.runtime_lib.clone(),
            emulator: self.emulator.clone(),
            reference_cc: self.reference_cc.clone(),
            timeout: Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::MAX),
        }
    }
}

/// Validate the CLI arguments. Returns an error message if invalid.
pub fn validate(cli: &Cli) -> Result<(), String> {
    if !(cli.timeout.is_finite() && cli.timeout > 0.0) {
        return Err(format!("--timeout must be positive, got {}", cli.timeout));
    }
    if let Err(e) = Duration::try_from_secs_f64(cli.timeout) {
        return Err(format!("--timeout {} is out of range: {e}", cli.timeout));
    }
    if cli.cases == 0 {
        return Err("--cases must be at least 1".to_string());
    }
    if cli.artifacts.is_file() {
        return Err(format!(
            "--artifacts must be a directory: {}",
            cli.artifacts.display()
        ));
    }
    Ok(())
}
