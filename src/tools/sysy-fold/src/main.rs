// main.rs
//! sysy-fold: differential constant-folding fuzzer for the SysY compiler.

mod artifacts;
mod batch;
mod cli;
mod driver;
mod error;
mod exec;
mod render;
mod toolchain;

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use artifacts::ArtifactStore;
use batch::BatchConfig;
use cli::Cli;
use driver::{Fuzzer, RunConfig};

/// Install a stderr subscriber when `SYSY_LOG` holds a filter directive.
fn init_tracing() {
    let Ok(filter) = EnvFilter::try_from_env("SYSY_LOG") else {
        return;
    };
    if std::env::var("SYSY_LOG_STYLE").is_ok_and(|style| style == "full") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_summary(cli: &Cli, seed: u64) {
    println!("sysy-fold: constant folding fuzzer");
    println!();
    println!("  compiler:     {}", cli.compiler.display());
    println!(
        "  subject:      {} + {} under {}",
        cli.cross_cc.display(),
        cli.runtime_lib.display(),
        cli.emulator.display()
    );
    println!("  reference:    {}", cli.reference_cc.display());
    println!("  artifacts:    {}", cli.artifacts.display());
    println!(
        "  rounds:       {} x {} ({} expressions each)",
        cli.outer,
        cli.rounds,
        cli.cases * 2
    );
    println!("  timeout:      {}s", cli.timeout);
    println!("  seed:         {seed}");
    println!();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    if let Err(msg) = cli::validate(&cli) {
        eprintln!("error: {msg}");
        return ExitCode::FAILURE;
    }

    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    print_summary(&cli, seed);

    let toolchain = cli.toolchain();
    let config = RunConfig {
        outer: cli.outer,
        rounds: cli.rounds,
        batch: BatchConfig {
            cases: cli.cases,
            ..BatchConfig::default()
        },
        seed,
    };
    let mut fuzzer = Fuzzer::new(&toolchain, ArtifactStore::new(cli.artifacts.clone()), config);

    match fuzzer.run() {
        Ok(summary) => {
            println!();
            println!("sysy-fold: finished");
            println!("  rounds:       {}", summary.rounds);
            println!("  divergences:  {}", summary.divergences);
            if summary.divergences > 0 {
                println!("  records in:   {}", fuzzer.store().dir().display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", e.headline());
            eprintln!("error: {e}");
            eprintln!(
                "  divergences before abort: {} (seed {seed})",
                fuzzer.store().divergences()
            );
            ExitCode::FAILURE
        }
    }
}
