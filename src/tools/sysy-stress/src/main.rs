//! sysy-stress: random SysY program generator for the compiler's fuzz corpus.

mod expr;
mod manifest;
mod profile;
mod program;
mod symbols;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use manifest::Manifest;
use profile::get_profile;
use program::ProgramGenerator;

#[derive(Parser)]
#[command(name = "sysy-stress")]
#[command(version)]
#[command(about = "Generate random SysY programs for the compiler test corpus")]
struct Cli {
    /// Random seed for reproducibility (default: derived from the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of programs to write (`0.sy`, `1.sy`, ...)
    #[arg(long, default_value_t = 3)]
    count: usize,

    /// Output directory
    #[arg(long, default_value = "test/fuzz")]
    output: PathBuf,

    /// Generation profile name, or a path to a profile TOML file
    #[arg(long, default_value = "default")]
    profile: String,
}

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

fn run(cli: Cli) -> Result<(), String> {
    let profile = get_profile(&cli.profile).map_err(|e| e.to_string())?;

    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    fs::create_dir_all(&cli.output).map_err(|e| {
        format!(
            "failed to create output directory '{}': {}",
            cli.output.display(),
            e
        )
    })?;

    let mut generator = ProgramGenerator::new(&mut rng, &profile.program, &profile.expr);
    let mut files = Vec::with_capacity(cli.count);
    for index in 0..cli.count {
        let program = generator.generate_program();
        tracing::debug!(
            index,
            symbols = generator.table().len(),
            statements = program.body.len(),
            "generated program"
        );

        let file_name = format!("{index}.sy");
        let path = cli.output.join(&file_name);
        fs::write(&path, program.to_string())
            .map_err(|e| format!("failed to write '{}': {}", path.display(), e))?;
        files.push(file_name);
    }

    let manifest = Manifest::new(seed, cli.profile.clone(), files);
    manifest
        .write_to_dir(&cli.output)
        .map_err(|e| format!("failed to write manifest: {e}"))?;

    println!("sysy-stress: generated {} program(s)", cli.count);
    println!("  seed:    {seed}");
    println!("  profile: {}", cli.profile);
    println!("  output:  {}", cli.output.display());
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}
