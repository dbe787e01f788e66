//! `flo-narrow`: the width-only CLI tool.
//!
//! `--width <w> --input <path> --output <path>`; `--version` prints a
//! version string. Any other invocation shape is a `clap` usage error,
//! which exits non-zero before the pass ever runs.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use flo_lower::{CatdPolicy, Driver, FloError, LoweringConfig};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "flo-narrow", version, about = "Width-lowering pass for the Flo netlist IR")]
struct Args {
    /// Target machine word length, in bits.
    #[arg(long)]
    width: u32,
    /// Input netlist path.
    #[arg(long)]
    input: String,
    /// Output netlist path.
    #[arg(long)]
    output: String,
}

fn run(args: Args) -> Result<(), FloError> {
    let text = fs::read_to_string(&args.input)?;
    let parsed = flo_lower::format::parse(&text)?;

    // Width lowering alone never splits memories; a depth ceiling larger
    // than any realistic input makes split_mem's fast path a no-op.
    let cfg = LoweringConfig::new(args.width, u32::MAX, CatdPolicy::OnChain)?;
    let driver = Driver::new();
    let out = driver.run(parsed, &cfg, true)?;

    fs::write(&args.output, out)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "flo-narrow failed");
            eprintln!("flo-narrow: {e}");
            ExitCode::FAILURE
        }
    }
}
