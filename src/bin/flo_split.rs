//! `flo-split`: the width+depth CLI tool.
//!
//! `--width <w> --depth <d> --input <path> --output <path>`.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use flo_lower::{CatdPolicy, Driver, FloError, LoweringConfig};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "flo-split", version, about = "Width- and depth-lowering pass for the Flo netlist IR")]
struct Args {
    /// Target machine word length, in bits.
    #[arg(long)]
    width: u32,
    /// Maximum physical memory depth, in entries.
    #[arg(long)]
    depth: u32,
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

    let cfg = LoweringConfig::new(args.width, args.depth, CatdPolicy::OnChainExceptWr)?;
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
            error!(%e, "flo-split failed");
            eprintln!("flo-split: {e}");
            ExitCode::FAILURE
        }
    }
}
