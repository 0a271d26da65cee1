//! Headless cartridge runner: loads a `.tic`/`.tic.png` cartridge and
//! drives it for a fixed number of ticks with no input and no script
//! host, for smoke-testing the core in isolation.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tic_core::{Input, Vm};

#[derive(Parser, Debug)]
#[command(name = "ticcore", about = "Run a fantasy-console cartridge headlessly")]
struct Args {
    /// Path to a .tic or .tic.png cartridge file.
    cart: PathBuf,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 60)]
    ticks: u32,

    /// Output sample rate for the audio engine.
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let bytes = fs::read(&args.cart)
        .with_context(|| format!("reading cartridge {}", args.cart.display()))?;

    let mut vm = Vm::with_sample_rate(args.sample_rate);
    vm.load_cart(&bytes)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("loading cartridge {}", args.cart.display()))?;

    log::info!("loaded {} ({} bytes of code)", args.cart.display(), vm.code().len());

    let mut total_samples = 0usize;
    for tick in 0..args.ticks {
        vm.tick_start(&Input::default());
        let pcm = vm.tick_end();
        total_samples += pcm.len();
        if vm.exit_requested() {
            log::info!("cartridge requested exit at tick {tick}");
            break;
        }
    }

    println!("ran {} ticks, produced {} stereo samples", args.ticks, total_samples / 2);
    Ok(())
}
