//! `volprobe <config> [--frames N] [--export out.vol] [--slice out.png]`
//!
//! Loads a scene, primes its probe, runs N updates with per-frame timing,
//! then optionally exports the filtered volume.

use std::time::Instant;

use clap::Parser;
use env_logger::Env;
use volprobe::cli::CliArgs;
use volprobe::{load_scene, GpuContext, Result};

fn run(args: &CliArgs) -> Result<()> {
    let ctx = GpuContext::new_headless_blocking()?;

    let start = Instant::now();
    let mut scene = load_scene(&ctx, &args.config)?;
    scene.prime(&ctx)?;
    log::info!("Probe primed in {:.1?}", start.elapsed());

    for frame in 0..args.frames {
        let start = Instant::now();
        scene.update(&ctx)?;
        ctx.wait_idle();
        let elapsed = start.elapsed().as_secs_f64();
        log::info!(
            "frame {}/{}: {:.2} ms ({:.1} fps)",
            frame + 1,
            args.frames,
            elapsed * 1000.0,
            1.0 / elapsed.max(1e-9)
        );
    }

    if let Some(path) = &args.export {
        scene.export_filtered(&ctx, path)?;
    }
    if let Some(path) = &args.slice {
        scene.export_slice(&ctx, path)?;
    }
    Ok(())
}

fn main() {
    let args = CliArgs::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
