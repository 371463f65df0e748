//! Render or sample one cryo-EM image from a JSON run configuration
//!
//! # Usage
//!
//! ```bash
//! # Noisy sample with the seed from the config file
//! cargo run --release --bin simulate-image -- --config run.json --output sample.png
//!
//! # Noiseless render with a different defocus
//! cargo run --release --bin simulate-image -- -c run.json --noiseless --set defocus_u=15000
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cryo_shared::ifft2_real;
use cryo_shared::image_proc::export::save_png;
use cryo_sim::{ParameterPatch, RunConfig};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON run configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "simulated.png")]
    output: PathBuf,

    /// Override the configured random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Render without noise
    #[arg(long)]
    noiseless: bool,

    /// Parameter overrides as name=value, repeatable
    #[arg(long = "set", value_parser = parse_assignment)]
    overrides: Vec<(String, f64)>,
}

fn parse_assignment(raw: &str) -> Result<(String, f64)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got {raw:?}"))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {name}"))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let run = RunConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let pipeline = run
        .build_pipeline()
        .context("building the image pipeline")?;

    let patch: ParameterPatch = args.overrides.into_iter().collect();
    let pipeline = pipeline
        .update(&patch)
        .context("applying parameter overrides")?;

    let seed = args.seed.unwrap_or(run.seed);
    info!(
        "{} pipeline on {:?} at {} Å/px, {}",
        pipeline.level(),
        pipeline.config().shape(),
        pipeline.config().pixel_size(),
        if args.noiseless {
            "noiseless".to_string()
        } else {
            format!("seed {seed}")
        }
    );

    let spectrum = if args.noiseless {
        pipeline.render(None, None, true)
    } else {
        pipeline.sample(None, None, seed)
    }
    .context("simulating the image")?;

    save_png(&ifft2_real(&spectrum), &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
