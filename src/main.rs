mod args;

use std::error::Error;
use std::fs;

use clap::Parser;
use log::info;

use args::CosquantArgs;
use cosquant::config_loader::load_config;
use cosquant::models::sample::samples_from_interleaved;
use cosquant::quantization::codebook::TreeQuantization;
use cosquant::quantization::Quantization;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let args = CosquantArgs::parse();

    let mut config = load_config(&args.config)?.quantizer;
    if let Some(codebook_size) = args.codebook_size {
        config.codebook_size = codebook_size;
    }
    if let Some(refinement_passes) = args.refinement_passes {
        config.refinement_passes = refinement_passes;
    }

    let data = fs::read(&args.input)?;
    let points = samples_from_interleaved(&data, config.dims)?;
    info!("read {} points from {}", points.len(), args.input.display());

    let mut quantizer = TreeQuantization::new(config)?;
    let mut samples = points.clone();
    quantizer.train(&mut samples)?;

    let mut total_sq_error = 0.0;
    for point in &points {
        total_sq_error += quantizer.quantize(&point.coords)?.sq_error;
    }
    info!(
        "mean squared error {}",
        total_sq_error / points.len().max(1) as f64
    );

    for codeword in quantizer.codebook()? {
        let coords: Vec<String> = codeword.point.iter().map(|v| format!("{:.3}", v)).collect();
        println!("{}\t{}\t{}", codeword.id, codeword.population, coords.join(" "));
    }
    Ok(())
}
