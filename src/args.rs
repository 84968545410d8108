use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
pub struct CosquantArgs {
    /// Path to the quantizer config file.
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Raw input file, `dims` bytes per point, points packed back to back.
    #[arg(long)]
    pub input: PathBuf,

    /// Overrides `codebook_size` from the config file.
    #[arg(long)]
    pub codebook_size: Option<usize>,

    /// Overrides `refinement_passes` from the config file.
    #[arg(long)]
    pub refinement_passes: Option<usize>,
}
