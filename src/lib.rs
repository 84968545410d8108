pub mod config_loader;
pub mod distance;
pub mod models;
pub mod quantization;
