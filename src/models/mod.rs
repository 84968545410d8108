pub mod sample;
pub mod types;
