pub mod align;
pub mod config;
pub mod distance;
pub mod errors;
pub mod region;
mod runner;
pub mod seq;
pub mod tree;
pub mod upgma;

use crate::errors::PhyloError;

pub use crate::runner::{output_info, run_pipeline, PipelineOutput};

pub fn run() -> Result<(), PhyloError> {
    runner::run()
}
