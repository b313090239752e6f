pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use error::{RagError, Result};
pub use models::{Answer, Chunk, Config, Credentials, OutputFormat, PipelineConfig};
pub use services::{RagPipeline, RagPipelineBuilder};
