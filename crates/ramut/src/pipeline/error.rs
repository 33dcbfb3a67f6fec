use std::path::PathBuf;

use thiserror::Error;

use crate::registry::RegistryError;
use crate::scan::PrefilterError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Pattern registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Prefilter error: {0}")]
    Prefilter(#[from] PrefilterError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Worker pool error: {0}")]
    Worker(String),
}
