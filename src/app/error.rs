//! Application assembly errors.

use thiserror::Error;

use crate::config::ConfigError;
use crate::container::ContainerError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("at least one module is required")]
    NoModules,

    #[error("invalid module at position {index}: {reason}")]
    InvalidModule { index: usize, reason: String },

    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid server origin: {0}")]
    Origin(#[from] url::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
