//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from environment or config
//! - Optionally mirror output to `<dir>/application.log`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level
//! - File output is append-only; rotation is left to the host

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggerConfig};

/// File name used under `logger.dir`.
pub const LOG_FILE_NAME: &str = "application.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggerConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let (writer, ansi) = match &config.dir {
        Some(dir) => {
            let path = dir.join(LOG_FILE_NAME);
            let file = fs::create_dir_all(dir)
                .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
                .map_err(|source| LoggingError::File { path, source })?;
            (BoxMakeWriter::new(std::io::stdout.and(Mutex::new(file))), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    };

    tracing_subscriber::registry().with(fmt_layer).with(filter).try_init()?;

    Ok(())
}
