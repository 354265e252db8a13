//! Writer construction.
//!
//! # Responsibilities
//! - Open the rotating file sink described by `FileConfig`
//! - Compose several writers into one that duplicates every record
//!
//! # Design Decisions
//! - Writers are `MakeWriter`s so the file, stdout and caller-supplied
//!   targets share one shape and are safe to use from many threads
//! - Rotation and retention belong to `tracing-appender`; only the policy
//!   is chosen here

use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use crate::config::{FileConfig, RotationPolicy};

impl From<RotationPolicy> for Rotation {
    fn from(policy: RotationPolicy) -> Self {
        match policy {
            RotationPolicy::Minutely => Rotation::MINUTELY,
            RotationPolicy::Hourly => Rotation::HOURLY,
            RotationPolicy::Daily => Rotation::DAILY,
            RotationPolicy::Never => Rotation::NEVER,
        }
    }
}

/// Open the rotating file sink. Creates the directory if needed.
pub fn rolling_file(config: &FileConfig, policy: RotationPolicy) -> Result<RollingFileAppender, InitError> {
    let mut builder = RollingFileAppender::builder()
        .rotation(policy.into())
        .filename_prefix(config.filename.clone());

    if let Some(max_files) = config.max_files {
        builder = builder.max_log_files(max_files);
    }

    builder.build(&config.directory)
}

/// Combine writers so each record is written to all of them, in order.
pub fn tee(writers: Vec<BoxMakeWriter>) -> BoxMakeWriter {
    writers
        .into_iter()
        .reduce(|first, next| BoxMakeWriter::new(first.and(next)))
        .unwrap_or_else(|| BoxMakeWriter::new(std::io::sink))
}
