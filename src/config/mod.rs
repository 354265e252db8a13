//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config (validated)
//!     → LoggerHandle::initialize (sink + tracing agent + swap)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → reloader re-initializes the handle
//!     → every later emission observes the new logger
//! ```
//!
//! # Design Decisions
//! - Enumerated settings are strings in the schema so errors can name them
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{Config, ExporterKind, FileConfig, LogFormat, RotationPolicy, SinkMode, TraceConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::{spawn_reloader, ConfigWatcher};
