//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML)
//!     → loader.rs (read & deserialize)
//!     → duration.rs (Go-style duration strings)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - Everything except `shutdown_timeout` has a default
//! - Validation separates syntactic (serde) from semantic checks

pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_from_str, ConfigError};
pub use schema::{HttpServerConfig, ObservabilityConfig, ResourceConfig, ServiceConfig};
pub use validation::ValidationError;
