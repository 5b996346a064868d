//! HTTP service with coordinated, deadline-bounded graceful shutdown.
//!
//! Termination signals cancel a lifecycle token; the [`ServiceRunner`] then
//! runs every teardown registered with its [`Closer`] concurrently and waits
//! for all of them or for the shutdown deadline, whichever comes first.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resources;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{CloseError, Closer, Deadline, ServiceRunner};
