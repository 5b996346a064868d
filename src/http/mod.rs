//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown on stop token)
//!     → middleware/logging.rs (method, host, latency, metrics)
//!     → index handler (current time)
//! ```

pub mod middleware;
pub mod server;

pub use server::HttpServer;
