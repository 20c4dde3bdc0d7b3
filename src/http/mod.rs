//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, health route, fallback, timeout)
//!     → pipeline.rs (ordered security stages)
//!     → echo.rs or application routes (handlers call validators)
//!     → Send to client
//! ```

pub mod echo;
pub mod pipeline;
pub mod server;

pub use pipeline::{PipelineBuilder, PipelineError, Stage};
pub use server::ShieldServer;
