//! # Observability
//!
//! Structured logging for the link via `tracing`. Library code emits events
//! with the `tracing` macros; binaries call [`init_logging`] once at startup.
//!
//! ```text
//! encoder / decoder / channel ── tracing::debug!() ──┐
//!                                                    ▼
//!                                   EnvFilter ─▶ fmt layer ─▶ stderr
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
