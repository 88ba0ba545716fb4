#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Logging and tracing primitives shared across the rolecall workspace.
//!
//! Layout: `init.rs` (subscriber installation and log format selection),
//! `context.rs` (application span guard and per-event span fields),
//! `error.rs` (telemetry error types).

pub mod context;
pub mod error;
pub mod init;

pub use context::{GlobalContextGuard, set_event_context};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
