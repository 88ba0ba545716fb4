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
#![allow(clippy::redundant_pub_crate)]

//! rolecall application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (argument parsing and service wiring),
//! `console.rs` (stdin/stdout gateway and in-memory role directory).

/// Application bootstrap and argument loading.
pub mod bootstrap;
mod console;
/// Application-level error types.
pub mod error;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
