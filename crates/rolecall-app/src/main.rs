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
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Binary entrypoint that wires the rolecall services together and serves the
//! console gateway until its input closes.

use rolecall_app::{AppResult, run_app};

/// Bootstraps rolecall and blocks until the gateway input is exhausted.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
