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

//! File-backed configuration document shared by every rolecall component.
//!
//! Layout: `model.rs` (document and per-community models), `validate.rs`
//! (load-time invariants), `store.rs` (`ConfigStore` with serialized
//! read-modify-write transactions and atomic persistence).

mod defaults;
pub mod error;
pub mod model;
pub mod store;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{CommunityConfig, ConfigDocument};
pub use store::{ConfigStore, Transition, UpdateError};
