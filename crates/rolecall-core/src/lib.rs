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

//! Self-assignable role management on top of the shared configuration store.
//!
//! Layout: `policy.rs` (who may change an allow-list), `directory.rs` (the
//! chat-platform capability seam), `outcome.rs` (typed results and replies),
//! `service.rs` (`AllowListService`), `router.rs` (command parsing and dispatch).

pub mod directory;
pub mod outcome;
pub mod policy;
pub mod router;
pub mod service;

pub use directory::{RoleDirectory, RoleHandle};
pub use outcome::{Failure, Mutation, Outcome, Reply, ReplyStatus, ReplyTarget, Success};
pub use policy::{Actor, can_modify_allow_list};
pub use router::{COMMAND_PREFIX, Command, CommandRouter, InboundMessage, ParsedCommand, parse};
pub use service::AllowListService;
