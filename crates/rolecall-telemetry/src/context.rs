//! Context propagation helpers for application and per-event spans.
//!
//! # Design
//! - Records the inbound event identifier on the per-event span; callers that
//!   need the identifier in their output hold on to it themselves.
//! - Provides an application-level span guard so top-level spans carry
//!   mode/build info.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    #[must_use]
    /// Enter the application-level tracing span for the lifetime of the guard.
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", mode = %mode, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Record the inbound event identity on a span declared with empty
/// `event_id` and `community` fields.
pub fn set_event_context(span: &Span, event_id: impl Into<String>, community: Option<&str>) {
    let event_id = event_id.into();
    span.record("event_id", tracing::field::display(&event_id));
    span.record("community", tracing::field::display(community.unwrap_or("-")));
}
