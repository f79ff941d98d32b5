//! Core infrastructure for hedgeguard.
//!
//! This crate provides the pieces shared by the breaker, the worker pool and
//! the hedger:
//! - Event system for observability
//! - Cancellation scopes that hedged attempts run under
//! - An error container for aggregating attempt failures

pub mod events;
mod multi_error;
mod scope;

pub use events::{EventListener, EventListeners, FnListener, GuardEvent, SharedListener};
pub use multi_error::{ErrorFormatter, MultiError};
pub use scope::{deadline_after, CancelScope, ScopeError};
