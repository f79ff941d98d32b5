//! Stacks combining the breaker, the pool and the hedger.
//!
//! - **breaker_per_attempt**: every hedged attempt asks the breaker
//! - **breaker_per_call**: the breaker judges whole hedged calls
//! - **umbrella**: the same stacks through the `hedgeguard` re-exports

mod breaker_per_attempt;
mod breaker_per_call;
