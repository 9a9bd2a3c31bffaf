//! Retry and backoff policies.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization to keep terminals out of lockstep
//! - [`RetryPolicy`]   attempts per recovery round plus the backoff between them
//! - [`RetryRound`]    one round in progress, advanced once per tick
//!
//! ## Quick wiring
//! ```text
//! NetworkSupervisor (socket domain)
//!      └─► RetryRound::poll(now) every tick
//!           - Attempt  ─► probe.reconnect_socket()
//!           - Exhausted ─► FaultRaised(Socket), wait for the next periodic check
//! FetchCoordinator
//!      └─► backoff.next_ms(failures) gates the next attempt
//! ```

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::{RetryPolicy, RetryRound, RetryStep};
