//! Chat session manager
//!
//! One [`ChatSession`] exists per process; every surface clones the
//! handle and observes the same state through the core change bus.

pub mod manager;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use manager::ChatSession;
pub use types::{SendOptions, SendOutcome, SessionOptions};
