//! Change bus for chat surfaces
//!
//! Every surface attached to a session (floating widget, full chat page,
//! terminal) holds a [`SessionObserver`]. Persona changes are published on
//! a watch channel so observers read the latest value without awaiting;
//! everything else is fanned out as [`SessionEvent`]s.

pub mod channel;
pub mod events;

pub use channel::{SessionEvents, SessionObserver};
pub use events::{ChangeSource, SessionEvent};
