//! Persona reference data
//!
//! The session treats persona ids as opaque strings; the catalog exists so
//! selection UIs can list choices and resolve display names.

pub mod catalog;

pub use catalog::{Persona, PersonaCatalog, Visibility};
