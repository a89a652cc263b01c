//! Core types and traits for the NCUACG chat assistant client
//!
//! This crate provides the session data model, the persistence port,
//! the persona catalog and the change bus shared by every chat surface,
//! plus configuration and logging.

pub mod bus;
pub mod config;
pub mod error;
pub mod logging;
pub mod persona;
pub mod session;
pub mod storage;
pub mod utils;

pub use error::{Error, Result};
