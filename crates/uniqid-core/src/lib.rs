//! UNIQID Core - Family-scoped unique identity tokens
//!
//! This crate defines:
//! - Identity tokens that move their serial on duplication (UniqueId)
//! - Families and the registry holding their counters and labels
//! - Lifecycle event sinks
//! - Registry configuration and error types

pub mod family;
pub mod token;
pub mod sink;
pub mod config;
pub mod error;

pub use family::{FamilyKey, FamilyRegistry, FamilyStats};
pub use token::*;
pub use sink::*;
pub use config::*;
pub use error::*;
