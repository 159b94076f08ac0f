//! Shared data model for the NFE (Named-data Forwarding Engine) implementation.
//!
//! This crate provides the packet types, hierarchical names, face identifiers
//! and counters used by the forwarding engine and by applications embedding it.

pub mod error;
pub mod metrics;
pub mod name;
pub mod packet;
pub mod types;

/// Reexport of common types
pub use error::Error;
pub use name::{Name, NameComponent};
pub use packet::{CacheHint, Data, Interest, Nack, NackReason};
pub use types::{FaceId, FaceScope, LinkType};

pub type Result<T> = std::result::Result<T, Error>;
