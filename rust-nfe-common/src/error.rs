//! Error types for the NFE data model.

use thiserror::Error;

/// All possible errors that can occur while handling the NFE data model.
#[derive(Error, Debug)]
pub enum Error {
    /// A name URI could not be parsed.
    #[error("invalid name URI: {0}")]
    InvalidUri(String),
}
