//! Face identifiers and link properties.
//!
//! Faces are the boundary abstraction through which packets enter and leave
//! the engine; the engine itself only ever sees these identifiers and
//! properties, never sockets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u32);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face={}", self.0)
    }
}

/// Face ids below this value are reserved for internal use.
pub const FACEID_RESERVED_MAX: u32 = 255;

/// Reserved face id attributed to Data served from the Content Store.
pub const FACEID_CONTENT_STORE: FaceId = FaceId(254);

/// Whether a face connects to a local application or to the network.
///
/// Names under reserved prefixes such as `/localhost` must never cross a
/// non-local face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceScope {
    /// The peer is an application on this host.
    Local,
    /// The peer is reached over the network.
    NonLocal,
}

/// The link-layer sharing model of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    /// Exactly one peer; Nacks are only defined on these links.
    PointToPoint,
    /// Shared medium with multiple peers.
    MultiAccess,
    /// Wireless ad hoc link; a peer may legitimately need packets echoed
    /// back on the ingress link.
    AdHoc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_id_display() {
        assert_eq!(FaceId(7).to_string(), "face=7");
    }
}
