//! NDN-style packet types.
//!
//! These are the in-memory representations the forwarding engine operates on;
//! wire encoding and decoding happen outside the engine boundary.

use crate::name::Name;
use crate::types::FaceId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default Interest lifetime when the requester does not specify one.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_secs(4);

/// A request packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interest {
    /// The name requested by the Interest.
    pub name: Name,

    /// Whether a Data packet whose name extends this name can satisfy it.
    pub can_be_prefix: bool,

    /// Whether only fresh Data (within its freshness period) may satisfy it.
    pub must_be_fresh: bool,

    /// Correlation token used for loop detection.
    pub nonce: u32,

    /// How long the request stays pending.
    pub lifetime: Duration,

    /// Delegation names steering the Interest towards a producer region.
    pub forwarding_hint: Vec<Name>,

    /// Explicit egress override; when set, forwarding bypasses the strategy.
    pub next_hop_face: Option<FaceId>,
}

impl Interest {
    /// Creates a new Interest with default selectors.
    pub fn new(name: Name, nonce: u32) -> Self {
        Self {
            name,
            can_be_prefix: false,
            must_be_fresh: false,
            nonce,
            lifetime: DEFAULT_INTEREST_LIFETIME,
            forwarding_hint: Vec::new(),
            next_hop_face: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Sets the Interest lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Sets the CanBePrefix selector.
    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    /// Sets the MustBeFresh selector.
    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    /// Sets the forwarding hint.
    pub fn with_forwarding_hint(mut self, hint: Vec<Name>) -> Self {
        self.forwarding_hint = hint;
        self
    }

    /// Sets the explicit next-hop override.
    pub fn with_next_hop_face(mut self, face: FaceId) -> Self {
        self.next_hop_face = Some(face);
        self
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?nonce={}", self.name, self.nonce)
    }
}

/// Caching directive attached to a Data packet by its producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CacheHint {
    /// No directive; caches decide on their own.
    #[default]
    Default,
    /// The packet must not be cached anywhere.
    NoCache,
}

/// A response packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data {
    /// The full name of the Data.
    pub name: Name,

    /// The payload.
    pub content: Bytes,

    /// How long after arrival the Data counts as fresh.
    pub freshness_period: Duration,

    /// Producer caching directive.
    pub cache_hint: CacheHint,
}

impl Data {
    /// Creates a new Data packet with zero freshness.
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content: content.into(),
            freshness_period: Duration::ZERO,
            cache_hint: CacheHint::Default,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Sets the freshness period.
    pub fn with_freshness_period(mut self, period: Duration) -> Self {
        self.freshness_period = period;
        self
    }

    /// Marks the packet as not cacheable.
    pub fn with_no_cache(mut self) -> Self {
        self.cache_hint = CacheHint::NoCache;
        self
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Why an upstream refused to handle an Interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NackReason {
    Congestion,
    Duplicate,
    NoRoute,
}

impl fmt::Display for NackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NackReason::Congestion => write!(f, "Congestion"),
            NackReason::Duplicate => write!(f, "Duplicate"),
            NackReason::NoRoute => write!(f, "NoRoute"),
        }
    }
}

/// A negative acknowledgment wrapping the refused Interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nack {
    pub interest: Interest,
    pub reason: NackReason,
}

impl Nack {
    pub fn new(interest: Interest, reason: NackReason) -> Self {
        Self { interest, reason }
    }
}

impl fmt::Display for Nack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.interest.name, self.reason)
    }
}
