//! Hierarchical names.
//!
//! A [`Name`] is an ordered sequence of opaque binary components. Names are
//! totally ordered in canonical order (per component: shorter first, then
//! lexicographic on bytes), which is the order the Content Store relies on
//! for prefix-range scans.

use crate::error::Error;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A single name component: an opaque byte string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameComponent(pub Bytes);

impl NameComponent {
    /// Creates a new name component from a byte sequence.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the component as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the smallest component strictly greater than `self` in
    /// canonical order.
    ///
    /// Increments the component with carry; a component of all `0xff` bytes
    /// overflows into the one-byte-longer all-zero component.
    pub fn successor(&self) -> Self {
        let mut bytes = self.0.to_vec();
        for b in bytes.iter_mut().rev() {
            if *b < 0xff {
                *b += 1;
                return Self::new(bytes);
            }
            *b = 0;
        }
        bytes.push(0);
        Self::new(bytes)
    }
}

impl Ord for NameComponent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Canonical order: shorter components sort first.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print printable ASCII characters directly, otherwise percent-escape.
        for &b in self.0.iter() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

/// A hierarchical name: an ordered sequence of components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// Creates a new empty name (the root prefix `/`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a name from its URI representation, e.g. `/app/video/7`.
    ///
    /// Components may contain `%XX` percent-escapes for arbitrary bytes.
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        let trimmed = uri.trim();
        if trimmed.is_empty() || !trimmed.starts_with('/') {
            return Err(Error::InvalidUri(uri.to_string()));
        }

        let mut components = Vec::new();
        for part in trimmed.split('/').filter(|p| !p.is_empty()) {
            components.push(parse_component(part).ok_or_else(|| Error::InvalidUri(uri.to_string()))?);
        }
        Ok(Self { components })
    }

    /// Adds a component to the end of the name.
    pub fn push(&mut self, component: NameComponent) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Returns the number of components in the name.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the name has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns an iterator over the name components.
    pub fn components(&self) -> impl Iterator<Item = &NameComponent> {
        self.components.iter()
    }

    /// Gets a component at the specified index.
    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// Returns a prefix of this name with the specified number of components.
    pub fn get_prefix(&self, len: usize) -> Self {
        Self {
            components: self.components.iter().take(len).cloned().collect(),
        }
    }

    /// Checks if this name is a prefix of another name.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }
        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| a == b)
    }

    /// Returns the smallest name strictly greater than every name that has
    /// `self` as a prefix.
    ///
    /// Together with canonical ordering this makes `[name, name.successor())`
    /// the range of all names under the `name` prefix.
    pub fn successor(&self) -> Self {
        let mut components = self.components.clone();
        match components.pop() {
            Some(last) => components.push(last.successor()),
            None => components.push(NameComponent::new(vec![0u8])),
        }
        Self { components }
    }
}

fn parse_component(part: &str) -> Option<NameComponent> {
    let raw = part.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hi = raw.get(i + 1).and_then(|c| (*c as char).to_digit(16))?;
            let lo = raw.get(i + 2).and_then(|c| (*c as char).to_digit(16))?;
            bytes.push(((hi << 4) | lo) as u8);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    Some(NameComponent::new(bytes))
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}
