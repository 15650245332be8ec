//! Opaque image payload handles

use crate::hash::ContentHash;
use std::fmt;
use std::sync::Arc;

/// An opaque handle to an image payload
///
/// The bytes are never inspected by the session; the handle only carries a
/// display name (used as the upload filename) and a content hash. Cloning is
/// cheap, the payload is shared.
#[derive(Clone)]
pub struct BinaryRef {
    name: Arc<str>,
    hash: ContentHash,
    bytes: Arc<[u8]>,
}

impl BinaryRef {
    /// Wrap a payload under the given name
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: Arc::from(name.into()),
            hash: ContentHash::compute(&bytes),
            bytes,
        }
    }

    /// Display name / upload filename
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content hash of the payload
    #[inline]
    #[must_use]
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Raw payload
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether two handles refer to identical bytes
    #[inline]
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl PartialEq for BinaryRef {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name
    }
}

impl Eq for BinaryRef {}

impl fmt::Debug for BinaryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryRef")
            .field("name", &self.name)
            .field("hash", &self.hash.short())
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_hash() {
        let a = BinaryRef::new("a.png", b"payload".to_vec());
        let b = BinaryRef::new("b.png", b"payload".to_vec());
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let a = BinaryRef::new("a.png", vec![7u8; 4096]);
        let printed = format!("{a:?}");
        assert!(printed.contains("len: 4096"));
        assert!(printed.len() < 200);
    }
}
