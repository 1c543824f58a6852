use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;
use crate::error::TypeError;

/// Hash algorithm used for content addressing.
///
/// The kind fixes the identifier width everywhere it appears: object ids,
/// pack checksums, and index trailer checksums all share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashKind {
    /// SHA-1, 20-byte identifiers.
    Sha1,
    /// SHA-256, 32-byte identifiers.
    Sha256,
}

impl HashKind {
    /// Identifier width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }
}

/// Content-addressed identifier for a stored object.
///
/// Identifiers are fixed-width per [`HashKind`]. Ordering is byte-wise over
/// the significant bytes, which is also the sort order of every on-disk
/// index. Storage is padded to the widest kind; constructors keep the
/// padding zeroed so derived equality and ordering stay consistent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    kind: HashKind,
    bytes: [u8; 32],
}

impl ObjectId {
    /// Wrap a pre-computed hash of the width demanded by `kind`.
    pub fn from_hash(kind: HashKind, hash: &[u8]) -> Result<Self, TypeError> {
        if hash.len() != kind.width() {
            return Err(TypeError::InvalidLength {
                expected: kind.width(),
                actual: hash.len(),
            });
        }
        Ok(Self::from_digest(kind, hash))
    }

    /// Compute the identifier of raw content.
    pub fn digest_of(kind: HashKind, data: &[u8]) -> Self {
        let mut hasher = Checksum::new(kind);
        hasher.update(data);
        hasher.finalize()
    }

    /// The null identifier (all zeros). Represents "no object".
    pub const fn null(kind: HashKind) -> Self {
        Self {
            kind,
            bytes: [0u8; 32],
        }
    }

    /// Returns `true` if this is the null identifier.
    pub fn is_null(&self) -> bool {
        self.bytes == [0u8; 32]
    }

    /// The hash algorithm behind this identifier.
    pub const fn kind(&self) -> HashKind {
        self.kind
    }

    /// Identifier width in bytes.
    pub const fn width(&self) -> usize {
        self.kind.width()
    }

    /// The significant hash bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.kind.width()]
    }

    /// Leading byte, the fanout bucket this identifier falls into.
    pub fn first_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.bytes[..4])
    }

    /// Parse from a hex string of the width demanded by `kind`.
    pub fn from_hex(kind: HashKind, s: &str) -> Result<Self, TypeError> {
        let decoded = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_hash(kind, &decoded)
    }

    pub(crate) fn from_digest(kind: HashKind, digest: &[u8]) -> Self {
        debug_assert_eq!(digest.len(), kind.width());
        let mut bytes = [0u8; 32];
        bytes[..kind.width()].copy_from_slice(digest);
        Self { kind, bytes }
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
