//! Incremental digests for index trailer checksums.
//!
//! Index files end with two checksums whose width equals the object-id
//! width in use. This module wraps the two digest implementations behind
//! one incremental interface. No custom cryptography.

use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::object::{HashKind, ObjectId};

/// Streaming digest matching a [`HashKind`].
#[derive(Clone)]
pub enum Checksum {
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Checksum {
    /// Fresh digest state for the given kind.
    pub fn new(kind: HashKind) -> Self {
        match kind {
            HashKind::Sha1 => Self::Sha1(Sha1::new()),
            HashKind::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    /// The kind this digest produces.
    pub fn kind(&self) -> HashKind {
        match self {
            Self::Sha1(_) => HashKind::Sha1,
            Self::Sha256(_) => HashKind::Sha256,
        }
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
        }
    }

    /// Consume the state and produce the digest.
    pub fn finalize(self) -> ObjectId {
        match self {
            Self::Sha1(h) => ObjectId::from_digest(HashKind::Sha1, h.finalize().as_slice()),
            Self::Sha256(h) => ObjectId::from_digest(HashKind::Sha256, h.finalize().as_slice()),
        }
    }

    /// Digest of everything fed so far, without consuming the state.
    ///
    /// Trailer verification needs the digest of every byte *before* the
    /// stored checksum while the stream is still being read.
    pub fn snapshot(&self) -> ObjectId {
        self.clone().finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_one_shot_digest() {
        let mut c = Checksum::new(HashKind::Sha256);
        c.update(b"hello ");
        c.update(b"world");
        assert_eq!(
            c.finalize(),
            ObjectId::digest_of(HashKind::Sha256, b"hello world")
        );
    }

    #[test]
    fn snapshot_does_not_consume() {
        let mut c = Checksum::new(HashKind::Sha1);
        c.update(b"abc");
        let snap = c.snapshot();
        assert_eq!(snap, ObjectId::digest_of(HashKind::Sha1, b"abc"));

        c.update(b"def");
        assert_eq!(c.finalize(), ObjectId::digest_of(HashKind::Sha1, b"abcdef"));
    }

    #[test]
    fn kind_is_reported() {
        assert_eq!(Checksum::new(HashKind::Sha1).kind(), HashKind::Sha1);
        assert_eq!(Checksum::new(HashKind::Sha256).kind(), HashKind::Sha256);
    }

    #[test]
    fn digest_width_follows_kind() {
        let sha1 = Checksum::new(HashKind::Sha1).finalize();
        let sha256 = Checksum::new(HashKind::Sha256).finalize();
        assert_eq!(sha1.as_bytes().len(), 20);
        assert_eq!(sha256.as_bytes().len(), 32);
    }
}
