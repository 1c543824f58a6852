use harbor_types::{HashKind, ObjectId};

use crate::error::{IdxError, IdxResult};
use crate::fanout::FanoutTable;
use crate::index::MemoryIndex;

/// Accumulates entries during pack creation and publishes an immutable
/// [`MemoryIndex`].
///
/// The pack-content side hands over one `(id, crc32, offset)` triple per
/// object as it writes the pack; CRCs are taken as given, never recomputed
/// here. Single-writer: exactly one actor owns the builder until
/// [`finish`](Self::finish) publishes the result.
pub struct IndexBuilder {
    kind: HashKind,
    entries: Vec<(ObjectId, u32, u64)>,
}

impl IndexBuilder {
    pub fn new(kind: HashKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Record one object. Order does not matter; entries are sorted on
    /// finish.
    pub fn add(&mut self, id: ObjectId, crc32: u32, offset: u64) {
        debug_assert_eq!(id.kind(), self.kind, "mixed hash kinds in one index");
        self.entries.push((id, crc32, offset));
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort, validate, and publish the index.
    ///
    /// `pack_checksum` is the content checksum of the pack these entries
    /// describe, passed through to the encoded index unchanged.
    pub fn finish(mut self, pack_checksum: ObjectId) -> IdxResult<MemoryIndex> {
        if pack_checksum.kind() != self.kind {
            return Err(IdxError::Integrity(
                "pack checksum width does not match index hash kind".into(),
            ));
        }
        if self.entries.len() > u32::MAX as usize {
            return Err(IdxError::Integrity("object count exceeds u32 range".into()));
        }

        self.entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        for pair in self.entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(IdxError::Integrity(format!(
                    "duplicate object id {}",
                    pair[0].0
                )));
            }
        }

        let mut ids = Vec::with_capacity(self.entries.len());
        let mut crcs = Vec::with_capacity(self.entries.len());
        let mut offsets = Vec::with_capacity(self.entries.len());
        for (id, crc, offset) in &self.entries {
            ids.push(*id);
            crcs.push(*crc);
            offsets.push(*offset);
        }

        let fanout = FanoutTable::from_sorted_ids(&ids);
        Ok(MemoryIndex::from_parts(
            self.kind,
            fanout,
            ids,
            crcs,
            offsets,
            pack_checksum,
            ObjectId::null(self.kind),
        ))
    }
}
