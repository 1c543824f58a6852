use std::sync::OnceLock;

use harbor_types::{HashKind, ObjectId};

use crate::fanout::FanoutTable;

/// One indexed object: its id, the CRC32 of its stored representation,
/// and its byte offset within the pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: ObjectId,
    pub crc32: u32,
    pub offset: u64,
}

/// Decoded, queryable pack index.
///
/// Holds three parallel sequences aligned by position: object ids sorted
/// ascending and unique, the CRC32 of each object's stored representation,
/// and each object's byte offset within the pack. Constructed once by the
/// decoder or an [`IndexBuilder`](crate::IndexBuilder), immutable
/// afterwards; lookups need no locking from any number of threads.
#[derive(Clone, Debug)]
pub struct MemoryIndex {
    kind: HashKind,
    fanout: FanoutTable,
    ids: Vec<ObjectId>,
    crcs: Vec<u32>,
    offsets: Vec<u64>,
    pack_checksum: ObjectId,
    index_checksum: ObjectId,
    by_offset: OnceLock<Vec<u32>>,
}

impl MemoryIndex {
    pub(crate) fn from_parts(
        kind: HashKind,
        fanout: FanoutTable,
        ids: Vec<ObjectId>,
        crcs: Vec<u32>,
        offsets: Vec<u64>,
        pack_checksum: ObjectId,
        index_checksum: ObjectId,
    ) -> Self {
        debug_assert_eq!(ids.len(), crcs.len());
        debug_assert_eq!(ids.len(), offsets.len());
        debug_assert_eq!(fanout.total() as usize, ids.len());
        Self {
            kind,
            fanout,
            ids,
            crcs,
            offsets,
            pack_checksum,
            index_checksum,
            by_offset: OnceLock::new(),
        }
    }

    /// The hash algorithm this index was built for.
    pub fn kind(&self) -> HashKind {
        self.kind
    }

    /// Total indexed objects.
    pub fn count(&self) -> u32 {
        self.ids.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The fanout table over the sorted id list.
    pub fn fanout(&self) -> &FanoutTable {
        &self.fanout
    }

    /// Checksum of the pack this index describes.
    pub fn pack_checksum(&self) -> &ObjectId {
        &self.pack_checksum
    }

    /// The index's own trailing checksum.
    ///
    /// Null for freshly built indexes that have not been encoded yet;
    /// decoded indexes always carry the verified value they were read with.
    pub fn index_checksum(&self) -> &ObjectId {
        &self.index_checksum
    }

    /// Byte offset of `id` within the pack, if indexed.
    pub fn lookup_offset(&self, id: &ObjectId) -> Option<u64> {
        self.position(id).map(|pos| self.offsets[pos])
    }

    /// Offset and stored-representation CRC32 of `id`, if indexed.
    pub fn lookup(&self, id: &ObjectId) -> Option<(u64, u32)> {
        self.position(id).map(|pos| (self.offsets[pos], self.crcs[pos]))
    }

    /// Check if an object is indexed.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.position(id).is_some()
    }

    /// Reverse lookup: the id stored at `offset`, if any.
    ///
    /// Used when presenting deltas against an already-stored base. The
    /// offset-sorted view is built on first use and shared by all readers.
    pub fn lookup_hash(&self, offset: u64) -> Option<ObjectId> {
        let order = self.offset_order();
        let pos = order
            .binary_search_by_key(&offset, |&p| self.offsets[p as usize])
            .ok()?;
        Some(self.ids[order[pos] as usize])
    }

    /// Iterate entries in ascending id order.
    ///
    /// Finite and restartable; this is the canonical order for re-encoding.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            index: self,
            pos: 0,
        }
    }

    pub(crate) fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    fn position(&self, id: &ObjectId) -> Option<usize> {
        let range = self.fanout.range_for(id.first_byte());
        let slice = &self.ids[range.clone()];
        let pos = slice
            .binary_search_by(|probe| probe.as_bytes().cmp(id.as_bytes()))
            .ok()?;
        Some(range.start + pos)
    }

    fn offset_order(&self) -> &[u32] {
        self.by_offset.get_or_init(|| {
            let mut order: Vec<u32> = (0..self.count()).collect();
            order.sort_unstable_by_key(|&pos| self.offsets[pos as usize]);
            order
        })
    }
}

/// Iterator over index entries in ascending id order.
#[derive(Clone, Debug)]
pub struct Entries<'a> {
    index: &'a MemoryIndex,
    pos: u32,
}

impl Iterator for Entries<'_> {
    type Item = IndexEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.index.count() {
            return None;
        }
        let pos = self.pos as usize;
        self.pos += 1;
        Some(IndexEntry {
            id: self.index.ids[pos],
            crc32: self.index.crcs[pos],
            offset: self.index.offsets[pos],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.index.count() - self.pos) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}
