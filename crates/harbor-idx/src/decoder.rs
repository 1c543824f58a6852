use std::io::{self, Read};

use harbor_types::{Checksum, HashKind, ObjectId};
use tracing::debug;

use crate::error::{IdxError, IdxResult};
use crate::fanout::FanoutTable;
use crate::index::MemoryIndex;
use crate::{IDX_MAGIC, IDX_VERSION, LARGE_OFFSET_FLAG};

/// Pre-reservation clamp: a corrupt object count must not force a giant
/// allocation before the short read surfaces.
const RESERVE_CLAMP: u32 = 1 << 16;

/// Streaming decoder for pack index bytes.
///
/// Makes a single forward pass over the reader, hashing every byte on the
/// way through so the trailing index checksum can be verified without
/// seeking back. Any failure is terminal; nothing partially decoded is
/// ever returned.
pub struct Decoder<R> {
    inner: HashingReader<R>,
    kind: HashKind,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R, kind: HashKind) -> Self {
        Self {
            inner: HashingReader::new(reader, kind),
            kind,
        }
    }

    /// Decode one complete index.
    pub fn decode(mut self) -> IdxResult<MemoryIndex> {
        self.read_header()?;
        let fanout = self.read_fanout()?;
        let count = fanout.total();

        let ids = self.read_ids(count)?;
        let derived = FanoutTable::from_sorted_ids(&ids);
        if derived != fanout {
            return Err(IdxError::Integrity(
                "fanout table does not match id distribution".into(),
            ));
        }

        let crcs = self.read_crcs(count)?;
        let offsets = self.read_offsets(count)?;

        let pack_checksum = self.read_checksum()?;
        let computed = self.inner.snapshot();
        let stored = self.read_checksum()?;
        if computed != stored {
            return Err(IdxError::Integrity("index checksum mismatch".into()));
        }

        debug!(objects = count, "decoded pack index");
        Ok(MemoryIndex::from_parts(
            self.kind,
            fanout,
            ids,
            crcs,
            offsets,
            pack_checksum,
            stored,
        ))
    }

    fn read_header(&mut self) -> IdxResult<()> {
        let mut magic = [0u8; 4];
        self.inner.read_exact(&mut magic)?;
        if magic != IDX_MAGIC {
            return Err(IdxError::InvalidMagic {
                expected: IDX_MAGIC,
                actual: magic,
            });
        }

        let version = self.inner.read_u32()?;
        if version != IDX_VERSION {
            return Err(IdxError::UnsupportedVersion(version));
        }
        Ok(())
    }

    fn read_fanout(&mut self) -> IdxResult<FanoutTable> {
        let mut counts = [0u32; 256];
        for slot in &mut counts {
            *slot = self.inner.read_u32()?;
        }
        FanoutTable::from_counts(counts)
    }

    fn read_ids(&mut self, count: u32) -> IdxResult<Vec<ObjectId>> {
        let width = self.kind.width();
        let mut ids = Vec::with_capacity(count.min(RESERVE_CLAMP) as usize);
        let mut buf = [0u8; 32];
        for _ in 0..count {
            self.inner.read_exact(&mut buf[..width])?;
            let id = ObjectId::from_hash(self.kind, &buf[..width])
                .map_err(|e| IdxError::Integrity(e.to_string()))?;
            if let Some(prev) = ids.last() {
                if *prev >= id {
                    return Err(IdxError::Integrity(
                        "object ids not strictly ascending".into(),
                    ));
                }
            }
            ids.push(id);
        }
        Ok(ids)
    }

    fn read_crcs(&mut self, count: u32) -> IdxResult<Vec<u32>> {
        let mut crcs = Vec::with_capacity(count.min(RESERVE_CLAMP) as usize);
        for _ in 0..count {
            crcs.push(self.inner.read_u32()?);
        }
        Ok(crcs)
    }

    /// Read the primary offset slots, then resolve high-bit sentinels
    /// against the 64-bit overflow table that follows them.
    fn read_offsets(&mut self, count: u32) -> IdxResult<Vec<u64>> {
        let mut offsets = Vec::with_capacity(count.min(RESERVE_CLAMP) as usize);
        let mut pending = Vec::new();
        for pos in 0..count {
            let raw = self.inner.read_u32()?;
            if raw & LARGE_OFFSET_FLAG != 0 {
                pending.push((pos as usize, raw & !LARGE_OFFSET_FLAG));
                offsets.push(0);
            } else {
                offsets.push(raw as u64);
            }
        }

        let mut overflow = Vec::with_capacity(pending.len().min(RESERVE_CLAMP as usize));
        for _ in 0..pending.len() {
            overflow.push(self.inner.read_u64()?);
        }
        for (pos, table_index) in pending {
            let resolved = overflow.get(table_index as usize).ok_or_else(|| {
                IdxError::Integrity(format!(
                    "large offset index {table_index} out of range ({} entries)",
                    overflow.len()
                ))
            })?;
            offsets[pos] = *resolved;
        }
        Ok(offsets)
    }

    fn read_checksum(&mut self) -> IdxResult<ObjectId> {
        let mut buf = [0u8; 32];
        let width = self.kind.width();
        self.inner.read_exact(&mut buf[..width])?;
        ObjectId::from_hash(self.kind, &buf[..width])
            .map_err(|e| IdxError::Integrity(e.to_string()))
    }
}

/// Convenience wrapper: decode an index held entirely in memory.
pub fn decode_bytes(data: &[u8], kind: HashKind) -> IdxResult<MemoryIndex> {
    Decoder::new(data, kind).decode()
}

/// Reader that folds every byte it yields into a running digest.
struct HashingReader<R> {
    inner: R,
    digest: Checksum,
}

impl<R: Read> HashingReader<R> {
    fn new(inner: R, kind: HashKind) -> Self {
        Self {
            inner,
            digest: Checksum::new(kind),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> IdxResult<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.digest.update(buf);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(IdxError::UnexpectedEof),
            Err(e) => Err(IdxError::Io(e)),
        }
    }

    fn read_u32(&mut self) -> IdxResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_u64(&mut self) -> IdxResult<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn snapshot(&self) -> ObjectId {
        self.digest.snapshot()
    }
}
