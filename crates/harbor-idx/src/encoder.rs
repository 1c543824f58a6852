use std::io::Write;

use harbor_types::{Checksum, HashKind, ObjectId};
use tracing::debug;

use crate::error::IdxResult;
use crate::fanout::FanoutTable;
use crate::index::MemoryIndex;
use crate::{IDX_MAGIC, IDX_VERSION, LARGE_OFFSET_FLAG};

/// Canonical serializer for a [`MemoryIndex`].
///
/// Emission order: magic, version, recomputed fanout, ids ascending, CRCs,
/// primary offsets with the overflow table appended, pack checksum passed
/// through unchanged, then the index checksum over everything written so
/// far. Re-encoding a decoded index reproduces the input bytes exactly.
pub struct Encoder<W> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialize the index, returning the number of bytes written.
    ///
    /// Sink failures surface unchanged; nothing is retried.
    pub fn encode(self, index: &MemoryIndex) -> IdxResult<usize> {
        let mut out = HashingWriter::new(self.writer, index.kind());

        out.write_all(&IDX_MAGIC)?;
        out.write_u32(IDX_VERSION)?;

        let fanout = FanoutTable::from_sorted_ids(index.ids());
        for &count in fanout.as_counts() {
            out.write_u32(count)?;
        }

        for entry in index.entries() {
            out.write_all(entry.id.as_bytes())?;
        }
        for entry in index.entries() {
            out.write_u32(entry.crc32)?;
        }

        let mut overflow: Vec<u64> = Vec::new();
        for entry in index.entries() {
            if entry.offset >= LARGE_OFFSET_FLAG as u64 {
                out.write_u32(LARGE_OFFSET_FLAG | overflow.len() as u32)?;
                overflow.push(entry.offset);
            } else {
                out.write_u32(entry.offset as u32)?;
            }
        }
        for offset in overflow {
            out.write_u64(offset)?;
        }

        out.write_all(index.pack_checksum().as_bytes())?;

        let checksum = out.snapshot();
        out.write_all(checksum.as_bytes())?;

        debug!(objects = index.count(), bytes = out.written, "encoded pack index");
        Ok(out.written)
    }
}

/// Convenience wrapper: serialize an index into a fresh buffer.
pub fn encode_bytes(index: &MemoryIndex) -> IdxResult<Vec<u8>> {
    let mut buf = Vec::new();
    Encoder::new(&mut buf).encode(index)?;
    Ok(buf)
}

/// Writer that folds every byte it passes through into a running digest.
struct HashingWriter<W> {
    inner: W,
    digest: Checksum,
    written: usize,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W, kind: HashKind) -> Self {
        Self {
            inner,
            digest: Checksum::new(kind),
            written: 0,
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> IdxResult<()> {
        self.inner.write_all(buf)?;
        self.digest.update(buf);
        self.written += buf.len();
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> IdxResult<()> {
        self.write_all(&value.to_be_bytes())
    }

    fn write_u64(&mut self, value: u64) -> IdxResult<()> {
        self.write_all(&value.to_be_bytes())
    }

    fn snapshot(&self) -> ObjectId {
        self.digest.snapshot()
    }
}
