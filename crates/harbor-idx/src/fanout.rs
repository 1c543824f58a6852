use std::ops::Range;

use harbor_types::ObjectId;

use crate::error::{IdxError, IdxResult};

/// Cumulative object counts over the 256 possible leading hash bytes.
///
/// `counts[b]` is the number of indexed hashes whose first byte is `<= b`,
/// so `counts[255]` is the total object count. The table is derived from
/// the sorted id list and never authoritative on its own: encoders
/// recompute it, decoders validate it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FanoutTable {
    counts: [u32; 256],
}

impl FanoutTable {
    /// Build the table from ids already sorted ascending.
    pub fn from_sorted_ids(ids: &[ObjectId]) -> Self {
        let mut buckets = [0u32; 256];
        for id in ids {
            buckets[id.first_byte() as usize] += 1;
        }

        let mut counts = [0u32; 256];
        let mut running = 0u32;
        for (slot, bucket) in counts.iter_mut().zip(buckets) {
            running += bucket;
            *slot = running;
        }
        Self { counts }
    }

    /// Wrap raw counts, verifying the non-decreasing invariant.
    pub fn from_counts(counts: [u32; 256]) -> IdxResult<Self> {
        let mut prev = 0u32;
        for &count in &counts {
            if count < prev {
                return Err(IdxError::Integrity("fanout table not monotonic".into()));
            }
            prev = count;
        }
        Ok(Self { counts })
    }

    /// Total number of indexed objects.
    pub fn total(&self) -> u32 {
        self.counts[255]
    }

    /// Half-open range of positions in the sorted id list whose entries
    /// share `first_byte`.
    pub fn range_for(&self, first_byte: u8) -> Range<usize> {
        let lo = if first_byte == 0 {
            0
        } else {
            self.counts[first_byte as usize - 1]
        };
        lo as usize..self.counts[first_byte as usize] as usize
    }

    /// The raw cumulative counts, in wire order.
    pub fn as_counts(&self) -> &[u32; 256] {
        &self.counts
    }
}
