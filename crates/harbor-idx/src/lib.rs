//! Pack object index for Harbor.
//!
//! A pack index maps object ids to byte offsets within a pack file,
//! enabling random access without scanning. This crate owns the binary
//! index format and its in-memory form:
//!
//! - **[`FanoutTable`]**: 256-entry cumulative counts for O(1) range
//!   narrowing before binary search
//! - **[`MemoryIndex`]**: the decoded, immutable, concurrently readable
//!   index
//! - **[`IndexBuilder`]**: accumulates entries during pack creation
//! - **[`Decoder`]** / **[`Encoder`]**: checksummed binary decode/encode;
//!   re-encoding a decoded index is byte-exact
//!
//! Offsets of 2 GiB and beyond do not fit the 4-byte primary slot; the
//! slot instead carries a high-bit sentinel indexing a trailing table of
//! 64-bit offsets.

pub mod builder;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fanout;
pub mod index;

pub use builder::IndexBuilder;
pub use decoder::{decode_bytes, Decoder};
pub use encoder::{encode_bytes, Encoder};
pub use error::{IdxError, IdxResult};
pub use fanout::FanoutTable;
pub use index::{Entries, IndexEntry, MemoryIndex};

/// Index file magic marker.
pub const IDX_MAGIC: [u8; 4] = *b"HIDX";

/// Current index format version. Version 1 predates the offset overflow
/// table and is no longer written; only version 2 is read.
pub const IDX_VERSION: u32 = 2;

/// High bit of a primary offset slot: the remaining bits index the
/// 64-bit overflow table instead of holding the offset itself.
pub const LARGE_OFFSET_FLAG: u32 = 0x8000_0000;
