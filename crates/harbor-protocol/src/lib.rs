//! Push report wire layer for Harbor.
//!
//! After a push transfers its pack, the receiving side reports what became
//! of it: whether the pack unpacked, and the fate of every requested
//! reference update. This crate owns that exchange:
//!
//! - **[`pktline`]**: length-prefixed line framing with a distinguished
//!   flush frame
//! - **[`ReportStatus`]** / **[`CommandStatus`]**: the report entities and
//!   their line codec
//! - **[`PushRejection`]**: the aggregated outcome of a report
//!
//! The codec is strict: end-of-stream never substitutes for the flush
//! frame, and the first malformed line aborts the whole decode.

pub mod error;
pub mod pktline;
pub mod report;

pub use error::{ProtocolError, ProtocolResult};
pub use pktline::{read_packet, write_flush, write_packet, Packet, MAX_PAYLOAD};
pub use report::{CommandStatus, PushRejection, ReportStatus, OK_MARKER};
