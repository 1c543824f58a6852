//! Length-prefixed line framing.
//!
//! Each frame opens with four lowercase hex digits giving the total frame
//! length including the digits themselves. The zero-length frame `0000`
//! (flush) carries no payload and terminates a logical message; lengths
//! one through three are reserved.
//!
//! Clean end-of-stream is reported as `Ok(None)`, distinct from a frame
//! cut short, so callers can decide whether an absent flush is an error.

use std::io::{self, Read, Write};

use crate::error::{ProtocolError, ProtocolResult};

/// Largest payload a single frame may carry.
pub const MAX_PAYLOAD: usize = 65516;

/// Frame length prefix width in bytes.
const PREFIX_LEN: usize = 4;

/// One received frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    /// A data frame and its payload.
    Data(Vec<u8>),
    /// The distinguished zero-length flush frame.
    Flush,
}

/// Write one data frame.
pub fn write_packet<W: Write>(w: &mut W, payload: &[u8]) -> ProtocolResult<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ProtocolError::PacketTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let prefix = format!("{:04x}", payload.len() + PREFIX_LEN);
    w.write_all(prefix.as_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// Write the flush frame.
pub fn write_flush<W: Write>(w: &mut W) -> ProtocolResult<()> {
    w.write_all(b"0000")?;
    Ok(())
}

/// Read one frame, or `None` at a clean end of stream.
pub fn read_packet<R: Read>(r: &mut R) -> ProtocolResult<Option<Packet>> {
    let mut prefix = [0u8; PREFIX_LEN];
    if !read_first_byte(r, &mut prefix[0])? {
        return Ok(None);
    }
    read_exact(r, &mut prefix[1..])?;

    let text = std::str::from_utf8(&prefix)
        .map_err(|_| ProtocolError::InvalidLength(format!("{prefix:?}")))?;
    let length = usize::from_str_radix(text, 16)
        .map_err(|_| ProtocolError::InvalidLength(text.to_string()))?;

    match length {
        0 => Ok(Some(Packet::Flush)),
        1..=3 => Err(ProtocolError::InvalidLength(text.to_string())),
        _ => {
            let payload_len = length - PREFIX_LEN;
            if payload_len > MAX_PAYLOAD {
                return Err(ProtocolError::PacketTooLarge {
                    size: payload_len,
                    max: MAX_PAYLOAD,
                });
            }
            let mut payload = vec![0u8; payload_len];
            read_exact(r, &mut payload)?;
            Ok(Some(Packet::Data(payload)))
        }
    }
}

/// Read a single byte, distinguishing clean end-of-stream (`false`) from
/// any other outcome.
fn read_first_byte<R: Read>(r: &mut R, byte: &mut u8) -> ProtocolResult<bool> {
    let mut buf = [0u8; 1];
    loop {
        match r.read(&mut buf) {
            Ok(0) => return Ok(false),
            Ok(_) => {
                *byte = buf[0];
                return Ok(true);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProtocolError::Io(e)),
        }
    }
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> ProtocolResult<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ProtocolError::UnexpectedEof,
        _ => ProtocolError::Io(e),
    })
}
