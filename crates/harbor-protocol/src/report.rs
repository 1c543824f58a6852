//! Push report entities and their line codec.
//!
//! After a push, the receiving side reports one `unpack` line for the pack
//! itself and one line per requested reference update, in request order,
//! terminated by a flush frame:
//!
//! ```text
//! unpack ok
//! ok refs/heads/main
//! ng refs/heads/dev rejected: non-fast-forward
//! <flush>
//! ```

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use harbor_types::RefName;

use crate::error::{ProtocolError, ProtocolResult};
use crate::pktline::{self, Packet};

/// Literal status marker for a fully applied update.
pub const OK_MARKER: &str = "ok";

/// Outcome of one requested reference update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStatus {
    pub reference: RefName,
    pub status: String,
}

impl CommandStatus {
    /// A fully applied update.
    pub fn ok(reference: RefName) -> Self {
        Self {
            reference,
            status: OK_MARKER.to_string(),
        }
    }

    /// A rejected update and the peer-reported reason.
    pub fn rejected(reference: RefName, reason: impl Into<String>) -> Self {
        Self {
            reference,
            status: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OK_MARKER
    }
}

/// Why a push was not fully applied.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PushRejection {
    #[error("unpack error: {0}")]
    Unpack(String),

    #[error("command error on {reference}: {reason}")]
    Command { reference: RefName, reason: String },
}

/// The receiving side's summary of a push: the unpack outcome plus one
/// entry per requested reference update, in request order.
///
/// Populated once by the party applying the updates, encoded once, decoded
/// once by the peer; never mutated after decode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatus {
    pub unpack_status: String,
    pub command_statuses: Vec<CommandStatus>,
}

impl ReportStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// First failure in precedence order: an unpack failure wins over any
    /// per-reference failure, then the earliest rejected reference counts.
    ///
    /// Computed from the stored entries on every call, never cached.
    pub fn outcome(&self) -> Result<(), PushRejection> {
        if self.unpack_status != OK_MARKER {
            return Err(PushRejection::Unpack(self.unpack_status.clone()));
        }

        for cs in &self.command_statuses {
            if !cs.is_ok() {
                return Err(PushRejection::Command {
                    reference: cs.reference.clone(),
                    reason: cs.status.clone(),
                });
            }
        }

        Ok(())
    }

    /// Write the report: the unpack line, one line per command, flush.
    pub fn encode<W: Write>(&self, w: &mut W) -> ProtocolResult<()> {
        pktline::write_packet(w, format!("unpack {}\n", self.unpack_status).as_bytes())?;

        for cs in &self.command_statuses {
            let line = if cs.is_ok() {
                format!("ok {}\n", cs.reference)
            } else {
                format!("ng {} {}\n", cs.reference, cs.status)
            };
            pktline::write_packet(w, line.as_bytes())?;
        }

        pktline::write_flush(w)
    }

    /// Read one complete report.
    ///
    /// Reads no more input than the report itself. End-of-stream before
    /// the flush frame is a protocol violation even when the underlying
    /// read ended cleanly; only the flush frame terminates a report.
    pub fn decode<R: Read>(r: &mut R) -> ProtocolResult<Self> {
        let first = match pktline::read_packet(r)? {
            None => return Err(ProtocolError::UnexpectedEof),
            Some(Packet::Flush) => return Err(ProtocolError::Violation("premature flush")),
            Some(Packet::Data(line)) => line,
        };
        let unpack_status = parse_unpack_line(&first)?;

        let mut command_statuses = Vec::new();
        loop {
            match pktline::read_packet(r)? {
                None => return Err(ProtocolError::Violation("missing flush")),
                Some(Packet::Flush) => break,
                Some(Packet::Data(line)) => command_statuses.push(parse_command_line(&line)?),
            }
        }

        debug!(commands = command_statuses.len(), "decoded push report");
        Ok(Self {
            unpack_status,
            command_statuses,
        })
    }
}

fn parse_unpack_line(line: &[u8]) -> ProtocolResult<String> {
    let text = String::from_utf8_lossy(trim_newline(line));
    let mut fields = text.splitn(2, ' ');
    match (fields.next(), fields.next()) {
        (Some("unpack"), Some(status)) => Ok(status.to_string()),
        _ => Err(ProtocolError::MalformedLine(text.into_owned())),
    }
}

fn parse_command_line(line: &[u8]) -> ProtocolResult<CommandStatus> {
    let text = String::from_utf8_lossy(trim_newline(line));
    let fields: Vec<&str> = text.splitn(3, ' ').collect();
    match fields.as_slice() {
        ["ng", reference, reason] => Ok(CommandStatus::rejected(RefName::from(*reference), *reason)),
        ["ok", reference] => Ok(CommandStatus::ok(RefName::from(*reference))),
        _ => Err(ProtocolError::MalformedLine(text.into_owned())),
    }
}

fn trim_newline(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(lines: &[&str], flush: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        for line in lines {
            pktline::write_packet(&mut buf, line.as_bytes()).unwrap();
        }
        if flush {
            pktline::write_flush(&mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn decode_success_report() {
        let data = wire(&["unpack ok\n", "ok refs/heads/main\n"], true);
        let report = ReportStatus::decode(&mut data.as_slice()).unwrap();

        assert_eq!(report.unpack_status, "ok");
        assert_eq!(
            report.command_statuses,
            vec![CommandStatus::ok(RefName::from("refs/heads/main"))]
        );
        assert_eq!(report.outcome(), Ok(()));
    }

    #[test]
    fn unpack_failure_wins() {
        let data = wire(&["unpack error: 1 packed object(s)\n"], true);
        let report = ReportStatus::decode(&mut data.as_slice()).unwrap();

        assert_eq!(
            report.outcome(),
            Err(PushRejection::Unpack("error: 1 packed object(s)".into()))
        );
    }

    #[test]
    fn unpack_failure_wins_over_command_failures() {
        let report = ReportStatus {
            unpack_status: "index-pack abnormal exit".into(),
            command_statuses: vec![CommandStatus::rejected(
                RefName::from("refs/heads/dev"),
                "non-fast-forward",
            )],
        };
        assert!(matches!(report.outcome(), Err(PushRejection::Unpack(_))));
    }

    #[test]
    fn first_command_failure_is_reported() {
        let data = wire(
            &[
                "unpack ok\n",
                "ok refs/heads/main\n",
                "ng refs/heads/dev rejected\n",
                "ng refs/heads/other also rejected\n",
            ],
            true,
        );
        let report = ReportStatus::decode(&mut data.as_slice()).unwrap();

        assert_eq!(report.command_statuses.len(), 3);
        assert_eq!(
            report.command_statuses[1],
            CommandStatus::rejected(RefName::from("refs/heads/dev"), "rejected")
        );
        assert_eq!(
            report.outcome(),
            Err(PushRejection::Command {
                reference: RefName::from("refs/heads/dev"),
                reason: "rejected".into(),
            })
        );
    }

    #[test]
    fn missing_flush_is_a_violation() {
        let data = wire(&["unpack ok\n", "ok refs/heads/main\n"], false);
        let err = ReportStatus::decode(&mut data.as_slice()).unwrap_err();
        assert!(matches!(err, ProtocolError::Violation("missing flush")));
    }

    #[test]
    fn premature_flush_is_a_violation() {
        let data = wire(&[], true);
        let err = ReportStatus::decode(&mut data.as_slice()).unwrap_err();
        assert!(matches!(err, ProtocolError::Violation("premature flush")));
    }

    #[test]
    fn empty_stream_is_unexpected_eof() {
        let mut r: &[u8] = &[];
        let err = ReportStatus::decode(&mut r).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedEof));
    }

    #[test]
    fn ng_without_reason_is_malformed() {
        let data = wire(&["unpack ok\n", "ng refs/heads/dev\n"], true);
        let err = ReportStatus::decode(&mut data.as_slice()).unwrap_err();
        match err {
            ProtocolError::MalformedLine(line) => assert_eq!(line, "ng refs/heads/dev"),
            other => panic!("expected malformed line, got {other:?}"),
        }
    }

    #[test]
    fn ok_with_extra_field_is_malformed() {
        let data = wire(&["unpack ok\n", "ok refs/heads/main trailing\n"], true);
        let err = ReportStatus::decode(&mut data.as_slice()).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedLine(_)));
    }

    #[test]
    fn bad_first_line_is_malformed() {
        let data = wire(&["ok refs/heads/main\n"], true);
        let err = ReportStatus::decode(&mut data.as_slice()).unwrap_err();
        match err {
            ProtocolError::MalformedLine(line) => assert_eq!(line, "ok refs/heads/main"),
            other => panic!("expected malformed line, got {other:?}"),
        }
    }

    #[test]
    fn ng_reason_may_contain_spaces() {
        let data = wire(
            &["unpack ok\n", "ng refs/heads/dev rejected: non-fast-forward\n"],
            true,
        );
        let report = ReportStatus::decode(&mut data.as_slice()).unwrap();
        assert_eq!(
            report.command_statuses[0].status,
            "rejected: non-fast-forward"
        );
    }

    #[test]
    fn encode_produces_exact_wire_bytes() {
        let report = ReportStatus {
            unpack_status: "ok".into(),
            command_statuses: vec![
                CommandStatus::ok(RefName::from("refs/heads/main")),
                CommandStatus::rejected(RefName::from("refs/heads/dev"), "non-fast-forward"),
            ],
        };

        let mut buf = Vec::new();
        report.encode(&mut buf).unwrap();
        let expected = b"000eunpack ok\n\
              0017ok refs/heads/main\n\
              0027ng refs/heads/dev non-fast-forward\n\
              0000";
        assert_eq!(buf, expected.to_vec());
    }

    #[test]
    fn encode_decode_roundtrip() {
        let report = ReportStatus {
            unpack_status: "ok".into(),
            command_statuses: vec![
                CommandStatus::ok(RefName::from("refs/heads/main")),
                CommandStatus::ok(RefName::from("refs/tags/v1.0")),
                CommandStatus::rejected(RefName::from("refs/heads/dev"), "hook declined"),
            ],
        };

        let mut buf = Vec::new();
        report.encode(&mut buf).unwrap();
        let decoded = ReportStatus::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, report);
    }

    #[test]
    fn decode_reads_no_more_than_the_report() {
        let mut data = wire(&["unpack ok\n"], true);
        data.extend_from_slice(b"trailing bytes for the next decoder");

        let mut r = data.as_slice();
        let report = ReportStatus::decode(&mut r).unwrap();
        assert_eq!(report.unpack_status, "ok");
        assert_eq!(r, b"trailing bytes for the next decoder");
    }

    #[test]
    fn empty_unpack_status_is_carried() {
        // "unpack " splits into two fields, the second empty; the original
        // accepts it and the outcome query treats it as a failure.
        let data = wire(&["unpack \n"], true);
        let report = ReportStatus::decode(&mut data.as_slice()).unwrap();
        assert_eq!(report.unpack_status, "");
        assert!(report.outcome().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let report = ReportStatus {
            unpack_status: "ok".into(),
            command_statuses: vec![CommandStatus::ok(RefName::from("refs/heads/main"))],
        };
        let json = serde_json::to_string(&report).unwrap();
        let parsed: ReportStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(report, parsed);
    }
}
