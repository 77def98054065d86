//! Snapshot dump decoding
//!
//! Turns the text dump produced by the ZooKeeper snapshot formatter into a
//! [`SnapshotDatabase`]. The layout is:
//!
//! ```text
//! WARNING: ...                         (optional, any number)
//! Last processed zxid: 0x1f
//! ZNode Details (count=3):
//! ----
//! /a
//!   cZxid = 0x00000000000002
//!   ctime = Thu Jan 01 08:00:00 CST 1970
//!   mZxid = 0x00000000000002
//!   mtime = Thu Jan 01 08:00:00 CST 1970
//!   pZxid = 0x00000000000003
//!   cversion = 1
//!   dataVersion = 0
//!   aclVersion = 0
//!   ephemeralOwner = 0x00000000000000
//!   dataLength = 5
//!   data = aGVsbG8=
//! ----
//! Session Details (sid, timeout, ephemeralCount):
//! 0x100000abc, 30000, 2
//! ```
//!
//! Any malformed input fails the whole decode; a partially decoded
//! database is never returned.

use std::io::{self, BufRead};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use thiserror::Error;
use tracing::debug;

use crate::models::{Header, NodeRecord, SessionRecord, SnapshotDatabase};

/// Lines in one znode record
pub const NODE_RECORD_LINES: usize = 12;

const WARNING_PREFIX: &str = "WARNING";
const COUNT_PREFIX: &str = "ZNode Details (count=";
const COUNT_SUFFIX: &str = "):";
const SEPARATOR: &str = "----";
const SESSION_SECTION: &str = "Session Details";
const EMPTY_DATA: &str = "''";

/// Java `Date.toString()` layout without the zone token
const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Field names of record lines 2 to 12, in order
mod fields {
    pub const CZXID: &str = "cZxid";
    pub const CTIME: &str = "ctime";
    pub const MZXID: &str = "mZxid";
    pub const MTIME: &str = "mtime";
    pub const PZXID: &str = "pZxid";
    pub const CVERSION: &str = "cversion";
    pub const DATA_VERSION: &str = "dataVersion";
    pub const ACL_VERSION: &str = "aclVersion";
    pub const EPHEMERAL_OWNER: &str = "ephemeralOwner";
    pub const DATA_LENGTH: &str = "dataLength";
    pub const DATA: &str = "data";
}

/// Errors that can occur while decoding a dump
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read dump at line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("Dump is empty: no header line found")]
    MissingHeader,

    #[error("Invalid header at line {line}: '{text}'")]
    InvalidHeader { line: usize, text: String },

    #[error("Missing znode count line after the header")]
    MissingCount,

    #[error("Invalid znode count at line {line}: '{text}'")]
    InvalidCount { line: usize, text: String },

    #[error("Znode record '{path}' starting at line {line} is truncated")]
    TruncatedRecord { path: String, line: usize },

    #[error("Invalid znode path at line {line}: '{path}'")]
    InvalidPath { path: String, line: usize },

    #[error("Znode record '{path}', line {line}: expected field '{expected}', found '{found}'")]
    UnexpectedField {
        path: String,
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Znode record '{path}', line {line}: invalid {field} '{value}': {reason}")]
    InvalidValue {
        path: String,
        line: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Znode record '{path}': invalid base64 data: {source}")]
    InvalidData {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Znode record '{path}': data is {actual} bytes but dataLength is {declared}")]
    DataLengthMismatch {
        path: String,
        declared: i32,
        actual: usize,
    },

    #[error("Invalid session at line {line}: '{text}': {reason}")]
    InvalidSession {
        line: usize,
        text: String,
        reason: String,
    },

    #[error("Corrupted dump: duplicate znode path '{path}'")]
    DuplicatePath { path: String },

    #[error("Corrupted dump: znode count ({declared}) does not match actual ({actual}) plus the root")]
    CountMismatch { declared: u64, actual: usize },
}

/// Result type for decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Decoder for snapshot dumps
#[derive(Debug, Clone, Copy)]
pub struct SnapshotDecoder {
    /// Offset applied to timestamps whose zone abbreviation is not recognized
    zone_offset: FixedOffset,
}

impl Default for SnapshotDecoder {
    fn default() -> Self {
        Self {
            zone_offset: utc(),
        }
    }
}

impl SnapshotDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve unknown zone abbreviations (`CST`, `IST`, ...) to this offset
    pub fn with_zone_offset(mut self, offset: FixedOffset) -> Self {
        self.zone_offset = offset;
        self
    }

    /// Decode a dump held in memory
    pub fn decode_str(&self, dump: &str) -> DecodeResult<SnapshotDatabase> {
        self.decode(dump.lines().map(|l| Ok(l.to_string())))
    }

    /// Decode a dump from a buffered reader
    pub fn decode_reader<R: BufRead>(&self, reader: R) -> DecodeResult<SnapshotDatabase> {
        self.decode(reader.lines())
    }

    /// Decode a dump from a line source
    pub fn decode<I>(&self, lines: I) -> DecodeResult<SnapshotDatabase>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut reader = LineReader::new(lines.into_iter());

        let header_line = loop {
            match reader.next_line()? {
                None => return Err(DecodeError::MissingHeader),
                Some(l) if l.starts_with(WARNING_PREFIX) || l.trim().is_empty() => continue,
                Some(l) => break l,
            }
        };
        let header = parse_header(&header_line, reader.line_no())?;

        let count_line = reader.next_line()?.ok_or(DecodeError::MissingCount)?;
        let declared = parse_count(&count_line).ok_or_else(|| DecodeError::InvalidCount {
            line: reader.line_no(),
            text: count_line.clone(),
        })?;

        let mut nodes = Vec::new();
        let mut sessions = Vec::new();

        while let Some(line) = reader.next_line()? {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == SEPARATOR {
                continue;
            }

            if trimmed.starts_with(SESSION_SECTION) {
                while let Some(line) = reader.next_line()? {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || trimmed == SEPARATOR {
                        continue;
                    }
                    sessions.push(parse_session(trimmed, reader.line_no())?);
                }
                break;
            }

            let start = reader.line_no();
            let mut record = Vec::with_capacity(NODE_RECORD_LINES);
            record.push(line);
            while record.len() < NODE_RECORD_LINES {
                match reader.next_line()? {
                    Some(l) => record.push(l),
                    None => {
                        return Err(DecodeError::TruncatedRecord {
                            path: record[0].trim().to_string(),
                            line: start,
                        })
                    }
                }
            }
            nodes.push(self.parse_node(&record, start)?);
        }

        // The root znode is counted but never printed as a record
        if declared != nodes.len() as u64 + 1 {
            return Err(DecodeError::CountMismatch {
                declared,
                actual: nodes.len(),
            });
        }

        if let Some(path) = SnapshotDatabase::first_duplicate_path(&nodes) {
            return Err(DecodeError::DuplicatePath {
                path: path.to_string(),
            });
        }

        debug!(
            "Decoded dump: {} znodes, {} sessions",
            nodes.len(),
            sessions.len()
        );
        Ok(SnapshotDatabase::new(header, nodes, sessions))
    }

    /// Parse one 12-line znode record
    pub fn parse_node<S: AsRef<str>>(&self, lines: &[S], start: usize) -> DecodeResult<NodeRecord> {
        let path = lines
            .first()
            .map(|l| l.as_ref().trim().to_string())
            .unwrap_or_default();
        if lines.len() != NODE_RECORD_LINES {
            return Err(DecodeError::TruncatedRecord { path, line: start });
        }
        if !path.starts_with('/') {
            return Err(DecodeError::InvalidPath { path, line: start });
        }

        let mut reader = FieldReader {
            lines: &lines[1..],
            path: &path,
            start: start + 1,
            next: 0,
        };

        let czxid = reader.hex(fields::CZXID)?;
        let ctime = reader.timestamp(fields::CTIME, self.zone_offset)?;
        let mzxid = reader.hex(fields::MZXID)?;
        let mtime = reader.timestamp(fields::MTIME, self.zone_offset)?;
        let pzxid = reader.hex(fields::PZXID)?;
        let cversion = reader.decimal(fields::CVERSION)?;
        let data_version = reader.decimal(fields::DATA_VERSION)?;
        let acl_version = reader.decimal(fields::ACL_VERSION)?;
        let ephemeral_owner = reader.hex(fields::EPHEMERAL_OWNER)?;
        let data_length = reader.decimal(fields::DATA_LENGTH)?;
        let encoded = reader.value(fields::DATA)?;

        let data = if encoded.is_empty() || encoded == EMPTY_DATA {
            Vec::new()
        } else {
            STANDARD
                .decode(encoded)
                .map_err(|source| DecodeError::InvalidData {
                    path: path.clone(),
                    source,
                })?
        };

        if usize::try_from(data_length).ok() != Some(data.len()) {
            return Err(DecodeError::DataLengthMismatch {
                path,
                declared: data_length,
                actual: data.len(),
            });
        }

        Ok(NodeRecord {
            path,
            czxid,
            ctime,
            mzxid,
            mtime,
            pzxid,
            cversion,
            data_version,
            acl_version,
            ephemeral_owner,
            data,
        })
    }
}

/// Decode a dump with default options
pub fn decode<R: BufRead>(reader: R) -> DecodeResult<SnapshotDatabase> {
    SnapshotDecoder::new().decode_reader(reader)
}

/// Line source that keeps track of the current line number
struct LineReader<I> {
    lines: I,
    line_no: usize,
}

impl<I> LineReader<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    fn new(lines: I) -> Self {
        Self { lines, line_no: 0 }
    }

    fn next_line(&mut self) -> DecodeResult<Option<String>> {
        match self.lines.next() {
            None => Ok(None),
            Some(Ok(line)) => {
                self.line_no += 1;
                Ok(Some(line))
            }
            Some(Err(source)) => Err(DecodeError::Io {
                line: self.line_no + 1,
                source,
            }),
        }
    }

    /// Number of the line returned last (1-based)
    fn line_no(&self) -> usize {
        self.line_no
    }
}

/// Sequential reader over the `name = value` lines of a record
struct FieldReader<'a, S> {
    lines: &'a [S],
    path: &'a str,
    start: usize,
    next: usize,
}

impl<'a, S: AsRef<str>> FieldReader<'a, S> {
    fn value(&mut self, expected: &'static str) -> DecodeResult<&'a str> {
        let lines = self.lines;
        let line_no = self.start + self.next;
        let line = lines[self.next].as_ref();
        self.next += 1;

        match line.split_once('=') {
            Some((key, value)) if key.trim() == expected => Ok(value.trim()),
            _ => Err(DecodeError::UnexpectedField {
                path: self.path.to_string(),
                line: line_no,
                expected,
                found: line.trim().to_string(),
            }),
        }
    }

    fn hex(&mut self, field: &'static str) -> DecodeResult<u64> {
        let value = self.value(field)?;
        parse_hex(value).map_err(|reason| self.invalid(field, value, reason))
    }

    fn decimal(&mut self, field: &'static str) -> DecodeResult<i32> {
        let value = self.value(field)?;
        value
            .parse::<i32>()
            .map_err(|e| self.invalid(field, value, e.to_string()))
    }

    fn timestamp(
        &mut self,
        field: &'static str,
        zone_offset: FixedOffset,
    ) -> DecodeResult<DateTime<FixedOffset>> {
        let value = self.value(field)?;
        parse_timestamp(value, zone_offset).map_err(|reason| self.invalid(field, value, reason))
    }

    fn invalid(&self, field: &'static str, value: &str, reason: String) -> DecodeError {
        DecodeError::InvalidValue {
            path: self.path.to_string(),
            line: self.start + self.next - 1,
            field,
            value: value.to_string(),
            reason,
        }
    }
}

fn parse_header(line: &str, line_no: usize) -> DecodeResult<Header> {
    let invalid = || DecodeError::InvalidHeader {
        line: line_no,
        text: line.to_string(),
    };
    let (_, value) = line.split_once(':').ok_or_else(invalid)?;
    let last_processed_zxid = parse_hex(value.trim()).map_err(|_| invalid())?;
    Ok(Header {
        last_processed_zxid,
    })
}

fn parse_count(line: &str) -> Option<u64> {
    let start = line.find(COUNT_PREFIX)? + COUNT_PREFIX.len();
    let rest = &line[start..];
    let end = rest.find(COUNT_SUFFIX)?;
    rest[..end].parse().ok()
}

fn parse_session(line: &str, line_no: usize) -> DecodeResult<SessionRecord> {
    let invalid = |reason: String| DecodeError::InvalidSession {
        line: line_no,
        text: line.to_string(),
        reason,
    };

    let parts: Vec<&str> = line
        .split(|c| c == ',' || c == ' ')
        .filter(|s| !s.is_empty())
        .collect();
    let [id, timeout, ephemeral_count] = parts[..] else {
        return Err(invalid(format!("expected 3 fields, found {}", parts.len())));
    };

    let session_id = parse_hex(id).map_err(|e| invalid(format!("session id: {}", e)))?;
    let timeout_ms: u64 = timeout
        .parse()
        .map_err(|e| invalid(format!("timeout: {}", e)))?;
    let ephemeral_count: i32 = ephemeral_count
        .parse()
        .map_err(|e| invalid(format!("ephemeral count: {}", e)))?;

    Ok(SessionRecord {
        session_id,
        timeout: Duration::from_millis(timeout_ms),
        ephemeral_count,
    })
}

fn parse_hex(value: &str) -> Result<u64, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).map_err(|e| e.to_string())
}

fn parse_timestamp(value: &str, zone_offset: FixedOffset) -> Result<DateTime<FixedOffset>, String> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let [weekday, month, day, time, zone, year] = tokens[..] else {
        return Err("expected 'EEE MMM dd HH:mm:ss zzz yyyy'".to_string());
    };

    let naive = NaiveDateTime::parse_from_str(
        &format!("{} {} {} {} {}", weekday, month, day, time, year),
        TIMESTAMP_FORMAT,
    )
    .map_err(|e| e.to_string())?;

    let offset = parse_zone(zone).unwrap_or(zone_offset);
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| "time does not exist in zone".to_string())
}

/// Resolve a zone token to an offset, `None` for unknown abbreviations
fn parse_zone(zone: &str) -> Option<FixedOffset> {
    if matches!(zone, "UTC" | "GMT" | "UT" | "Z") {
        return Some(utc());
    }

    let numeric = zone
        .strip_prefix("GMT")
        .or_else(|| zone.strip_prefix("UTC"))
        .unwrap_or(zone);
    parse_offset(numeric)
}

/// Parse `+08:00`, `+0800` or `+08` into an offset
pub fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|&c| c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn utc() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const EPOCH_CST: &str = "Thu Jan 01 08:00:00 CST 1970";

    pub(crate) fn record(path: &str, data: &str, data_length: usize) -> String {
        format!(
            "{path}
  cZxid = 0x00000000000002
  ctime = {EPOCH_CST}
  mZxid = 0x00000000000003
  mtime = {EPOCH_CST}
  pZxid = 0x00011a00039bab
  cversion = 8
  dataVersion = 1
  aclVersion = 125
  ephemeralOwner = 0x00000000000000
  dataLength = {data_length}
  data = {data}
"
        )
    }

    pub(crate) fn dump(count: usize, records: &[String]) -> String {
        let mut out = String::from("Last processed zxid: 0x0\n");
        out.push_str(&format!("ZNode Details (count={}):\n", count));
        for r in records {
            out.push_str("----\n");
            out.push_str(r);
        }
        out.push_str("----\n");
        out
    }

    fn cst_decoder() -> SnapshotDecoder {
        SnapshotDecoder::new().with_zone_offset(parse_offset("+08:00").unwrap())
    }

    #[test]
    fn test_parse_node_record() {
        let text = record("/", "", 0);
        let lines: Vec<&str> = text.lines().collect();

        let node = cst_decoder().parse_node(&lines, 1).unwrap();
        assert_eq!(node.path(), "/");
        assert_eq!(node.czxid(), 2);
        assert_eq!(node.ctime().timestamp(), 0);
        assert_eq!(node.mzxid(), 3);
        assert_eq!(node.mtime().timestamp(), 0);
        assert_eq!(node.pzxid(), 0x00011a00039bab);
        assert_eq!(node.cversion(), 8);
        assert_eq!(node.data_version(), 1);
        assert_eq!(node.acl_version(), 125);
        assert_eq!(node.ephemeral_owner(), 0);
        assert!(node.data().is_empty());
    }

    #[test]
    fn test_quoted_empty_data() {
        let text = record("/a", "''", 0);
        let lines: Vec<&str> = text.lines().collect();

        let node = SnapshotDecoder::new().parse_node(&lines, 1).unwrap();
        assert!(node.data().is_empty());
    }

    #[test]
    fn test_base64_data() {
        let text = record("/a", "aGVsbG8=", 5);
        let lines: Vec<&str> = text.lines().collect();

        let node = SnapshotDecoder::new().parse_node(&lines, 1).unwrap();
        assert_eq!(node.data(), b"hello");
    }

    #[test]
    fn test_data_length_mismatch() {
        let text = record("/a", "aGVsbG8=", 4);
        let lines: Vec<&str> = text.lines().collect();

        let err = SnapshotDecoder::new().parse_node(&lines, 1).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::DataLengthMismatch {
                declared: 4,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_data_with_nonzero_length() {
        let text = record("/a", "", 3);
        let lines: Vec<&str> = text.lines().collect();

        let err = SnapshotDecoder::new().parse_node(&lines, 1).unwrap_err();
        assert!(matches!(err, DecodeError::DataLengthMismatch { .. }));
    }

    #[test]
    fn test_invalid_base64() {
        let text = record("/a", "not*base64", 3);
        let lines: Vec<&str> = text.lines().collect();

        let err = SnapshotDecoder::new().parse_node(&lines, 1).unwrap_err();
        match err {
            DecodeError::InvalidData { path, .. } => assert_eq!(path, "/a"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_hex_names_record_and_line() {
        let text = record("/bad", "", 0).replace("cZxid = 0x00000000000002", "cZxid = 0xZZ");
        let lines: Vec<&str> = text.lines().collect();

        let err = SnapshotDecoder::new().parse_node(&lines, 10).unwrap_err();
        match err {
            DecodeError::InvalidValue {
                path, line, field, ..
            } => {
                assert_eq!(path, "/bad");
                assert_eq!(line, 11);
                assert_eq!(field, "cZxid");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_timestamp() {
        let text = record("/a", "", 0).replacen(EPOCH_CST, "yesterday", 1);
        let lines: Vec<&str> = text.lines().collect();

        let err = SnapshotDecoder::new().parse_node(&lines, 1).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { field: "ctime", .. }));
    }

    #[test]
    fn test_unexpected_field_name() {
        let text = record("/a", "", 0).replace("aclVersion", "aclVersoin");
        let lines: Vec<&str> = text.lines().collect();

        let err = SnapshotDecoder::new().parse_node(&lines, 1).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedField {
                expected: "aclVersion",
                ..
            }
        ));
    }

    #[test]
    fn test_timestamp_zones() {
        let offset = parse_offset("+08:00").unwrap();
        let t = parse_timestamp("Thu Jan 01 00:00:00 UTC 1970", offset).unwrap();
        assert_eq!(t.timestamp(), 0);

        let t = parse_timestamp("Thu Jan 01 08:00:00 +0800 1970", utc()).unwrap();
        assert_eq!(t.timestamp(), 0);

        let t = parse_timestamp("Thu Jan 01 08:00:00 CST 1970", offset).unwrap();
        assert_eq!(t.timestamp(), 0);

        let t = parse_timestamp("Thu Jan 01 08:00:00 CST 1970", utc()).unwrap();
        assert_eq!(t.timestamp(), 8 * 3600);
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+08:00").unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(parse_offset("-0530").unwrap().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(parse_offset("+02").unwrap().local_minus_utc(), 2 * 3600);
        assert!(parse_offset("CST").is_none());
        assert!(parse_offset("+0861").is_none());
    }

    #[test]
    fn test_parse_session() {
        let session = parse_session("0x100000abc, 30000, 2", 1).unwrap();
        assert_eq!(session.session_id(), 0x100000abc);
        assert_eq!(session.timeout(), Duration::from_millis(30000));
        assert_eq!(session.ephemeral_count(), 2);
    }

    #[test]
    fn test_session_arity() {
        let err = parse_session("0x1, 30000", 7).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidSession { line: 7, .. }));

        let err = parse_session("0x1, 30000, 0, 9", 7).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidSession { .. }));
    }

    #[test]
    fn test_decode_full_dump() {
        let mut text = String::from("WARNING: snapshot may be inconsistent\n");
        text.push_str(&dump(
            3,
            &[record("/a", "aGVsbG8=", 5), record("/a/b", "", 0)],
        ));
        text.push_str("Session Details (sid, timeout, ephemeralCount):\n");
        text.push_str("0x100000abc, 30000, 2\n");
        text.push_str("0x100000abd, 4000, 0\n");

        let db = SnapshotDecoder::new().decode_str(&text).unwrap();
        assert_eq!(db.header().last_processed_zxid, 0);
        assert_eq!(db.nodes().len(), 2);
        assert_eq!(db.nodes()[0].path(), "/a");
        assert_eq!(db.nodes()[1].path(), "/a/b");
        assert_eq!(db.sessions().len(), 2);
        assert_eq!(db.sessions()[1].timeout(), Duration::from_millis(4000));
    }

    #[test]
    fn test_root_is_implicit_in_count() {
        let records = [record("/a", "", 0), record("/b", "", 0)];
        assert!(SnapshotDecoder::new().decode_str(&dump(3, &records)).is_ok());

        let err = SnapshotDecoder::new()
            .decode_str(&dump(3, &records[..1]))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::CountMismatch {
                declared: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_zero_count_is_corrupt() {
        let err = SnapshotDecoder::new().decode_str(&dump(0, &[])).unwrap_err();
        assert!(matches!(err, DecodeError::CountMismatch { .. }));
    }

    #[test]
    fn test_invalid_count_line() {
        let text = "Last processed zxid: 0x10\nZNode Details:\n";
        let err = SnapshotDecoder::new().decode_str(text).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidCount { line: 2, .. }));
    }

    #[test]
    fn test_invalid_header() {
        let err = SnapshotDecoder::new()
            .decode_str("no delimiter here\n")
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHeader { line: 1, .. }));

        let err = SnapshotDecoder::new().decode_str("").unwrap_err();
        assert!(matches!(err, DecodeError::MissingHeader));
    }

    #[test]
    fn test_truncated_record() {
        let mut text = dump(2, &[]);
        let full = record("/a", "", 0);
        for line in full.lines().take(5) {
            text.push_str(line);
            text.push('\n');
        }

        let err = SnapshotDecoder::new().decode_str(&text).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedRecord { .. }));
    }

    #[test]
    fn test_duplicate_path() {
        let records = [record("/a", "", 0), record("/a", "", 0)];
        let err = SnapshotDecoder::new()
            .decode_str(&dump(3, &records))
            .unwrap_err();
        assert!(matches!(err, DecodeError::DuplicatePath { .. }));
    }

    #[test]
    fn test_bad_session_fails_whole_decode() {
        let mut text = dump(2, &[record("/a", "", 0)]);
        text.push_str("Session Details (sid, timeout, ephemeralCount):\n");
        text.push_str("0x1 30000\n");

        let err = SnapshotDecoder::new().decode_str(&text).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidSession { .. }));
    }

    #[test]
    fn test_io_error_is_reported() {
        let lines = vec![
            Ok("Last processed zxid: 0x1".to_string()),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "boom")),
        ];
        let err = SnapshotDecoder::new().decode(lines).unwrap_err();
        assert!(matches!(err, DecodeError::Io { line: 2, .. }));
    }
}
