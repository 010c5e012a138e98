//! Wire formats spoken between client and server.
//!
//! The two directions use unrelated encodings:
//! - client → server: UTF-8 text `<identifier> <x> <y>`, no terminator, no length prefix
//! - server → client: exactly 8 bytes, two `f32` values `(x, y)` in host byte order

use crate::geometry::Vec2;
use bincode::Options;
use std::fmt;
use std::str::FromStr;

/// Size of one inbound position record on the wire
pub const REMOTE_RECORD_LEN: usize = 8;

/// Letter prefix for identifiers generated by clients
pub const CLIENT_ID_PREFIX: char = 'A';

/// A letter prefix followed by a decimal counter, e.g. `A1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClientId {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits_at = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| ParseRecordError::InvalidIdentifier(s.to_string()))?;
        let (prefix, counter) = s.split_at(digits_at);

        if prefix.is_empty() || counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseRecordError::InvalidIdentifier(s.to_string()));
        }

        Ok(ClientId(s.to_string()))
    }
}

/// Hands out identifiers with an incrementing counter starting at 1
#[derive(Debug)]
pub struct IdGenerator {
    prefix: char,
    counter: u32,
}

impl IdGenerator {
    pub fn new(prefix: char) -> Self {
        Self { prefix, counter: 0 }
    }

    pub fn next_id(&mut self) -> ClientId {
        self.counter += 1;
        ClientId(format!("{}{}", self.prefix, self.counter))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(CLIENT_ID_PREFIX)
    }
}

/// Error produced when a text position record cannot be decoded
#[derive(Debug, Clone, PartialEq)]
pub enum ParseRecordError {
    /// The record did not have exactly three whitespace-separated fields
    FieldCount(usize),
    InvalidIdentifier(String),
    InvalidCoordinate(String),
}

impl fmt::Display for ParseRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRecordError::FieldCount(count) => {
                write!(f, "expected 3 fields in position record, found {}", count)
            }
            ParseRecordError::InvalidIdentifier(id) => write!(f, "invalid identifier '{}'", id),
            ParseRecordError::InvalidCoordinate(value) => {
                write!(f, "invalid coordinate '{}'", value)
            }
        }
    }
}

impl std::error::Error for ParseRecordError {}

/// One outbound position update
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    pub id: ClientId,
    pub position: Vec2,
}

impl PositionRecord {
    pub fn new(id: ClientId, position: Vec2) -> Self {
        Self { id, position }
    }

    /// Text form sent on the wire
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PositionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display for f32 never switches to exponent notation, so coordinates
        // never contain letters that could be mistaken for an identifier.
        write!(f, "{} {} {}", self.id, self.position.x, self.position.y)
    }
}

impl FromStr for PositionRecord {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(ParseRecordError::FieldCount(fields.len()));
        }

        let id = fields[0].parse::<ClientId>()?;
        let x = parse_coordinate(fields[1])?;
        let y = parse_coordinate(fields[2])?;

        Ok(PositionRecord::new(id, Vec2::new(x, y)))
    }
}

fn parse_coordinate(field: &str) -> Result<f32, ParseRecordError> {
    field
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseRecordError::InvalidCoordinate(field.to_string()))
}

/// Splits an undelimited stream of text records.
///
/// A record is known to be complete once the identifier of the next record
/// starts, so the most recent record stays pending until more bytes arrive or
/// [`RecordDecoder::flush`] is called.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    buffer: Vec<u8>,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes and returns every record that became complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<PositionRecord, ParseRecordError>> {
        self.buffer.extend_from_slice(bytes);

        let starts = self.record_starts();
        let Some(&last_start) = starts.last() else {
            // Bytes before the first identifier can never become part of a record
            self.buffer.clear();
            return Vec::new();
        };

        let records = starts
            .windows(2)
            .map(|pair| parse_slice(&self.buffer[pair[0]..pair[1]]))
            .collect();

        self.buffer.drain(..last_start);
        records
    }

    /// Returns the pending record, if any, and empties the buffer
    pub fn flush(&mut self) -> Option<Result<PositionRecord, ParseRecordError>> {
        let starts = self.record_starts();
        let first = *starts.first()?;
        let record = parse_slice(&self.buffer[first..]);
        self.buffer.clear();
        Some(record)
    }

    /// Parses the pending record without consuming it. Later bytes may still
    /// extend it, so the result is provisional.
    pub fn peek(&self) -> Option<Result<PositionRecord, ParseRecordError>> {
        let first = *self.record_starts().first()?;
        Some(parse_slice(&self.buffer[first..]))
    }

    pub fn has_pending(&self) -> bool {
        !self.record_starts().is_empty()
    }

    fn record_starts(&self) -> Vec<usize> {
        self.buffer
            .iter()
            .enumerate()
            .filter(|&(i, b)| {
                b.is_ascii_alphabetic() && (i == 0 || !self.buffer[i - 1].is_ascii_alphabetic())
            })
            .map(|(i, _)| i)
            .collect()
    }
}

fn parse_slice(bytes: &[u8]) -> Result<PositionRecord, ParseRecordError> {
    String::from_utf8_lossy(bytes).parse()
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_native_endian()
}

/// Encodes a position as an inbound binary record
pub fn encode_remote_position(position: Vec2) -> bincode::Result<Vec<u8>> {
    wire_options().serialize(&position)
}

/// Decodes one inbound binary record
pub fn decode_remote_position(bytes: &[u8; REMOTE_RECORD_LEN]) -> bincode::Result<Vec2> {
    wire_options().deserialize(bytes)
}
