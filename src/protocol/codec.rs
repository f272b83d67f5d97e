//! Protocol codec
//!
//! Parsing and serialization for the wire protocol.
//!
//! ## Wire Format
//! ```text
//! +<text>\r\n                      simple string
//! -<text>\r\n                      error
//! :<decimal>\r\n                   integer
//! $<len>\r\n<len bytes>\r\n        bulk string   ($-1\r\n = null)
//! *<count>\r\n<count values>       array
//! ```
//!
//! Lines end with `\r\n` only; a bare `\n` is ordinary content.

use std::io::{BufRead, ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};
use super::value::{Value, ARRAY, BULK_STRING, ERROR, INTEGER, SIMPLE_STRING};

/// Longest header or simple-string line accepted (without the CRLF)
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Largest bulk string accepted (512 MB)
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Deepest array nesting accepted
pub const MAX_DEPTH: usize = 512;

const CRLF: &[u8; 2] = b"\r\n";

// =============================================================================
// Decoding
// =============================================================================

/// Reads values one at a time from a buffered byte stream
///
/// Each call to [`Decoder::decode`] consumes exactly the bytes of one value,
/// leaving the stream at the first byte of the next one. The decoder keeps a
/// running byte offset so protocol errors can say where they happened.
pub struct Decoder<R> {
    reader: R,
    offset: u64,
    failed: bool,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            failed: false,
        }
    }

    /// Read the next complete value
    ///
    /// Returns:
    /// - `Ok(Some(value))` — a value was read
    /// - `Ok(None)` — the stream ended cleanly before a new value began
    /// - `Err(KvError::Protocol { .. })` — malformed or truncated input
    /// - `Err(KvError::Io(_))` — the underlying reader failed
    pub fn decode(&mut self) -> Result<Option<Value>> {
        let start = self.offset;
        match self.read_marker()? {
            None => Ok(None),
            Some(marker) => self.decode_body(marker, start, 0).map(Some),
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    fn decode_nested(&mut self, depth: usize) -> Result<Value> {
        let start = self.offset;
        match self.read_marker()? {
            None => Err(unexpected_eof(start)),
            Some(marker) => self.decode_body(marker, start, depth),
        }
    }

    fn decode_body(&mut self, marker: u8, start: u64, depth: usize) -> Result<Value> {
        match marker {
            SIMPLE_STRING => Ok(Value::SimpleString(Bytes::from(self.read_line()?))),
            ERROR => Ok(Value::Error(Bytes::from(self.read_line()?))),
            INTEGER => Ok(Value::Integer(self.read_integer()?)),
            BULK_STRING => self.read_bulk(),
            ARRAY => self.read_array(depth),
            other => Err(KvError::protocol(
                start,
                format!("unknown type marker 0x{:02x}", other),
            )),
        }
    }

    fn read_marker(&mut self) -> Result<Option<u8>> {
        let marker = loop {
            match self.reader.fill_buf() {
                Ok([]) => return Ok(None),
                Ok(buf) => break buf[0],
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        self.reader.consume(1);
        self.offset += 1;
        Ok(Some(marker))
    }

    /// Read up to the next CRLF and return the line without it
    fn read_line(&mut self) -> Result<Vec<u8>> {
        let start = self.offset;
        let mut line = Vec::new();

        loop {
            let remaining = (MAX_LINE_LEN + CRLF.len()).saturating_sub(line.len()) as u64;
            let n = (&mut self.reader).take(remaining).read_until(b'\n', &mut line)?;
            self.offset += n as u64;

            if line.ends_with(CRLF) {
                line.truncate(line.len() - CRLF.len());
                return Ok(line);
            }
            if n == 0 {
                return Err(unexpected_eof(start));
            }
            if line.len() >= MAX_LINE_LEN + CRLF.len() {
                return Err(KvError::protocol(
                    start,
                    format!("line exceeds {} bytes", MAX_LINE_LEN),
                ));
            }
        }
    }

    fn read_integer(&mut self) -> Result<i64> {
        let start = self.offset;
        let line = self.read_line()?;
        std::str::from_utf8(&line)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                KvError::protocol(
                    start,
                    format!("invalid integer {:?}", String::from_utf8_lossy(&line)),
                )
            })
    }

    fn read_bulk(&mut self) -> Result<Value> {
        let start = self.offset;
        let len = self.read_integer()?;

        if len == -1 {
            return Ok(Value::Null);
        }
        if len < 0 {
            return Err(KvError::protocol(start, format!("invalid bulk length {}", len)));
        }
        if len > MAX_BULK_LEN {
            return Err(KvError::protocol(
                start,
                format!("bulk length {} exceeds {} bytes", len, MAX_BULK_LEN),
            ));
        }

        // Read through `take` so a bogus length cannot force a huge allocation
        // before any body bytes arrive.
        let body_start = self.offset;
        let mut body = Vec::new();
        let n = (&mut self.reader).take(len as u64).read_to_end(&mut body)?;
        self.offset += n as u64;
        if n as i64 != len {
            return Err(unexpected_eof(body_start));
        }

        let end = self.offset;
        let mut terminator = [0u8; 2];
        self.read_exact(&mut terminator)?;
        if &terminator != CRLF {
            return Err(KvError::protocol(end, "bulk string not terminated by CRLF"));
        }

        Ok(Value::BulkString(Bytes::from(body)))
    }

    fn read_array(&mut self, depth: usize) -> Result<Value> {
        let start = self.offset;
        let count = self.read_integer()?;

        if count < 0 {
            return Err(KvError::protocol(start, format!("invalid array length {}", count)));
        }
        if depth >= MAX_DEPTH {
            return Err(KvError::protocol(
                start,
                format!("array nesting exceeds {} levels", MAX_DEPTH),
            ));
        }

        let mut items = Vec::with_capacity((count as usize).min(1024));
        for _ in 0..count {
            items.push(self.decode_nested(depth + 1)?);
        }
        Ok(Value::Array(items))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let start = self.offset;
        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(unexpected_eof(start)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Iterates values until the stream ends cleanly
///
/// The iterator yields at most one error and then stops, because the stream
/// position after a failure is no longer at a value boundary.
impl<R: BufRead> Iterator for Decoder<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.decode().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

fn unexpected_eof(offset: u64) -> KvError {
    KvError::protocol(offset, "unexpected end of stream")
}

// =============================================================================
// Encoding
// =============================================================================

/// Append the wire form of `value` to `dst`
pub fn encode(value: &Value, dst: &mut BytesMut) {
    match value {
        Value::SimpleString(text) => encode_line(SIMPLE_STRING, text, dst),
        Value::Error(text) => encode_line(ERROR, text, dst),
        Value::Integer(n) => encode_header(INTEGER, *n, dst),
        Value::Null => dst.put_slice(b"$-1\r\n"),
        Value::BulkString(data) => {
            encode_header(BULK_STRING, data.len() as i64, dst);
            dst.put_slice(data);
            dst.put_slice(CRLF);
        }
        Value::Array(items) => {
            encode_header(ARRAY, items.len() as i64, dst);
            for item in items {
                encode(item, dst);
            }
        }
    }
}

/// Serialize `value` into a fresh buffer
pub fn marshal(value: &Value) -> Bytes {
    let mut dst = BytesMut::new();
    encode(value, &mut dst);
    dst.freeze()
}

fn encode_line(marker: u8, text: &[u8], dst: &mut BytesMut) {
    debug_assert!(
        !text.iter().any(|&b| b == b'\r' || b == b'\n'),
        "line values must not contain CR or LF"
    );
    dst.reserve(1 + text.len() + CRLF.len());
    dst.put_u8(marker);
    dst.put_slice(text);
    dst.put_slice(CRLF);
}

fn encode_header(marker: u8, n: i64, dst: &mut BytesMut) {
    dst.put_u8(marker);
    dst.put_slice(n.to_string().as_bytes());
    dst.put_slice(CRLF);
}

impl Value {
    /// Serialize this value to its wire bytes
    pub fn marshal(&self) -> Bytes {
        marshal(self)
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one value from a buffered stream
///
/// Convenience for one-shot reads; offsets in errors are relative to the
/// current stream position. Use a long-lived [`Decoder`] for repeated reads.
pub fn read_value<R: BufRead>(reader: &mut R) -> Result<Option<Value>> {
    Decoder::new(reader).decode()
}

/// Write a value to a stream and flush it
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    writer.write_all(&marshal(value))?;
    writer.flush()?;
    Ok(())
}
