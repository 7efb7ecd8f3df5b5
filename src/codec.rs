//! Streaming JSON event codec
//!
//! Stored objects and the report's `usage.json` both hold a JSON array of
//! usage events. These can be large, so the codec reads and writes one
//! element at a time instead of materializing the whole array.
//!
//! [`EventDecoder`] validates the opening `[` up front and then hands out
//! elements on demand; a malformed element is a hard [`Error::Decode`],
//! never skipped and never confused with end-of-array. [`EventEncoder`]
//! writes the opening bracket at construction and the closing bracket in
//! `close`, which consumes the encoder so the stream is finalized exactly
//! once.

use crate::error::{Error, Result};
use crate::models::UsageEvent;
use std::io::{BufRead, Write};

/// Incremental reader of a JSON array of [`UsageEvent`]s.
pub struct EventDecoder<R: BufRead> {
    reader: R,
    first: bool,
    done: bool,
}

impl<R: BufRead> EventDecoder<R> {
    /// Consume the opening `[`; fails immediately if the stream does not
    /// start with an array.
    pub fn new(mut reader: R) -> Result<Self> {
        skip_whitespace(&mut reader)?;
        match next_byte(&mut reader)? {
            Some(b'[') => Ok(Self {
                reader,
                first: true,
                done: false,
            }),
            Some(other) => Err(Error::decode(format!(
                "expected '[' at start of event stream, found {:?}",
                other as char
            ))),
            None => Err(Error::decode("empty input, expected a JSON array")),
        }
    }

    /// Whether another element remains. Consumes the closing `]` when the
    /// array ends.
    pub fn more(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        skip_whitespace(&mut self.reader)?;
        match peek_byte(&mut self.reader)? {
            Some(b']') => {
                next_byte(&mut self.reader)?;
                self.done = true;
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Err(Error::decode("unexpected end of input inside event array")),
        }
    }

    /// Read and unmarshal the next element. Calling this when no element
    /// remains is a decode error, not end-of-stream.
    pub fn decode(&mut self) -> Result<UsageEvent> {
        if self.done {
            return Err(Error::decode("event array already terminated"));
        }
        skip_whitespace(&mut self.reader)?;
        if !self.first {
            match next_byte(&mut self.reader)? {
                Some(b',') => skip_whitespace(&mut self.reader)?,
                Some(other) => {
                    return Err(Error::decode(format!(
                        "expected ',' between events, found {:?}",
                        other as char
                    )))
                }
                None => return Err(Error::decode("unexpected end of input inside event array")),
            }
        }
        let raw = read_value(&mut self.reader)?;
        let event = serde_json::from_slice(&raw)
            .map_err(|e| Error::decode(format!("malformed event: {e}")))?;
        self.first = false;
        Ok(event)
    }
}

/// Scan exactly one JSON value off the stream, respecting strings, escapes,
/// and brace/bracket nesting. Scalars end at the first delimiter, which is
/// left unconsumed.
fn read_value<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let first = peek_byte(reader)?
        .ok_or_else(|| Error::decode("unexpected end of input, expected a value"))?;

    match first {
        b',' | b']' | b'}' => {
            return Err(Error::decode(format!(
                "expected a value, found {:?}",
                first as char
            )))
        }
        b'{' | b'[' => {
            let mut depth = 0usize;
            let mut in_string = false;
            let mut escaped = false;
            loop {
                let b = next_byte(reader)?.ok_or_else(|| {
                    Error::decode("unexpected end of input inside event value")
                })?;
                buf.push(b);
                if in_string {
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == b'"' {
                        in_string = false;
                    }
                    continue;
                }
                match b {
                    b'"' => in_string = true,
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
        b'"' => {
            buf.push(
                next_byte(reader)?
                    .ok_or_else(|| Error::decode("unexpected end of input in string"))?,
            );
            let mut escaped = false;
            loop {
                let b = next_byte(reader)?
                    .ok_or_else(|| Error::decode("unterminated string in event value"))?;
                buf.push(b);
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    break;
                }
            }
        }
        _ => {
            // Scalar: number, true/false, null.
            while let Some(b) = peek_byte(reader)? {
                if b.is_ascii_whitespace() || b == b',' || b == b']' || b == b'}' {
                    break;
                }
                buf.push(b);
                next_byte(reader)?;
            }
            if buf.is_empty() {
                return Err(Error::decode("expected a value"));
            }
        }
    }
    Ok(buf)
}

fn peek_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    let buf = reader.fill_buf()?;
    Ok(buf.first().copied())
}

fn next_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    match peek_byte(reader)? {
        Some(b) => {
            reader.consume(1);
            Ok(Some(b))
        }
        None => Ok(None),
    }
}

fn skip_whitespace<R: BufRead>(reader: &mut R) -> Result<()> {
    while let Some(b) = peek_byte(reader)? {
        if !b.is_ascii_whitespace() {
            break;
        }
        reader.consume(1);
    }
    Ok(())
}

/// Incremental writer of a JSON array of [`UsageEvent`]s.
///
/// Elements are newline-delimited for readability. `close` must be called
/// to produce valid JSON; it consumes the encoder and returns the inner
/// writer.
pub struct EventEncoder<W: Write> {
    writer: W,
    count: usize,
}

impl<W: Write> EventEncoder<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_all(b"[")?;
        Ok(Self { writer, count: 0 })
    }

    pub fn encode(&mut self, event: &UsageEvent) -> Result<()> {
        if self.count == 0 {
            self.writer.write_all(b"\n")?;
        } else {
            self.writer.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut self.writer, event)
            .map_err(|e| Error::encode(format!("event: {e}")))?;
        self.count += 1;
        Ok(())
    }

    /// Write the closing `]` and hand back the writer. An empty stream
    /// encodes as `[]`, never `null`.
    pub fn close(mut self) -> Result<W> {
        if self.count == 0 {
            self.writer.write_all(b"]")?;
        } else {
            self.writer.write_all(b"\n]")?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}
