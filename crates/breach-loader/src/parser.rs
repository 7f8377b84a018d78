//! Line reading and `key:value` parsing

use crate::error::RowError;
use crate::identifier::IdentifierEncoding;
use crate::models::{Row, RowKind};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Separator between the key and value fields
pub const SEPARATOR: char = ':';

/// Longest accepted line, terminator excluded
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Key and value of one line, borrowed from the line buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Split a line on the first separator into two non-empty fields.
///
/// The value may itself contain the separator.
pub fn parse_line(line: &str) -> Result<ParsedLine<'_>, RowError> {
    let (key, value) = line
        .split_once(SEPARATOR)
        .ok_or(RowError::MissingSeparator)?;

    if key.is_empty() || value.is_empty() {
        return Err(RowError::EmptyField);
    }

    Ok(ParsedLine { key, value })
}

/// Parse and encode one line into a row of `kind`
pub fn parse_row(kind: RowKind, encoding: IdentifierEncoding, line: &str) -> Result<Row, RowError> {
    let ParsedLine { key, value } = parse_line(line)?;

    match kind {
        RowKind::Count => {
            let count = value.parse::<i32>().map_err(|_| RowError::InvalidCount {
                value: value.to_string(),
            })?;
            Ok(Row::Count {
                identifier: encoding.encode(key)?,
                count,
            })
        }
        RowKind::Password => Ok(Row::Password {
            identifier: encoding.encode(key)?,
            password: value.to_string(),
        }),
        // Presence runs read count-form files and drop the count
        RowKind::Presence => Ok(Row::Presence {
            identifier: encoding.encode(key)?,
        }),
    }
}

/// Reads newline terminated lines from a buffered source.
///
/// A trailing `\r` is stripped. Lines that are not UTF-8 are reported as a
/// row error rather than failing the read. A line longer than the limit
/// fails the read with [`io::ErrorKind::InvalidData`].
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: u64,
    max_line_bytes: usize,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
            line_number: 0,
            max_line_bytes: MAX_LINE_BYTES,
        }
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// 1-based number of the line most recently returned
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Next line, `Ok(None)` at end of input
    pub async fn next_line(&mut self) -> io::Result<Option<Result<&str, RowError>>> {
        self.buf.clear();

        // Room for the longest line plus "\r\n"
        let limit = self.max_line_bytes as u64 + 2;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let terminated = self.buf.last() == Some(&b'\n');
        let content_len = if terminated {
            self.buf.len() - 1 - usize::from(self.buf.ends_with(b"\r\n"))
        } else {
            self.buf.len() - usize::from(self.buf.last() == Some(&b'\r'))
        };
        if content_len > self.max_line_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "line {} is longer than {} bytes",
                    self.line_number, self.max_line_bytes
                ),
            ));
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        Ok(Some(
            std::str::from_utf8(&self.buf).map_err(|_| RowError::InvalidUtf8),
        ))
    }
}
