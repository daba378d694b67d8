//! Newline framing with a per-connection size cap

use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// One unit read off the stream
#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A line as read, terminator included when present
    Line(&'a [u8]),
    /// A line longer than the cap; its bytes were dropped
    TooLong,
    Eof,
}

/// Splits a byte stream into lines without letting one line grow past `limit`
pub struct LineReader<R> {
    inner: BufReader<R>,
    line: Vec<u8>,
    limit: usize,
    overflowed: bool,
    finished: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            line: Vec::with_capacity(limit),
            limit,
            overflowed: false,
            finished: false,
        }
    }

    /// Read up to the next `\n`.
    ///
    /// Once a line passes `limit` bytes the rest of it is skipped up to the
    /// terminator and reported as [`Frame::TooLong`]. A read error keeps the
    /// partial line, so the next call picks up where this one stopped.
    pub async fn next_frame(&mut self) -> io::Result<Frame<'_>> {
        if self.finished {
            self.line.clear();
            self.overflowed = false;
            self.finished = false;
        }

        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                self.finished = true;
                return Ok(if self.overflowed {
                    Frame::TooLong
                } else if self.line.is_empty() {
                    Frame::Eof
                } else {
                    Frame::Line(&self.line)
                });
            }

            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };

            if !self.overflowed {
                if self.line.len() + used > self.limit {
                    self.overflowed = true;
                    self.line.clear();
                } else {
                    self.line.extend_from_slice(&available[..used]);
                }
            }
            self.inner.consume(used);

            if done {
                self.finished = true;
                return Ok(if self.overflowed {
                    Frame::TooLong
                } else {
                    Frame::Line(&self.line)
                });
            }
        }
    }
}
