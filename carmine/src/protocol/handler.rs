/*
 * Created on Wed Mar 02 2022
 *
 * This file is a part of Carmine
 * Carmine is a free and open-source Redis client library written by
 * Sayan Nandan ("the Author") with the vision to provide a fast,
 * reliable and flexible way to talk to a Redis deployment without
 * compromising on correctness or performance.
 *
 * Copyright (c) 2022, Sayan Nandan <ohsayan@outlook.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

use {
    super::{element::Response, parse_decimal, ParseError, ParseResult},
    bytes::Bytes,
    core::cmp,
};

/// An array being assembled: the declared element count and the children decoded so far
struct ParseFrame {
    count: usize,
    items: Vec<Response>,
}

impl ParseFrame {
    fn new(count: usize) -> Self {
        Self {
            count,
            items: Vec::with_capacity(count),
        }
    }
}

#[derive(Clone, Copy)]
/// Where the decoder will pick up when the next chunk of bytes arrives
enum Step {
    /// Scanning a CRLF-terminated type line
    Line,
    /// Collecting the body of a bulk string: `total` bytes (payload plus trailing CRLF)
    /// starting at `payload_start`
    Bulk { payload_start: usize, total: usize },
}

/// What a completed type line asks the decoder to do next
enum LineAction {
    Emit(Response),
    OpenArray(usize),
    OpenBulk(usize),
}

/// # The streaming reply decoder
///
/// A `ResponseHandler` turns a sequence of network reads into completed [`Response`] trees. The
/// caller repeatedly copies freshly received bytes into [`Self::buffer`] and reports the count
/// through [`Self::data_received`], which answers `true` once a top-level reply is complete.
/// [`Self::commit`] consumes that reply and, when a single read carried several back-to-back
/// replies, immediately finishes the next one from the bytes already on hand.
///
/// The decoder owns one growable buffer. Bytes that belong to already-committed replies are
/// dropped whenever the buffer has to grow, so growth only ever copies the reply currently in
/// flight. There is no upper bound other than what the server actually sends for one reply.
///
/// ## Invariants
/// - between top-level replies the frame stack is empty and the decoder sits at a line start
/// - a completed reply stays available through [`Self::top`] until the next
///   [`Self::data_received`] or [`Self::commit`]
pub struct ResponseHandler {
    buf: Vec<u8>,
    /// number of valid bytes in `buf`
    filled: usize,
    /// start of the in-flight top-level reply; everything before it is committed
    offset: usize,
    /// the next byte the decoder will look at
    cursor: usize,
    /// start of the type line currently being scanned
    line_start: usize,
    cr_seen: bool,
    crlf_seen: bool,
    step: Step,
    stack: Vec<ParseFrame>,
    top: Option<Response>,
    /// lower bound on the bytes still needed to finish the current element; sizes buffer growth
    bytes_to_expect: usize,
    initial_size: usize,
}

impl ResponseHandler {
    /// Default initial buffer size in bytes
    pub const DEFAULT_BUFFER_SIZE: usize = 1024;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_BUFFER_SIZE)
    }
    /// Create a handler with a custom initial buffer size (clamped to at least one byte)
    pub fn with_capacity(size: usize) -> Self {
        let size = cmp::max(size, 1);
        Self {
            buf: vec![0; size],
            filled: 0,
            offset: 0,
            cursor: 0,
            line_start: 0,
            cr_seen: false,
            crlf_seen: true,
            step: Step::Line,
            stack: Vec::new(),
            top: None,
            bytes_to_expect: 2,
            initial_size: size,
        }
    }

    /// Returns the writable span into which the caller should place freshly received bytes.
    /// The span is never empty: if the buffer is full it is grown first, discarding the bytes
    /// of already-committed replies and copying only the reply in flight
    pub fn buffer(&mut self) -> &mut [u8] {
        if self.filled == self.buf.len() {
            self.grow();
        }
        &mut self.buf[self.filled..]
    }

    /// Consume up to `bytes_received` freshly placed bytes. If more bytes are reported than
    /// the span returned by [`Self::buffer`] could hold, only the fitting portion is consumed.
    ///
    /// Returns `true` once a top-level reply has just been completed; it is then available
    /// through [`Self::top`]/[`Self::take_top`] until the next call or [`Self::commit`]
    pub fn data_received(&mut self, bytes_received: usize) -> ParseResult<bool> {
        let fitting = cmp::min(bytes_received, self.buf.len() - self.filled);
        self.filled += fitting;
        self.run()
    }

    /// The most recently completed top-level reply
    pub fn top(&self) -> Option<&Response> {
        self.top.as_ref()
    }
    /// Take ownership of the most recently completed top-level reply
    pub fn take_top(&mut self) -> Option<Response> {
        self.top.take()
    }

    /// Mark the current reply consumed and try to finish the next one from whatever already
    /// sits unparsed in the buffer. Returns `true` if a further top-level reply is already
    /// complete, which lets a caller drain a pipelined burst from a single large read.
    ///
    /// With `keep_buffer` unset, storage for consumed replies is released
    pub fn commit(&mut self, keep_buffer: bool) -> ParseResult<bool> {
        self.top = None;
        self.offset = self.cursor;
        if self.cursor == self.filled {
            if !keep_buffer {
                self.release();
            }
            return Ok(false);
        }
        if !keep_buffer {
            self.compact();
        }
        self.run()
    }

    /// Reinitialize completely: all buffered bytes and partial state are dropped
    pub fn reset(&mut self) {
        self.release();
        self.stack.clear();
        self.step = Step::Line;
        self.top = None;
        self.cr_seen = false;
        self.crlf_seen = true;
        self.bytes_to_expect = 2;
    }

    /// Resumable decode loop: alternates between line scanning and bulk body collection until
    /// a top-level reply completes or the unparsed region runs dry
    fn run(&mut self) -> ParseResult<bool> {
        loop {
            match self.step {
                Step::Line => {
                    if self.scan_lines()? {
                        return Ok(true);
                    }
                    if matches!(self.step, Step::Line) {
                        // out of bytes mid-line
                        return Ok(false);
                    }
                }
                Step::Bulk {
                    payload_start,
                    total,
                } => {
                    let available = self.filled - payload_start;
                    if available < total {
                        self.bytes_to_expect = total - available;
                        self.cursor = self.filled;
                        return Ok(false);
                    }
                    let end = payload_start + total;
                    if self.buf[end - 2] != b'\r' || self.buf[end - 1] != b'\n' {
                        return Err(ParseError::BadPacket);
                    }
                    let data = Bytes::copy_from_slice(&self.buf[payload_start..end - 2]);
                    self.cursor = end;
                    self.step = Step::Line;
                    if self.emit(Response::BulkString(data)) {
                        return Ok(true);
                    }
                }
            }
        }
    }

    /// Scan type lines byte by byte. Returns `true` when a top-level reply completed; stops
    /// early (with `self.step` switched) when a bulk string body begins
    fn scan_lines(&mut self) -> ParseResult<bool> {
        while self.cursor < self.filled {
            let byte = self.buf[self.cursor];
            if self.cr_seen && byte == b'\n' {
                self.cursor += 1;
                match self.scan_line()? {
                    LineAction::Emit(value) => {
                        if self.emit(value) {
                            return Ok(true);
                        }
                    }
                    LineAction::OpenArray(count) => {
                        self.stack.push(ParseFrame::new(count));
                        self.cr_seen = false;
                        self.crlf_seen = true;
                    }
                    LineAction::OpenBulk(total) => {
                        self.step = Step::Bulk {
                            payload_start: self.cursor,
                            total,
                        };
                        self.cr_seen = false;
                        return Ok(false);
                    }
                }
                continue;
            }
            if self.crlf_seen {
                // this byte opens the next element's type line
                self.line_start = self.cursor;
                self.crlf_seen = false;
            }
            if byte == b'\r' {
                self.cr_seen = true;
            }
            self.cursor += 1;
        }
        // a line needs at least its CRLF
        self.bytes_to_expect = 2;
        Ok(false)
    }

    /// Decide what the just-completed type line means. `self.cursor` sits one past the LF
    fn scan_line(&self) -> ParseResult<LineAction> {
        let line = &self.buf[self.line_start..self.cursor - 2];
        let (tsymbol, body) = match line.split_first() {
            Some((tsymbol, body)) => (*tsymbol, body),
            None => return Err(ParseError::UnexpectedByte),
        };
        match tsymbol {
            b'+' => Ok(LineAction::Emit(Response::SimpleString(
                Bytes::copy_from_slice(body),
            ))),
            b'-' => Ok(LineAction::Emit(Response::Error(Bytes::copy_from_slice(
                body,
            )))),
            b':' => Ok(LineAction::Emit(Response::Integer(Bytes::copy_from_slice(
                body,
            )))),
            b'$' => match parse_decimal(body)? {
                -1 => Ok(LineAction::Emit(Response::Null)),
                size if size < 0 => Err(ParseError::DatatypeParseFailure),
                // the body is followed by `size` payload bytes plus a CRLF
                size => Ok(LineAction::OpenBulk(size as usize + 2)),
            },
            b'*' => match parse_decimal(body)? {
                -1 => Ok(LineAction::Emit(Response::Null)),
                0 => Ok(LineAction::Emit(Response::Array(Vec::new()))),
                count if count < 0 => Err(ParseError::DatatypeParseFailure),
                count => Ok(LineAction::OpenArray(count as usize)),
            },
            _ => Err(ParseError::UnexpectedByte),
        }
    }

    /// Close the frame stack with a completed value. Every full frame collapses into an array
    /// that closes the frame above it in turn; with the stack empty the value is the finished
    /// top-level reply
    fn emit(&mut self, value: Response) -> bool {
        self.cr_seen = false;
        self.crlf_seen = true;
        let mut value = value;
        loop {
            let frame_full = match self.stack.last_mut() {
                Some(frame) => {
                    frame.items.push(value);
                    frame.items.len() == frame.count
                }
                None => {
                    self.top = Some(value);
                    return true;
                }
            };
            if !frame_full {
                return false;
            }
            value = match self.stack.pop() {
                Some(frame) => Response::Array(frame.items),
                // the match above just saw a frame; nothing to do if it vanished
                None => return false,
            };
        }
    }

    /// Grow the buffer: drop committed bytes first, then resize to at least double (or to
    /// whatever the in-flight element is known to need)
    fn grow(&mut self) {
        if self.offset != 0 {
            self.compact();
        }
        if self.filled == self.buf.len() {
            let required = self.filled + cmp::max(self.bytes_to_expect, 1);
            let target = cmp::max(self.buf.len() * 2, required);
            log::trace!(
                "growing response buffer from {} to {} bytes",
                self.buf.len(),
                target
            );
            self.buf.resize(target, 0);
        }
    }

    /// Move the in-flight reply to the front of the buffer and rebase every cursor
    fn compact(&mut self) {
        self.buf.copy_within(self.offset..self.filled, 0);
        self.filled -= self.offset;
        self.cursor -= self.offset;
        self.line_start = self.line_start.saturating_sub(self.offset);
        if let Step::Bulk { payload_start, .. } = &mut self.step {
            *payload_start -= self.offset;
        }
        self.offset = 0;
    }

    /// Release surplus storage. Only valid when no unparsed bytes remain
    fn release(&mut self) {
        self.buf = vec![0; self.initial_size];
        self.filled = 0;
        self.offset = 0;
        self.cursor = 0;
        self.line_start = 0;
    }
}

impl Default for ResponseHandler {
    fn default() -> Self {
        Self::new()
    }
}
