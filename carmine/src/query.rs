/*
 * Created on Fri Mar 04 2022
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

//! # Request encoding
//!
//! A command goes over the wire as an array of bulk strings: `*<n>\r\n` followed by one
//! `$<len>\r\n<payload>\r\n` per argument. [`Request`] assembles that form as an ordered list
//! of byte spans (a scatter sequence) so that a whole command can leave in one vectored write
//! without the arguments ever being copied into a contiguous staging buffer. [`Pipeline`]
//! concatenates the scatter sequences of several requests into a single transmission.

use {crate::protocol::CRLF, bytes::Bytes};

/// A value that can be appended to a [`Request`] as one argument. Byte-likes are taken as-is;
/// integers are stringified into storage owned by the request
pub trait IntoArgument {
    fn into_argument(self) -> Bytes;
}

impl IntoArgument for Bytes {
    fn into_argument(self) -> Bytes {
        self
    }
}
impl IntoArgument for Vec<u8> {
    fn into_argument(self) -> Bytes {
        Bytes::from(self)
    }
}
impl IntoArgument for &[u8] {
    fn into_argument(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}
impl<const N: usize> IntoArgument for &[u8; N] {
    fn into_argument(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}
impl IntoArgument for &str {
    fn into_argument(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}
impl IntoArgument for String {
    fn into_argument(self) -> Bytes {
        Bytes::from(self.into_bytes())
    }
}
impl IntoArgument for i64 {
    fn into_argument(self) -> Bytes {
        Bytes::from(self.to_string().into_bytes())
    }
}
impl IntoArgument for u64 {
    fn into_argument(self) -> Bytes {
        Bytes::from(self.to_string().into_bytes())
    }
}
impl IntoArgument for u16 {
    fn into_argument(self) -> Bytes {
        Bytes::from(self.to_string().into_bytes())
    }
}
impl IntoArgument for usize {
    fn into_argument(self) -> Bytes {
        Bytes::from(self.to_string().into_bytes())
    }
}

/// One encoded argument: its `$<len>` size line and the payload itself
struct Argument {
    size_line: Vec<u8>,
    data: Bytes,
}

/// # A single command
///
/// Every constructor/append argument becomes one element of the wire array, the command name
/// included. The `*<n>` header is re-rendered on each [`Self::buffer_sequence`] call, since
/// appends after an earlier call change the element count
pub struct Request {
    header: Vec<u8>,
    args: Vec<Argument>,
}

impl Request {
    /// Start a request with the command name as its first element
    pub fn new(command: impl IntoArgument) -> Self {
        let mut request = Self {
            header: Vec::new(),
            args: Vec::new(),
        };
        request.arg(command);
        request
    }

    /// Append one argument
    pub fn arg(&mut self, argument: impl IntoArgument) -> &mut Self {
        let data = argument.into_argument();
        let mut size_line = Vec::with_capacity(16);
        size_line.push(b'$');
        size_line.extend_from_slice(data.len().to_string().as_bytes());
        size_line.extend_from_slice(CRLF);
        self.args.push(Argument { size_line, data });
        self
    }

    /// Number of elements currently in the array
    pub fn argument_count(&self) -> usize {
        self.args.len()
    }

    /// Returns the ordered scatter sequence whose concatenation is the wire form of this
    /// request. Until the next append, repeated calls return equivalent views
    pub fn buffer_sequence(&mut self) -> Vec<&[u8]> {
        self.render_header();
        self.segments()
    }

    fn render_header(&mut self) {
        self.header.clear();
        self.header.push(b'*');
        self.header
            .extend_from_slice(self.args.len().to_string().as_bytes());
        self.header.extend_from_slice(CRLF);
    }

    /// The scatter view over the current state; `render_header` must have run since the last
    /// append
    fn segments(&self) -> Vec<&[u8]> {
        let mut sequence = Vec::with_capacity(1 + self.args.len() * 3);
        sequence.push(self.header.as_slice());
        for argument in &self.args {
            sequence.push(&argument.size_line);
            sequence.push(&argument.data);
            sequence.push(CRLF);
        }
        sequence
    }
}

/// # A client-side command batch
///
/// All appended requests are written in one transmission before any reply is read; the server
/// answers with exactly one reply per request, in order
#[derive(Default)]
pub struct Pipeline {
    requests: Vec<Request>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request, taking ownership of it
    pub fn push(&mut self, request: Request) -> &mut Self {
        self.requests.push(request);
        self
    }

    /// The number of replies this batch expects
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// The flattened scatter sequence over every appended request, in order
    pub fn buffer_sequence(&mut self) -> Vec<&[u8]> {
        for request in &mut self.requests {
            request.render_header();
        }
        let mut sequence = Vec::new();
        for request in &self.requests {
            sequence.extend(request.segments());
        }
        sequence
    }
}
