/*
 * Created on Tue Mar 01 2022
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

//! # The RESP protocol
//!
//! ## Introduction
//! RESP (the REdis Serialization Protocol) is the request/response serialization format spoken
//! by the Redis server family. Requests are arrays of bulk strings; replies are trees built from
//! five line-introduced kinds (simple strings, errors, integers, bulk strings and arrays), each
//! line terminated by CRLF. Bulk string payloads are opaque octet sequences and may contain any
//! byte, including CR, LF and NUL.
//!
//! This module contains the typed reply tree ([`element::Response`]) and the streaming reply
//! decoder ([`handler::ResponseHandler`]). The decoder is fully incremental: it accepts network
//! reads of arbitrary size, suspends wherever the byte stream runs dry and resumes on the next
//! read, so a caller never has to buffer a complete reply up front.

// modules
pub mod element;
pub mod handler;
// endof modules
#[cfg(test)]
mod tests;

use core::fmt;

/// The line terminator used throughout the protocol
pub(crate) const CRLF: &[u8] = b"\r\n";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Errors raised while decoding a reply stream
pub enum ParseError {
    /// The server sent a line introduced by a byte that is not a known type symbol
    UnexpectedByte,
    /// A decimal length or integer field failed to parse
    DatatypeParseFailure,
    /// A bulk string payload was not terminated by CRLF
    BadPacket,
    /// The reply decoded fine, but its shape does not fit the command that was issued
    UnexpectedResponse,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedByte => write!(f, "unexpected type symbol"),
            ParseError::DatatypeParseFailure => write!(f, "malformed decimal field"),
            ParseError::BadPacket => write!(f, "bulk payload not terminated by CRLF"),
            ParseError::UnexpectedResponse => write!(f, "response does not fit the command"),
        }
    }
}

/// A generic result for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a signed decimal from `bytes`, rejecting empty input, non-digits and overflow
pub(crate) fn parse_decimal(bytes: &[u8]) -> ParseResult<i64> {
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        return Err(ParseError::DatatypeParseFailure);
    }
    let mut ret: i64 = 0;
    for byte in digits {
        if byte.is_ascii_digit() {
            ret = match ret.checked_mul(10) {
                Some(r) => r,
                None => return Err(ParseError::DatatypeParseFailure),
            };
            ret = match ret.checked_add((byte & 0x0F) as i64) {
                Some(r) => r,
                None => return Err(ParseError::DatatypeParseFailure),
            };
        } else {
            return Err(ParseError::DatatypeParseFailure);
        }
    }
    Ok(if negative { -ret } else { ret })
}
