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

use {
    super::{parse_decimal, ParseResult},
    bytes::Bytes,
    core::{fmt, ops},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// # Reply elements
///
/// This enum represents a single decoded reply from the server, which may itself be a tree
/// (arrays nest arbitrarily). Scalar payloads are owned byte strings, so a [`Response`] stays
/// valid for as long as the caller wants, independently of the decoder that produced it.
///
/// A `Null` is what the server answers where no value exists; a missing bulk string and a
/// missing array both decode to it.
pub enum Response {
    /// A one-line textual value; `<tsymbol>` is `+`
    SimpleString(Bytes),
    /// An error report; `<tsymbol>` is `-`
    Error(Bytes),
    /// A signed 64-bit integer, kept in its decimal wire form; `<tsymbol>` is `:`
    Integer(Bytes),
    /// A length-prefixed binary-safe string; `<tsymbol>` is `$`
    BulkString(Bytes),
    /// The null value (`$-1` or `*-1`)
    Null,
    /// An ordered collection of nested replies; `<tsymbol>` is `*`
    Array(Vec<Response>),
}

impl Response {
    /// Returns the payload bytes of a scalar element. `Null` and arrays have no payload, so
    /// this returns an empty slice for them
    pub fn data(&self) -> &[u8] {
        match self {
            Response::SimpleString(data)
            | Response::Error(data)
            | Response::Integer(data)
            | Response::BulkString(data) => data,
            Response::Null | Response::Array(_) => &[],
        }
    }
    /// Interpret the payload as a signed decimal. This is only meaningful for `Integer`
    /// elements; anything else fails the decimal parse
    pub fn as_int(&self) -> ParseResult<i64> {
        parse_decimal(self.data())
    }
    /// Returns the children of an `Array` element
    pub fn elements(&self) -> Option<&[Response]> {
        if let Response::Array(elements) = self {
            Some(elements)
        } else {
            None
        }
    }
    /// Returns the child at `index`, if this is an array and the index is in range
    pub fn get(&self, index: usize) -> Option<&Response> {
        self.elements().and_then(|elements| elements.get(index))
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Response::Null)
    }
}

impl ops::Index<usize> for Response {
    type Output = Response;
    fn index(&self, index: usize) -> &Self::Output {
        match self.elements() {
            Some(elements) => &elements[index],
            None => panic!("attempted to index into a non-array response"),
        }
    }
}

impl fmt::Display for Response {
    /// Renders the element the way the logs want to see it: scalars as `Kind:"payload"`,
    /// arrays bracketed with the child count first
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::SimpleString(data) => {
                write!(f, "Simple:\"{}\"", String::from_utf8_lossy(data))
            }
            Response::Error(data) => write!(f, "Error:\"{}\"", String::from_utf8_lossy(data)),
            Response::Integer(data) => write!(f, "Integer:\"{}\"", String::from_utf8_lossy(data)),
            Response::BulkString(data) => {
                write!(f, "Bulkstring:\"{}\"", String::from_utf8_lossy(data))
            }
            Response::Null => write!(f, "Null"),
            Response::Array(elements) => {
                write!(f, "[{}: ", elements.len())?;
                for element in elements {
                    write!(f, "{},", element)?;
                }
                write!(f, "]")
            }
        }
    }
}
