/*
 * Created on Thu Mar 03 2022
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
    super::{element::Response, handler::ResponseHandler, parse_decimal, ParseError},
    bytes::Bytes,
    rand::RngCore,
};

fn simple(text: &'static str) -> Response {
    Response::SimpleString(Bytes::from_static(text.as_bytes()))
}
fn error(text: &'static str) -> Response {
    Response::Error(Bytes::from_static(text.as_bytes()))
}
fn integer(text: &'static str) -> Response {
    Response::Integer(Bytes::from_static(text.as_bytes()))
}
fn bulk(text: &'static str) -> Response {
    Response::BulkString(Bytes::from_static(text.as_bytes()))
}

/// Feed `input` into `handler` in chunks of at most `chunk_limit` bytes, collecting every
/// completed top-level reply (draining multi-reply reads through `commit(true)`)
fn decode_all(input: &[u8], handler: &mut ResponseHandler, chunk_limit: usize) -> Vec<Response> {
    let mut replies = Vec::new();
    let mut remaining = input;
    while !remaining.is_empty() {
        let span = handler.buffer();
        let take = remaining.len().min(span.len()).min(chunk_limit);
        span[..take].copy_from_slice(&remaining[..take]);
        remaining = &remaining[take..];
        if handler.data_received(take).unwrap() {
            loop {
                replies.push(handler.take_top().unwrap());
                if !handler.commit(true).unwrap() {
                    break;
                }
            }
        }
    }
    replies
}

fn decode_one(input: &[u8]) -> Response {
    let mut handler = ResponseHandler::new();
    let mut replies = decode_all(input, &mut handler, usize::MAX);
    assert_eq!(replies.len(), 1);
    replies.pop().unwrap()
}

/// Every partition of the input into chunks of size `1..=len` must produce the same tree
fn assert_chunk_insensitive(input: &[u8], expected: &Response) {
    for chunk_limit in 1..=input.len() {
        let mut handler = ResponseHandler::new();
        let replies = decode_all(input, &mut handler, chunk_limit);
        assert_eq!(replies.len(), 1, "chunk limit {chunk_limit}");
        assert_eq!(&replies[0], expected, "chunk limit {chunk_limit}");
    }
}

/// Every initial buffer size `1..=len` (and the default) must produce the same tree
fn assert_buffer_size_insensitive(input: &[u8], expected: &Response) {
    for size in 1..=input.len() {
        let mut handler = ResponseHandler::with_capacity(size);
        let replies = decode_all(input, &mut handler, usize::MAX);
        assert_eq!(replies.len(), 1, "buffer size {size}");
        assert_eq!(&replies[0], expected, "buffer size {size}");
    }
    assert_eq!(&decode_one(input), expected);
}

#[test]
fn simple_string() {
    let expected = simple("PONG");
    assert_eq!(decode_one(b"+PONG\r\n"), expected);
    assert_chunk_insensitive(b"+PONG\r\n", &expected);
    assert_buffer_size_insensitive(b"+PONG\r\n", &expected);
}

#[test]
fn error_report() {
    let expected = error("ERR wrong type");
    assert_eq!(decode_one(b"-ERR wrong type\r\n"), expected);
    assert_chunk_insensitive(b"-ERR wrong type\r\n", &expected);
}

#[test]
fn integer_value() {
    let reply = decode_one(b":1000\r\n");
    assert_eq!(reply, integer("1000"));
    assert_eq!(reply.as_int().unwrap(), 1000);
}

#[test]
fn negative_integer_value() {
    assert_eq!(decode_one(b":-25\r\n").as_int().unwrap(), -25);
}

#[test]
fn bulkstring() {
    let expected = bulk("foobar");
    assert_eq!(decode_one(b"$6\r\nfoobar\r\n"), expected);
    assert_chunk_insensitive(b"$6\r\nfoobar\r\n", &expected);
    assert_buffer_size_insensitive(b"$6\r\nfoobar\r\n", &expected);
}

#[test]
fn empty_bulkstring() {
    assert_eq!(decode_one(b"$0\r\n\r\n"), bulk(""));
}

#[test]
fn array_of_bulkstrings() {
    let expected = Response::Array(vec![bulk("foo"), bulk("bar")]);
    let input = b"*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n";
    assert_eq!(decode_one(input), expected);
    assert_chunk_insensitive(input, &expected);
    assert_buffer_size_insensitive(input, &expected);
}

#[test]
fn nested_arrays() {
    let input = b"*2\r\n*3\r\n:1\r\n:2\r\n:3\r\n*2\r\n+Foo\r\n-Bar\r\n";
    let expected = Response::Array(vec![
        Response::Array(vec![integer("1"), integer("2"), integer("3")]),
        Response::Array(vec![simple("Foo"), error("Bar")]),
    ]);
    assert_eq!(decode_one(input), expected);
    assert_chunk_insensitive(input, &expected);
    assert_buffer_size_insensitive(input, &expected);
}

#[test]
fn null_identity() {
    // a missing bulk string and a missing array mean the same thing
    assert_eq!(decode_one(b"$-1\r\n"), Response::Null);
    assert_eq!(decode_one(b"*-1\r\n"), Response::Null);
    assert_eq!(decode_one(b"$-1\r\n"), decode_one(b"*-1\r\n"));
}

#[test]
fn empty_array() {
    let reply = decode_one(b"*0\r\n");
    assert_eq!(reply, Response::Array(Vec::new()));
    assert_eq!(reply.elements().unwrap().len(), 0);
}

#[test]
fn null_inside_array() {
    let expected = Response::Array(vec![bulk("a"), Response::Null, bulk("b")]);
    assert_eq!(
        decode_one(b"*3\r\n$1\r\na\r\n$-1\r\n$1\r\nb\r\n"),
        expected
    );
}

#[test]
fn binary_safe_payload() {
    // payloads may carry CR, LF and NUL
    let payload = b"a\r\nb\0c\rd\ne";
    let mut input = format!("${}\r\n", payload.len()).into_bytes();
    input.extend_from_slice(payload);
    input.extend_from_slice(b"\r\n");
    let expected = Response::BulkString(Bytes::from_static(payload));
    assert_eq!(decode_one(&input), expected);
    assert_chunk_insensitive(&input, &expected);
    assert_buffer_size_insensitive(&input, &expected);
}

#[test]
fn arbitrary_bytes_payload() {
    let mut payload = vec![0u8; 257];
    rand::thread_rng().fill_bytes(&mut payload);
    let mut input = format!("${}\r\n", payload.len()).into_bytes();
    input.extend_from_slice(&payload);
    input.extend_from_slice(b"\r\n");
    match decode_one(&input) {
        Response::BulkString(data) => assert_eq!(data.as_ref(), payload.as_slice()),
        other => panic!("expected a bulk string, got {other}"),
    }
}

#[test]
fn bulk_larger_than_initial_buffer() {
    let mut payload = vec![0u8; 4096];
    rand::thread_rng().fill_bytes(&mut payload);
    let mut input = format!("${}\r\n", payload.len()).into_bytes();
    input.extend_from_slice(&payload);
    input.extend_from_slice(b"\r\n");
    let mut handler = ResponseHandler::with_capacity(16);
    let replies = decode_all(&input, &mut handler, 100);
    assert_eq!(replies.len(), 1);
    match &replies[0] {
        Response::BulkString(data) => assert_eq!(data.as_ref(), payload.as_slice()),
        other => panic!("expected a bulk string, got {other}"),
    }
}

#[test]
fn multiple_replies_in_one_read() {
    let input =
        b"*3\r\n$9\r\nsubscribe\r\n$5\r\nfirst\r\n:1\r\n*3\r\n$9\r\nsubscribe\r\n$6\r\nsecond\r\n:2\r\n";
    let mut handler = ResponseHandler::new();
    let span = handler.buffer();
    span[..input.len()].copy_from_slice(input);
    assert!(handler.data_received(input.len()).unwrap());
    let first = handler.take_top().unwrap();
    assert_eq!(
        first,
        Response::Array(vec![bulk("subscribe"), bulk("first"), integer("1")])
    );
    // the second reply is already sitting in the buffer
    assert!(handler.commit(true).unwrap());
    let second = handler.take_top().unwrap();
    assert_eq!(
        second,
        Response::Array(vec![bulk("subscribe"), bulk("second"), integer("2")])
    );
    assert!(!handler.commit(true).unwrap());
}

#[test]
fn multiple_replies_every_buffer_size() {
    let input =
        b"*3\r\n$9\r\nsubscribe\r\n$5\r\nfirst\r\n:1\r\n*3\r\n$9\r\nsubscribe\r\n$6\r\nsecond\r\n:2\r\n";
    for size in 1..input.len() {
        let mut handler = ResponseHandler::with_capacity(size);
        let replies = decode_all(input, &mut handler, usize::MAX);
        assert_eq!(replies.len(), 2, "buffer size {size}");
        assert_eq!(
            replies[0],
            Response::Array(vec![bulk("subscribe"), bulk("first"), integer("1")]),
            "buffer size {size}"
        );
        assert_eq!(
            replies[1],
            Response::Array(vec![bulk("subscribe"), bulk("second"), integer("2")]),
            "buffer size {size}"
        );
    }
}

#[test]
fn commit_without_keep_still_finishes_buffered_reply() {
    let input = b"+one\r\n+two\r\n";
    let mut handler = ResponseHandler::new();
    let span = handler.buffer();
    span[..input.len()].copy_from_slice(input);
    assert!(handler.data_received(input.len()).unwrap());
    assert_eq!(handler.take_top().unwrap(), simple("one"));
    // dropping surplus storage must not lose the bytes of the next reply
    assert!(handler.commit(false).unwrap());
    assert_eq!(handler.take_top().unwrap(), simple("two"));
    assert!(!handler.commit(false).unwrap());
}

#[test]
fn handler_reuse_after_commit() {
    let mut handler = ResponseHandler::new();
    for round in 0..3 {
        let input = format!(":{round}\r\n");
        let replies = decode_all(input.as_bytes(), &mut handler, usize::MAX);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].as_int().unwrap(), round);
    }
}

#[test]
fn reset_discards_partial_state() {
    let mut handler = ResponseHandler::new();
    let partial = b"*2\r\n$3\r\nfo";
    let span = handler.buffer();
    span[..partial.len()].copy_from_slice(partial);
    assert!(!handler.data_received(partial.len()).unwrap());
    handler.reset();
    let replies = decode_all(b"+OK\r\n", &mut handler, usize::MAX);
    assert_eq!(replies, vec![simple("OK")]);
}

#[test]
fn unexpected_type_symbol() {
    let mut handler = ResponseHandler::new();
    let input = b"!boom\r\n";
    let span = handler.buffer();
    span[..input.len()].copy_from_slice(input);
    assert_eq!(
        handler.data_received(input.len()).unwrap_err(),
        ParseError::UnexpectedByte
    );
}

#[test]
fn malformed_length() {
    let mut handler = ResponseHandler::new();
    let input = b"$12x\r\n";
    let span = handler.buffer();
    span[..input.len()].copy_from_slice(input);
    assert_eq!(
        handler.data_received(input.len()).unwrap_err(),
        ParseError::DatatypeParseFailure
    );
}

#[test]
fn bulk_without_crlf_terminator() {
    let mut handler = ResponseHandler::new();
    let input = b"$3\r\nfooXY";
    let span = handler.buffer();
    span[..input.len()].copy_from_slice(input);
    assert_eq!(
        handler.data_received(input.len()).unwrap_err(),
        ParseError::BadPacket
    );
}

#[test]
fn empty_line_is_rejected() {
    let mut handler = ResponseHandler::new();
    let input = b"\r\n";
    let span = handler.buffer();
    span[..input.len()].copy_from_slice(input);
    assert_eq!(
        handler.data_received(input.len()).unwrap_err(),
        ParseError::UnexpectedByte
    );
}

#[test]
fn dump_rendering() {
    let tree = Response::Array(vec![
        Response::Array(vec![integer("1"), integer("2"), integer("3")]),
        Response::Array(vec![simple("Foo"), error("Bar")]),
    ]);
    assert_eq!(
        tree.to_string(),
        "[2: [3: Integer:\"1\",Integer:\"2\",Integer:\"3\",],[2: Simple:\"Foo\",Error:\"Bar\",],]"
    );
    assert_eq!(bulk("hey").to_string(), "Bulkstring:\"hey\"");
    assert_eq!(Response::Null.to_string(), "Null");
}

#[test]
fn asint_refuses_non_integers() {
    assert!(simple("OK").as_int().is_err());
    assert!(Response::Null.as_int().is_err());
    assert_eq!(bulk("42").as_int().unwrap(), 42);
}

#[test]
#[should_panic]
fn indexing_a_scalar_panics() {
    let _ = &simple("OK")[0];
}

#[test]
fn index_into_array() {
    let tree = Response::Array(vec![bulk("a"), bulk("b")]);
    assert_eq!(tree[1], bulk("b"));
    assert!(tree.get(2).is_none());
}

#[test]
fn decimal_parse() {
    assert_eq!(parse_decimal(b"12345678").unwrap(), 12345678);
    assert_eq!(parse_decimal(b"-1").unwrap(), -1);
    assert_eq!(parse_decimal(b"0").unwrap(), 0);
}

#[test]
fn decimal_parse_fail() {
    assert_eq!(
        parse_decimal(b"12345678ab").unwrap_err(),
        ParseError::DatatypeParseFailure
    );
    assert_eq!(parse_decimal(b"").unwrap_err(), ParseError::DatatypeParseFailure);
    assert_eq!(parse_decimal(b"-").unwrap_err(), ParseError::DatatypeParseFailure);
    assert_eq!(
        parse_decimal(b"99999999999999999999").unwrap_err(),
        ParseError::DatatypeParseFailure
    );
}
