/*
 * Created on Thu Mar 10 2022
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
    super::Connection,
    crate::{
        commands,
        error::Error,
        query::{Pipeline, Request},
        transport::{MultiHost, SingleHost},
    },
    std::{
        io::{Read, Write},
        net::{TcpListener, TcpStream},
        thread::{self, JoinHandle},
    },
};

fn expect_exact(stream: &mut TcpStream, expected: &[u8]) {
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).unwrap();
    assert_eq!(buf, expected, "server saw unexpected request bytes");
}

/// Bind a listener and hand its port plus the serving thread back
fn spawn_server(
    script: impl FnOnce(TcpListener) + Send + 'static,
) -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || script(listener));
    (port, handle)
}

/// A localhost port nothing listens on
fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn transmit_roundtrip() {
    let (port, server) = spawn_server(|listener| {
        let (mut stream, _) = listener.accept().unwrap();
        expect_exact(&mut stream, b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n");
        stream.write_all(b"$3\r\nbar\r\n").unwrap();
    });
    let mut con = Connection::new(SingleHost::new("127.0.0.1", port));
    let value = commands::get(&mut con, "foo").unwrap();
    assert_eq!(value.unwrap().as_ref(), b"bar");
    assert!(con.is_open());
    server.join().unwrap();
}

#[test]
fn server_error_is_promoted_and_recorded() {
    let (port, server) = spawn_server(|listener| {
        let (mut stream, _) = listener.accept().unwrap();
        let mut scratch = [0u8; 512];
        let _ = stream.read(&mut scratch).unwrap();
        stream
            .write_all(b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n")
            .unwrap();
    });
    let mut con = Connection::new(SingleHost::new("127.0.0.1", port));
    let err = commands::incr(&mut con, "not-a-number").unwrap_err();
    assert!(matches!(err, Error::Server(_)));
    assert_eq!(
        con.last_server_error(),
        Some("WRONGTYPE Operation against a key holding the wrong kind of value")
    );
    // the socket stays usable after a server error
    assert!(con.is_open());
    server.join().unwrap();
}

#[test]
fn select_runs_before_anything_else_on_a_fresh_socket() {
    let (port, server) = spawn_server(|listener| {
        let (mut stream, _) = listener.accept().unwrap();
        expect_exact(&mut stream, b"*2\r\n$6\r\nSELECT\r\n$1\r\n7\r\n");
        stream.write_all(b"+OK\r\n").unwrap();
        expect_exact(&mut stream, b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n");
        stream.write_all(b"$1\r\nv\r\n").unwrap();
    });
    let mut con = Connection::with_index(SingleHost::new("127.0.0.1", port), 7);
    let value = commands::get(&mut con, "k").unwrap();
    assert_eq!(value.unwrap().as_ref(), b"v");
    server.join().unwrap();
}

#[test]
fn reconnect_reissues_select() {
    let (port, server) = spawn_server(|listener| {
        // first conversation, then the server drops the connection
        let (mut stream, _) = listener.accept().unwrap();
        expect_exact(&mut stream, b"*2\r\n$6\r\nSELECT\r\n$1\r\n5\r\n");
        stream.write_all(b"+OK\r\n").unwrap();
        expect_exact(&mut stream, b"*2\r\n$3\r\nGET\r\n$1\r\na\r\n");
        stream.write_all(b"$1\r\nx\r\n").unwrap();
        drop(stream);
        // the reconnect must lead with SELECT again
        let (mut stream, _) = listener.accept().unwrap();
        expect_exact(&mut stream, b"*2\r\n$6\r\nSELECT\r\n$1\r\n5\r\n");
        stream.write_all(b"+OK\r\n").unwrap();
        expect_exact(&mut stream, b"*2\r\n$3\r\nGET\r\n$1\r\na\r\n");
        stream.write_all(b"$1\r\ny\r\n").unwrap();
    });
    let mut con = Connection::with_index(SingleHost::new("127.0.0.1", port), 5);
    let first = commands::get(&mut con, "a").unwrap();
    assert_eq!(first.unwrap().as_ref(), b"x");
    // depending on how fast the close is noticed, the next call either fails (bytes were
    // written before the breakage surfaced) or already lands on the fresh socket
    let value = match commands::get(&mut con, "a") {
        Ok(value) => value,
        Err(_) => commands::get(&mut con, "a").unwrap(),
    };
    assert_eq!(value.unwrap().as_ref(), b"y");
    server.join().unwrap();
}

#[test]
fn select_failure_surfaces_and_leaves_the_connection_closed() {
    let (port, server) = spawn_server(|listener| {
        let (mut stream, _) = listener.accept().unwrap();
        expect_exact(&mut stream, b"*2\r\n$6\r\nSELECT\r\n$2\r\n99\r\n");
        stream.write_all(b"-ERR DB index is out of range\r\n").unwrap();
    });
    let mut con = Connection::with_index(SingleHost::new("127.0.0.1", port), 99);
    let err = commands::ping(&mut con).unwrap_err();
    assert!(matches!(err, Error::Server(_)));
    assert!(!con.is_open());
    server.join().unwrap();
}

#[test]
fn pipeline_roundtrip_with_batched_reply() {
    let (port, server) = spawn_server(|listener| {
        let (mut stream, _) = listener.accept().unwrap();
        expect_exact(
            &mut stream,
            b"*1\r\n$4\r\nPING\r\n*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n",
        );
        // all three replies leave in one burst
        stream.write_all(b"+PONG\r\n+OK\r\n$1\r\nv\r\n").unwrap();
    });
    let mut con = Connection::new(SingleHost::new("127.0.0.1", port));
    let mut pipeline = Pipeline::new();
    let mut set = Request::new("SET");
    set.arg("k").arg("v");
    let mut get = Request::new("GET");
    get.arg("k");
    pipeline.push(Request::new("PING")).push(set).push(get);
    let result = con.transmit_pipeline(&mut pipeline).unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].data(), b"PONG");
    assert_eq!(result[1].data(), b"OK");
    assert_eq!(result[2].data(), b"v");
    server.join().unwrap();
}

#[test]
fn pipeline_cut_short_reports_incomplete_response() {
    let (port, server) = spawn_server(|listener| {
        let (mut stream, _) = listener.accept().unwrap();
        let mut scratch = [0u8; 512];
        let _ = stream.read(&mut scratch).unwrap();
        // only one of the two expected replies, then the connection dies
        stream.write_all(b"+PONG\r\n").unwrap();
    });
    let mut con = Connection::new(SingleHost::new("127.0.0.1", port));
    let mut pipeline = Pipeline::new();
    pipeline.push(Request::new("PING")).push(Request::new("PING"));
    let err = con.transmit_pipeline(&mut pipeline).unwrap_err();
    assert!(matches!(err, Error::IncompleteResponse));
    assert!(!con.is_open());
    server.join().unwrap();
}

#[test]
fn multi_host_falls_back_to_the_next_candidate() {
    let (port, server) = spawn_server(|listener| {
        let (mut stream, _) = listener.accept().unwrap();
        expect_exact(&mut stream, b"*1\r\n$4\r\nPING\r\n");
        stream.write_all(b"+PONG\r\n").unwrap();
    });
    let hosts = vec![
        ("127.0.0.1".to_owned(), dead_port()),
        ("127.0.0.1".to_owned(), port),
    ];
    let mut con = Connection::new(MultiHost::new(hosts));
    commands::ping(&mut con).unwrap();
    server.join().unwrap();
}

#[test]
fn multi_host_exhaustion_reports_no_usable_server() {
    let hosts = vec![
        ("127.0.0.1".to_owned(), dead_port()),
        ("127.0.0.1".to_owned(), dead_port()),
    ];
    let mut con = Connection::new(MultiHost::new(hosts));
    let err = commands::ping(&mut con).unwrap_err();
    assert!(matches!(err, Error::NoUsableServer));
}

#[test]
fn remote_endpoint_reports_the_peer() {
    let (port, server) = spawn_server(|listener| {
        let (mut stream, _) = listener.accept().unwrap();
        expect_exact(&mut stream, b"*1\r\n$4\r\nPING\r\n");
        stream.write_all(b"+PONG\r\n").unwrap();
    });
    let mut con = Connection::new(SingleHost::new("127.0.0.1", port));
    assert!(con.remote_endpoint().is_none());
    commands::ping(&mut con).unwrap();
    assert_eq!(con.remote_endpoint(), Some(("127.0.0.1".to_owned(), port)));
    server.join().unwrap();
}
