/*
 * Created on Wed Mar 09 2022
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

//! # Connections
//!
//! A [`Connection`] owns (at most) one socket obtained from its transport and drives complete
//! request/reply conversations over it: it writes a request's scatter sequence in one vectored
//! call, then feeds reads into a [`ResponseHandler`] until the reply tree is complete. A
//! connection is a single-threaded conversation; it is never shared between simultaneous
//! callers, and replies come back in request order because the protocol itself guarantees that
//! on a healthy socket.
//!
//! A connection can be pinned to a logical database. Whenever a fresh socket is acquired (the
//! first connect, or any reconnect) the database is re-selected before the caller gets to use
//! the socket, so a failover never silently lands a caller in database 0.
//!
//! The async twin of everything here lives in [`aio`].

// modules
pub mod aio;
// endof modules
#[cfg(test)]
mod tests;

use {
    crate::{
        error::{ClientResult, Error},
        protocol::{element::Response, handler::ResponseHandler},
        query::{Pipeline, Request},
        transport::{Host, Preconnected, Transport},
    },
    core::ops,
    std::{
        io::{self, IoSlice, Read, Write},
        net::TcpStream,
    },
};

/// The replies of a transmitted [`Pipeline`], in submission order
#[derive(Debug)]
pub struct PipelineResult {
    responses: Vec<Response>,
}

impl PipelineResult {
    pub fn len(&self) -> usize {
        self.responses.len()
    }
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
    pub fn get(&self, position: usize) -> Option<&Response> {
        self.responses.get(position)
    }
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }
    pub fn into_responses(self) -> Vec<Response> {
        self.responses
    }
}

impl ops::Index<usize> for PipelineResult {
    type Output = Response;
    fn index(&self, position: usize) -> &Self::Output {
        &self.responses[position]
    }
}

/// # A blocking connection
///
/// Generic over the [`Transport`] that supplies sockets, so the same conversation logic serves
/// a fixed host, an ordered fallback list, or sentinel-coordinated master discovery
pub struct Connection<T> {
    transport: T,
    stream: Option<TcpStream>,
    /// logical database to (re)select on every fresh socket; 0 selects nothing
    index: i64,
    last_server_error: Option<String>,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T) -> Self {
        Self::with_index(transport, 0)
    }
    /// A connection pinned to a logical database
    pub fn with_index(transport: T, index: i64) -> Self {
        Self {
            transport,
            stream: None,
            index,
            last_server_error: None,
        }
    }

    /// Send one request and read its complete reply.
    ///
    /// If the write fails, the socket is closed and the whole exchange is retried once over a
    /// fresh socket: the request bytes never left the process on the failed attempt. Failures
    /// after the write succeeded are surfaced as they are, since the server may already be
    /// acting on the command
    pub fn transmit(&mut self, request: &mut Request) -> ClientResult<Response> {
        let sequence = request.buffer_sequence();
        self.write_sequence(&sequence)?;
        let mut handler = ResponseHandler::new();
        self.read_reply(&mut handler)
    }

    /// Send a batch of requests in one transmission and collect one reply per request, in
    /// submission order. A reply stream that ends early reports
    /// [`Error::IncompleteResponse`]
    pub fn transmit_pipeline(&mut self, pipeline: &mut Pipeline) -> ClientResult<PipelineResult> {
        let expected = pipeline.request_count();
        let sequence = pipeline.buffer_sequence();
        self.write_sequence(&sequence)?;
        let mut handler = ResponseHandler::new();
        let mut responses = Vec::with_capacity(expected);
        while responses.len() < expected {
            // pull bytes until the next reply completes
            loop {
                let bytes_read = match self.read_some(&mut handler) {
                    Ok(0) => {
                        self.close();
                        return Err(Error::IncompleteResponse);
                    }
                    Ok(n) => n,
                    Err(e) => {
                        self.close();
                        return Err(e);
                    }
                };
                match handler.data_received(bytes_read) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => {
                        log::debug!("protocol error in reply stream: {e}");
                        self.close();
                        return Err(e.into());
                    }
                }
            }
            // one large read may have completed several replies; drain them all
            loop {
                if let Some(top) = handler.take_top() {
                    responses.push(top);
                }
                if responses.len() == expected {
                    break;
                }
                match handler.commit(true) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        self.close();
                        return Err(e.into());
                    }
                }
            }
        }
        Ok(PipelineResult { responses })
    }

    /// Drop the socket, if any. The next transmission acquires a fresh one from the transport
    pub fn close(&mut self) {
        self.stream = None;
    }
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
    /// Give up the underlying socket, consuming the connection
    pub fn into_stream(self) -> Option<TcpStream> {
        self.stream
    }
    /// The peer this connection currently talks to
    pub fn remote_endpoint(&self) -> Option<Host> {
        self.stream
            .as_ref()
            .and_then(|stream| stream.peer_addr().ok())
            .map(|addr| (addr.ip().to_string(), addr.port()))
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
    pub fn index(&self) -> i64 {
        self.index
    }
    /// The textual message of the last error reply this connection saw
    pub fn last_server_error(&self) -> Option<&str> {
        self.last_server_error.as_deref()
    }
    pub(crate) fn set_last_server_error(&mut self, message: String) {
        self.last_server_error = Some(message);
    }

    /// Make sure a socket exists, acquiring one from the transport (and re-selecting the
    /// logical database) if needed
    fn ensure_open(&mut self) -> ClientResult<&mut TcpStream> {
        if self.stream.is_none() {
            let stream = self.transport.connect()?;
            let stream = if self.index != 0 {
                log::debug!("fresh socket, reselecting database {}", self.index);
                // a SELECT failure leaves the connection closed
                select_database(stream, self.index)?
            } else {
                stream
            };
            self.stream = Some(stream);
        }
        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => Err(Error::Io(io::Error::from(io::ErrorKind::NotConnected))),
        }
    }

    fn write_sequence(&mut self, sequence: &[&[u8]]) -> ClientResult<()> {
        let mut retried = false;
        loop {
            let stream = self.ensure_open()?;
            match write_all_vectored(stream, sequence) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    self.close();
                    if retried {
                        return Err(e.into());
                    }
                    log::debug!("write failed ({e}), retrying over a fresh socket");
                    retried = true;
                }
            }
        }
    }

    fn read_some(&mut self, handler: &mut ResponseHandler) -> ClientResult<usize> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream.read(handler.buffer())?),
            None => Err(Error::Io(io::Error::from(io::ErrorKind::NotConnected))),
        }
    }

    fn read_reply(&mut self, handler: &mut ResponseHandler) -> ClientResult<Response> {
        loop {
            let bytes_read = match self.read_some(handler) {
                Ok(0) => {
                    self.close();
                    return Err(Error::Io(io::Error::from(io::ErrorKind::UnexpectedEof)));
                }
                Ok(n) => n,
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            };
            match handler.data_received(bytes_read) {
                Ok(true) => {
                    if let Some(top) = handler.take_top() {
                        return Ok(top);
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    log::debug!("protocol error in reply stream: {e}");
                    self.close();
                    return Err(e.into());
                }
            }
        }
    }
}

/// Run SELECT over a freshly connected socket through the ordinary command path, handing the
/// socket back once the database is active
fn select_database(stream: TcpStream, index: i64) -> ClientResult<TcpStream> {
    let mut connection = Connection::new(Preconnected(Some(stream)));
    crate::commands::select(&mut connection, index)?;
    match connection.into_stream() {
        Some(stream) => Ok(stream),
        None => Err(Error::Io(io::Error::from(io::ErrorKind::NotConnected))),
    }
}

/// Write every span of `parts` with as few vectored calls as the OS allows, resuming cleanly
/// after short writes
pub(crate) fn write_all_vectored(stream: &mut TcpStream, parts: &[&[u8]]) -> io::Result<()> {
    let total: usize = parts.iter().map(|part| part.len()).sum();
    let mut written = 0usize;
    // index of the first span with unwritten bytes, and how far into it we are
    let mut first = 0usize;
    let mut partial = 0usize;
    while written < total {
        let mut spans = Vec::with_capacity(parts.len() - first);
        spans.push(IoSlice::new(&parts[first][partial..]));
        for part in &parts[first + 1..] {
            spans.push(IoSlice::new(part));
        }
        let mut advanced = stream.write_vectored(&spans)?;
        if advanced == 0 {
            return Err(io::Error::from(io::ErrorKind::WriteZero));
        }
        written += advanced;
        while first < parts.len() {
            let remaining = parts[first].len() - partial;
            if advanced < remaining {
                partial += advanced;
                break;
            }
            advanced -= remaining;
            first += 1;
            partial = 0;
        }
    }
    Ok(())
}
