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

//! # Async connections
//!
//! The cooperative twin of [`super::Connection`]: the same conversation state machine
//! (connect if needed, select the database on fresh sockets, one vectored send, reads until
//! the reply tree completes) expressed over the tokio runtime. The suspension points are name
//! resolution, connect, each send and each receive; the encoder and the reply decoder never
//! suspend

use {
    super::PipelineResult,
    crate::{
        error::{ClientResult, Error},
        protocol::{element::Response, handler::ResponseHandler},
        query::{Pipeline, Request},
        transport::{AsyncPreconnected, AsyncTransport, Host},
    },
    core::future::Future,
    std::{io, io::IoSlice, pin::Pin},
    tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
    },
};

/// # An async connection
///
/// Not a shared handle: like its blocking twin, an async connection is one conversation and
/// must not be used by simultaneous callers. Cancelling a call that is mid-I/O leaves the
/// socket in an unknown protocol state; drop the connection (or [`Self::close`] it) afterwards
pub struct Connection<T> {
    transport: T,
    stream: Option<TcpStream>,
    index: i64,
    last_server_error: Option<String>,
}

impl<T: AsyncTransport> Connection<T> {
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

    /// Send one request and read its complete reply; the async form of
    /// [`super::Connection::transmit`], with the same single-retry rule for writes that
    /// failed before any request byte left the process
    pub async fn transmit(&mut self, request: &mut Request) -> ClientResult<Response> {
        let sequence = request.buffer_sequence();
        self.write_sequence(&sequence).await?;
        let mut handler = ResponseHandler::new();
        self.read_reply(&mut handler).await
    }

    /// Send a batch in one transmission and collect one reply per request, in order
    pub async fn transmit_pipeline(
        &mut self,
        pipeline: &mut Pipeline,
    ) -> ClientResult<PipelineResult> {
        let expected = pipeline.request_count();
        let sequence = pipeline.buffer_sequence();
        self.write_sequence(&sequence).await?;
        let mut handler = ResponseHandler::new();
        let mut responses = Vec::with_capacity(expected);
        while responses.len() < expected {
            loop {
                let bytes_read = match self.read_some(&mut handler).await {
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

    pub fn close(&mut self) {
        self.stream = None;
    }
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
    pub fn into_stream(self) -> Option<TcpStream> {
        self.stream
    }
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
    pub fn last_server_error(&self) -> Option<&str> {
        self.last_server_error.as_deref()
    }
    pub(crate) fn set_last_server_error(&mut self, message: String) {
        self.last_server_error = Some(message);
    }

    async fn ensure_open(&mut self) -> ClientResult<&mut TcpStream> {
        if self.stream.is_none() {
            let stream = self.transport.connect().await?;
            let stream = if self.index != 0 {
                log::debug!("fresh socket, reselecting database {}", self.index);
                select_database(stream, self.index).await?
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

    async fn write_sequence(&mut self, sequence: &[&[u8]]) -> ClientResult<()> {
        let mut retried = false;
        loop {
            let stream = self.ensure_open().await?;
            match write_all_vectored(stream, sequence).await {
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

    async fn read_some(&mut self, handler: &mut ResponseHandler) -> ClientResult<usize> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream.read(handler.buffer()).await?),
            None => Err(Error::Io(io::Error::from(io::ErrorKind::NotConnected))),
        }
    }

    async fn read_reply(&mut self, handler: &mut ResponseHandler) -> ClientResult<Response> {
        loop {
            let bytes_read = match self.read_some(handler).await {
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

/// Run SELECT over a freshly connected socket before the owning connection adopts it.
///
/// Boxed: the select travels through a `Connection<AsyncPreconnected>` whose `ensure_open`
/// would otherwise nest this future inside itself without bound
fn select_database(
    stream: TcpStream,
    index: i64,
) -> Pin<Box<dyn Future<Output = ClientResult<TcpStream>> + Send>> {
    Box::pin(async move {
        let mut connection = Connection::new(AsyncPreconnected(Some(stream)));
        crate::commands::async_select(&mut connection, index).await?;
        match connection.into_stream() {
            Some(stream) => Ok(stream),
            None => Err(Error::Io(io::Error::from(io::ErrorKind::NotConnected))),
        }
    })
}

/// Async counterpart of [`super::write_all_vectored`]
async fn write_all_vectored(stream: &mut TcpStream, parts: &[&[u8]]) -> io::Result<()> {
    let total: usize = parts.iter().map(|part| part.len()).sum();
    let mut written = 0usize;
    let mut first = 0usize;
    let mut partial = 0usize;
    while written < total {
        let mut spans = Vec::with_capacity(parts.len() - first);
        spans.push(IoSlice::new(&parts[first][partial..]));
        for part in &parts[first + 1..] {
            spans.push(IoSlice::new(part));
        }
        let mut advanced = stream.write_vectored(&spans).await?;
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
