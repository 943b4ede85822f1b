/*
 * Created on Mon Mar 07 2022
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

//! # Transports
//!
//! A transport is a reusable factory for connected sockets; the three provided transports
//! differ only in how they pick the endpoint. [`SingleHost`] resolves one name and connects to
//! it; [`MultiHost`] walks an ordered host list and takes the first success; [`Sentinel`] asks
//! a sentinel deployment which node currently holds the master role for a named replication
//! set, and hands back a socket to that master.
//!
//! Every transport exists in a blocking form ([`Transport`], over [`std::net::TcpStream`]) and
//! an async form ([`AsyncTransport`], over [`tokio::net::TcpStream`]).

// modules
pub mod multi;
pub mod sentinel;
// endof modules

use {
    crate::error::{ClientResult, Error},
    core::future::Future,
    std::{io, net::TcpStream},
    tokio::net::TcpStream as AsyncStream,
};

pub use {
    multi::{HostContainer, MultiHost},
    sentinel::Sentinel,
};

/// An endpoint as (hostname, port)
pub type Host = (String, u16);

/// A factory for connected blocking sockets
pub trait Transport {
    /// Establish a fresh connection to whatever endpoint this transport selects
    fn connect(&mut self) -> ClientResult<TcpStream>;
}

/// A factory for connected async sockets
pub trait AsyncTransport {
    /// Establish a fresh connection to whatever endpoint this transport selects
    fn connect(&mut self) -> impl Future<Output = ClientResult<AsyncStream>> + Send;
}

/// # A fixed single-server transport
///
/// Resolves `(host, port)` on every connect and forwards any resolution or connect error
/// verbatim
pub struct SingleHost {
    host: String,
    port: u16,
}

impl SingleHost {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
    pub(crate) fn from_host(host: &Host) -> Self {
        Self::new(host.0.clone(), host.1)
    }
}

impl Default for SingleHost {
    fn default() -> Self {
        Self::new("localhost", 6379)
    }
}

impl Transport for SingleHost {
    fn connect(&mut self) -> ClientResult<TcpStream> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        Ok(stream)
    }
}

impl AsyncTransport for SingleHost {
    async fn connect(&mut self) -> ClientResult<AsyncStream> {
        let stream = AsyncStream::connect((self.host.as_str(), self.port)).await?;
        Ok(stream)
    }
}

/// A transport around a socket that somebody else already connected. It hands the socket out
/// exactly once; the connection layer uses this to run SELECT over a fresh socket through the
/// ordinary command path before adopting it
pub(crate) struct Preconnected(pub(crate) Option<TcpStream>);

impl Transport for Preconnected {
    fn connect(&mut self) -> ClientResult<TcpStream> {
        match self.0.take() {
            Some(stream) => Ok(stream),
            None => Err(Error::Io(io::Error::from(io::ErrorKind::NotConnected))),
        }
    }
}

pub(crate) struct AsyncPreconnected(pub(crate) Option<AsyncStream>);

impl AsyncTransport for AsyncPreconnected {
    async fn connect(&mut self) -> ClientResult<AsyncStream> {
        match self.0.take() {
            Some(stream) => Ok(stream),
            None => Err(Error::Io(io::Error::from(io::ErrorKind::NotConnected))),
        }
    }
}
