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

use {
    super::{AsyncTransport, Host, SingleHost, Transport},
    crate::error::{ClientResult, Error},
    parking_lot::RwLock,
    std::{net::TcpStream, sync::Arc},
    tokio::net::TcpStream as AsyncStream,
};

#[derive(Clone, Default)]
/// A thread-safe, shared host list. Readers snapshot it; writers replace it atomically. The
/// sentinel transport persists refreshed sentinel sets through this so that every party that
/// holds a clone starts its next discovery from the newest list
pub struct HostContainer {
    hosts: Arc<RwLock<Vec<Host>>>,
}

impl HostContainer {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self {
            hosts: Arc::new(RwLock::new(hosts)),
        }
    }
    /// Snapshot the current list
    pub fn get(&self) -> Vec<Host> {
        self.hosts.read().clone()
    }
    /// Replace the list
    pub fn set(&self, hosts: Vec<Host>) {
        *self.hosts.write() = hosts;
    }
}

/// # An ordered-fallback transport
///
/// Walks its host list on every connect and returns the first socket that comes up; when the
/// whole list fails the result is [`Error::NoUsableServer`]. [`Self::shift_hosts`] rotates the
/// list so that callers which found the head answering-but-unsuitable (a node that disagrees
/// with its advertised role, say) stop fixating on it
pub struct MultiHost {
    hosts: Vec<Host>,
}

impl MultiHost {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self { hosts }
    }
    /// Move the tried-first host to the end of the list
    pub fn shift_hosts(&mut self) {
        if self.hosts.len() > 1 {
            self.hosts.rotate_left(1);
        }
    }
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }
}

impl Transport for MultiHost {
    fn connect(&mut self) -> ClientResult<TcpStream> {
        for host in &self.hosts {
            match Transport::connect(&mut SingleHost::from_host(host)) {
                Ok(stream) => {
                    log::trace!("connected to host {}:{}", host.0, host.1);
                    return Ok(stream);
                }
                Err(e) => {
                    log::trace!("unable to connect to host {}:{} ({e})", host.0, host.1);
                }
            }
        }
        log::trace!("unable to establish any connection");
        Err(Error::NoUsableServer)
    }
}

impl AsyncTransport for MultiHost {
    async fn connect(&mut self) -> ClientResult<AsyncStream> {
        for host in &self.hosts {
            match AsyncTransport::connect(&mut SingleHost::from_host(host)).await {
                Ok(stream) => {
                    log::trace!("connected to host {}:{}", host.0, host.1);
                    return Ok(stream);
                }
                Err(e) => {
                    log::trace!("unable to connect to host {}:{} ({e})", host.0, host.1);
                }
            }
        }
        log::trace!("unable to establish any connection");
        Err(Error::NoUsableServer)
    }
}
