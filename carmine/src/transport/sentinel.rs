/*
 * Created on Tue Mar 15 2022
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
    super::{AsyncTransport, HostContainer, MultiHost, SingleHost, Transport},
    crate::{
        commands,
        connection::{aio, Connection},
        error::{ClientResult, Error},
    },
    core::time::Duration,
    std::{net::TcpStream, thread, time::Instant},
    tokio::net::TcpStream as AsyncStream,
};

/// # Sentinel-coordinated master discovery
///
/// Connects to whichever node currently holds the master role for a named replication set, as
/// reported by a sentinel deployment. One discovery round asks a reachable sentinel for the
/// master address, refreshes the shared sentinel list (the answering sentinel first, then
/// every peer it reports), and confirms against the advertised master itself that it agrees
/// with the role before handing its socket out. A node that answers but disagrees - mid
/// failover, say - costs a one second pause and a rotation of the candidate list, and the
/// round starts over.
///
/// Discovery gives up once it has burned one attempt per known sentinel or its wall-clock
/// budget (60 s unless configured otherwise), whichever comes first.
pub struct Sentinel {
    hosts: HostContainer,
    master_set: String,
    timeout: Duration,
}

impl Sentinel {
    /// Default wall-clock budget for one discovery
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    /// Fixed pause between discovery attempts
    const RETRY_PAUSE: Duration = Duration::from_secs(1);

    pub fn new(hosts: HostContainer, master_set: impl Into<String>) -> Self {
        Self {
            hosts,
            master_set: master_set.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    /// The shared sentinel list this transport reads from and persists refreshes into
    pub fn hosts(&self) -> &HostContainer {
        &self.hosts
    }
    pub fn master_set(&self) -> &str {
        &self.master_set
    }

    /// Rebuild the shared sentinel list from one sentinel's answer: the sentinel that
    /// answered leads, the peers it reported follow
    fn refresh_hosts(
        &self,
        answering: super::Host,
        peers: &commands::sentinel::SentinelProperties,
    ) {
        let mut refreshed = Vec::with_capacity(peers.len() + 1);
        refreshed.push(answering);
        for properties in peers {
            if let (Some(ip), Some(port)) = (properties.get("ip"), properties.get("port")) {
                if let Ok(port) = port.parse::<u16>() {
                    refreshed.push((ip.clone(), port));
                }
            }
        }
        log::debug!("sentinel list refreshed, {} candidates known", refreshed.len());
        self.hosts.set(refreshed);
    }

    /// One blocking discovery round. Soft failures are logged and reported as `None` so the
    /// caller can rotate and retry
    fn try_discover(&self, sentinels: &mut Connection<MultiHost>) -> Option<TcpStream> {
        let (master_host, master_port) =
            match commands::sentinel::get_master_addr_by_name(sentinels, self.master_set.as_str())
            {
                Ok(addr) => addr,
                Err(e) => {
                    log::debug!("sentinel master inquiry failed: {e}");
                    return None;
                }
            };
        if let Some(endpoint) = sentinels.remote_endpoint() {
            match commands::sentinel::sentinels(sentinels, self.master_set.as_str()) {
                Ok(peers) => self.refresh_hosts(endpoint, &peers),
                Err(e) => log::debug!("sentinel list refresh failed: {e}"),
            }
        }
        // never trust the advertisement alone: the master must agree with its role
        let mut master = Connection::new(SingleHost::new(master_host.clone(), master_port));
        match commands::role(&mut master) {
            Ok(role) if role == "master" => {
                log::debug!("using master {master_host}:{master_port}");
                master.into_stream()
            }
            Ok(role) => {
                log::warn!("advertised master {master_host}:{master_port} reports role '{role}'");
                None
            }
            Err(e) => {
                log::warn!("role check against {master_host}:{master_port} failed: {e}");
                None
            }
        }
    }

    /// One async discovery round
    async fn try_discover_async(
        &self,
        sentinels: &mut aio::Connection<MultiHost>,
    ) -> Option<AsyncStream> {
        let (master_host, master_port) = match commands::sentinel::async_get_master_addr_by_name(
            sentinels,
            self.master_set.as_str(),
        )
        .await
        {
            Ok(addr) => addr,
            Err(e) => {
                log::debug!("sentinel master inquiry failed: {e}");
                return None;
            }
        };
        if let Some(endpoint) = sentinels.remote_endpoint() {
            match commands::sentinel::async_sentinels(sentinels, self.master_set.as_str()).await {
                Ok(peers) => self.refresh_hosts(endpoint, &peers),
                Err(e) => log::debug!("sentinel list refresh failed: {e}"),
            }
        }
        let mut master = aio::Connection::new(SingleHost::new(master_host.clone(), master_port));
        match commands::async_role(&mut master).await {
            Ok(role) if role == "master" => {
                log::debug!("using master {master_host}:{master_port}");
                master.into_stream()
            }
            Ok(role) => {
                log::warn!("advertised master {master_host}:{master_port} reports role '{role}'");
                None
            }
            Err(e) => {
                log::warn!("role check against {master_host}:{master_port} failed: {e}");
                None
            }
        }
    }
}

impl Transport for Sentinel {
    fn connect(&mut self) -> ClientResult<TcpStream> {
        let snapshot = self.hosts.get();
        let attempts = snapshot.len();
        let mut sentinels = Connection::new(MultiHost::new(snapshot));
        let started = Instant::now();
        for attempt in 0..attempts {
            if started.elapsed() > self.timeout {
                log::warn!("no usable master found within {:?}", self.timeout);
                break;
            }
            if let Some(stream) = self.try_discover(&mut sentinels) {
                return Ok(stream);
            }
            if attempt + 1 < attempts {
                // drop the socket to the sentinel that just failed us, or the next attempt
                // would reuse it and never reach the rotated candidate
                sentinels.close();
                thread::sleep(Self::RETRY_PAUSE);
                sentinels.transport_mut().shift_hosts();
                log::debug!("rotated sentinel list after failed attempt {}", attempt + 1);
            }
        }
        Err(Error::NoMoreSentinels)
    }
}

impl AsyncTransport for Sentinel {
    async fn connect(&mut self) -> ClientResult<AsyncStream> {
        let snapshot = self.hosts.get();
        let attempts = snapshot.len();
        let mut sentinels = aio::Connection::new(MultiHost::new(snapshot));
        let started = Instant::now();
        for attempt in 0..attempts {
            if started.elapsed() > self.timeout {
                log::warn!("no usable master found within {:?}", self.timeout);
                break;
            }
            if let Some(stream) = self.try_discover_async(&mut sentinels).await {
                return Ok(stream);
            }
            if attempt + 1 < attempts {
                // drop the socket to the sentinel that just failed us, or the next attempt
                // would reuse it and never reach the rotated candidate
                sentinels.close();
                tokio::time::sleep(Self::RETRY_PAUSE).await;
                sentinels.transport_mut().shift_hosts();
                log::debug!("rotated sentinel list after failed attempt {}", attempt + 1);
            }
        }
        Err(Error::NoMoreSentinels)
    }
}
