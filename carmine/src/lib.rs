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

//! # Carmine
//!
//! Carmine is a client library for Redis-compatible servers. The pieces it is built from, in
//! dependency order: the wire codec ([`query::Request`], [`query::Pipeline`]), the typed reply
//! tree ([`protocol::element::Response`]), the streaming reply decoder
//! ([`protocol::handler::ResponseHandler`]) which accepts arbitrarily chunked reads, the
//! transports ([`transport::SingleHost`], [`transport::MultiHost`], [`transport::Sentinel`])
//! which only differ in how they pick an endpoint, the conversation layer
//! ([`connection::Connection`] and its async twin in [`connection::aio`]), and the per-command
//! bindings in [`commands`].
//!
//! A connection pinned to a logical database reissues SELECT on every fresh socket, so
//! failover and reconnects never change which database a caller talks to. Progress events
//! (reconnects, sentinel rotations, buffer growth) go to the [`log`] facade; install whatever
//! logger should receive them.

// modules
pub mod commands;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod query;
pub mod transport;
// endof modules

pub use {
    connection::{Connection, PipelineResult},
    error::{ClientResult, Error},
    protocol::{element::Response, handler::ResponseHandler},
    query::{Pipeline, Request},
    transport::{AsyncTransport, Host, HostContainer, MultiHost, Sentinel, SingleHost, Transport},
};
