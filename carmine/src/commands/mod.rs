/*
 * Created on Fri Mar 11 2022
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

//! # Command bindings
//!
//! Every command is a pair of plain functions: a `*_request` prepare function that builds the
//! [`Request`], and a result function that turns the reply tree into a typed value. The
//! universal wrappers glue a pair to a connection: they transmit, promote an error reply into
//! [`Error::Server`] (recording the server's message on the connection), and only then apply
//! the result function. Adding a command means adding one prepare/result pair and two thin
//! wrappers; nothing else in the client has to know about it.

// modules
pub mod hash;
pub mod sentinel;

use {
    crate::{
        connection::{aio, Connection},
        error::{ClientResult, Error},
        protocol::{element::Response, ParseError},
        query::{IntoArgument, Request},
        transport::{AsyncTransport, Transport},
    },
    bytes::Bytes,
    core::time::Duration,
};

/// Transmit a prepared request and apply `parse` to the reply. An error reply never reaches
/// `parse`: it is promoted to [`Error::Server`] and its message is stored on the connection
pub fn sync_universal<T, R, P>(
    con: &mut Connection<T>,
    mut request: Request,
    parse: P,
) -> ClientResult<R>
where
    T: Transport,
    P: FnOnce(Response) -> ClientResult<R>,
{
    let response = con.transmit(&mut request)?;
    if let Response::Error(message) = &response {
        let message = String::from_utf8_lossy(message).into_owned();
        con.set_last_server_error(message.clone());
        return Err(Error::Server(message));
    }
    parse(response)
}

/// The async twin of [`sync_universal`]
pub async fn async_universal<T, R, P>(
    con: &mut aio::Connection<T>,
    mut request: Request,
    parse: P,
) -> ClientResult<R>
where
    T: AsyncTransport,
    P: FnOnce(Response) -> ClientResult<R>,
{
    let response = con.transmit(&mut request).await?;
    if let Response::Error(message) = &response {
        let message = String::from_utf8_lossy(message).into_owned();
        con.set_last_server_error(message.clone());
        return Err(Error::Server(message));
    }
    parse(response)
}

// Common result conversions, shared by many commands

/// `+OK` means yes, null means no, anything else does not belong here
pub fn ok_result(response: Response) -> ClientResult<bool> {
    match response {
        Response::SimpleString(ref data) if data.as_ref() == b"OK" => Ok(true),
        Response::Null => Ok(false),
        _ => Err(Error::Protocol(ParseError::UnexpectedResponse)),
    }
}

pub fn int_result(response: Response) -> ClientResult<i64> {
    match response {
        Response::Integer(_) => Ok(response.as_int()?),
        _ => Err(Error::Protocol(ParseError::UnexpectedResponse)),
    }
}

/// A value that may be missing: bulk string or null
pub fn bulk_result(response: Response) -> ClientResult<Option<Bytes>> {
    match response {
        Response::BulkString(data) => Ok(Some(data)),
        Response::Null => Ok(None),
        _ => Err(Error::Protocol(ParseError::UnexpectedResponse)),
    }
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                         P I N G
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn ping_request() -> Request {
    Request::new("PING")
}

pub fn ping_result(response: Response) -> ClientResult<()> {
    match response {
        Response::SimpleString(ref data) if data.as_ref() == b"PONG" => Ok(()),
        _ => Err(Error::Protocol(ParseError::UnexpectedResponse)),
    }
}

pub fn ping<T: Transport>(con: &mut Connection<T>) -> ClientResult<()> {
    sync_universal(con, ping_request(), ping_result)
}

pub async fn async_ping<T: AsyncTransport>(con: &mut aio::Connection<T>) -> ClientResult<()> {
    async_universal(con, ping_request(), ping_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                          G E T
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn get_request(key: impl IntoArgument) -> Request {
    let mut request = Request::new("GET");
    request.arg(key);
    request
}

pub fn get<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
) -> ClientResult<Option<Bytes>> {
    sync_universal(con, get_request(key), bulk_result)
}

pub async fn async_get<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
) -> ClientResult<Option<Bytes>> {
    async_universal(con, get_request(key), bulk_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                          S E T
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// When a SET is allowed to take effect
pub enum SetCondition {
    Always,
    /// NX: only set a key that does not exist yet
    IfNotExists,
    /// XX: only overwrite an existing key
    IfExists,
}

pub fn set_request(
    key: impl IntoArgument,
    value: impl IntoArgument,
    expiry: Option<Duration>,
    condition: SetCondition,
) -> Request {
    let mut request = Request::new("SET");
    request.arg(key).arg(value);
    if let Some(expiry) = expiry {
        request.arg("PX").arg(expiry.as_millis() as u64);
    }
    match condition {
        SetCondition::Always => {}
        SetCondition::IfNotExists => {
            request.arg("NX");
        }
        SetCondition::IfExists => {
            request.arg("XX");
        }
    }
    request
}

pub fn set<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
    value: impl IntoArgument,
) -> ClientResult<bool> {
    set_with_options(con, key, value, None, SetCondition::Always)
}

/// SET with an optional PX expiry and an NX/XX condition. A condition that was not met
/// answers null, which comes back as `false`
pub fn set_with_options<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
    value: impl IntoArgument,
    expiry: Option<Duration>,
    condition: SetCondition,
) -> ClientResult<bool> {
    sync_universal(con, set_request(key, value, expiry, condition), ok_result)
}

pub async fn async_set<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
    value: impl IntoArgument,
) -> ClientResult<bool> {
    async_set_with_options(con, key, value, None, SetCondition::Always).await
}

pub async fn async_set_with_options<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
    value: impl IntoArgument,
    expiry: Option<Duration>,
    condition: SetCondition,
) -> ClientResult<bool> {
    async_universal(con, set_request(key, value, expiry, condition), ok_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                         I N C R
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn incr_request(key: impl IntoArgument) -> Request {
    let mut request = Request::new("INCR");
    request.arg(key);
    request
}

/// Increment `key` and return the value after the increment
pub fn incr<T: Transport>(con: &mut Connection<T>, key: impl IntoArgument) -> ClientResult<i64> {
    sync_universal(con, incr_request(key), int_result)
}

pub async fn async_incr<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
) -> ClientResult<i64> {
    async_universal(con, incr_request(key), int_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                          D E L
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn del_request(key: impl IntoArgument) -> Request {
    let mut request = Request::new("DEL");
    request.arg(key);
    request
}

/// Returns the number of keys that were actually removed
pub fn del<T: Transport>(con: &mut Connection<T>, key: impl IntoArgument) -> ClientResult<i64> {
    sync_universal(con, del_request(key), int_result)
}

pub async fn async_del<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
) -> ClientResult<i64> {
    async_universal(con, del_request(key), int_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                       E X P I R E
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn expire_request(key: impl IntoArgument, ttl: Duration) -> Request {
    let mut request = Request::new("PEXPIRE");
    request.arg(key).arg(ttl.as_millis() as u64);
    request
}

pub fn expire_result(response: Response) -> ClientResult<bool> {
    match response {
        // "1" means the timeout was applied, "0" that the key does not exist
        Response::Integer(ref data) => Ok(data.as_ref() == b"1"),
        _ => Err(Error::Protocol(ParseError::UnexpectedResponse)),
    }
}

/// Attach a millisecond-resolution time-to-live to `key`
pub fn expire<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
    ttl: Duration,
) -> ClientResult<bool> {
    sync_universal(con, expire_request(key, ttl), expire_result)
}

pub async fn async_expire<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
    ttl: Duration,
) -> ClientResult<bool> {
    async_universal(con, expire_request(key, ttl), expire_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                       S E L E C T
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn select_request(index: i64) -> Request {
    let mut request = Request::new("SELECT");
    request.arg(index);
    request
}

/// Switch this connection to logical database `index`
pub fn select<T: Transport>(con: &mut Connection<T>, index: i64) -> ClientResult<bool> {
    sync_universal(con, select_request(index), ok_result)
}

pub async fn async_select<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    index: i64,
) -> ClientResult<bool> {
    async_universal(con, select_request(index), ok_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                 C L I E N T  S E T N A M E
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn client_setname_request(name: impl IntoArgument) -> Request {
    let mut request = Request::new("CLIENT");
    request.arg("SETNAME").arg(name);
    request
}

pub fn client_setname<T: Transport>(
    con: &mut Connection<T>,
    name: impl IntoArgument,
) -> ClientResult<bool> {
    sync_universal(con, client_setname_request(name), ok_result)
}

pub async fn async_client_setname<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    name: impl IntoArgument,
) -> ClientResult<bool> {
    async_universal(con, client_setname_request(name), ok_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                   M U L T I  /  E X E C
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn multi_request() -> Request {
    Request::new("MULTI")
}

/// Open a transaction block
pub fn multi<T: Transport>(con: &mut Connection<T>) -> ClientResult<bool> {
    sync_universal(con, multi_request(), ok_result)
}

pub async fn async_multi<T: AsyncTransport>(con: &mut aio::Connection<T>) -> ClientResult<bool> {
    async_universal(con, multi_request(), ok_result).await
}

pub fn exec_request() -> Request {
    Request::new("EXEC")
}

/// Run the queued transaction. The reply is the raw array of per-command replies, since its
/// shape depends entirely on what was queued
pub fn exec<T: Transport>(con: &mut Connection<T>) -> ClientResult<Response> {
    sync_universal(con, exec_request(), Ok)
}

pub async fn async_exec<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
) -> ClientResult<Response> {
    async_universal(con, exec_request(), Ok).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                         R O L E
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn role_request() -> Request {
    Request::new("ROLE")
}

pub fn role_result(response: Response) -> ClientResult<String> {
    // the reply is an array whose first element names the role
    match response.get(0) {
        Some(first) => Ok(String::from_utf8_lossy(first.data()).into_owned()),
        None => Err(Error::Protocol(ParseError::UnexpectedResponse)),
    }
}

/// Ask a server which replication role it currently plays ("master", "slave", "sentinel")
pub fn role<T: Transport>(con: &mut Connection<T>) -> ClientResult<String> {
    sync_universal(con, role_request(), role_result)
}

pub async fn async_role<T: AsyncTransport>(con: &mut aio::Connection<T>) -> ClientResult<String> {
    async_universal(con, role_request(), role_result).await
}
