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

//! Bindings for the hash (field/value map) command family

use {
    super::{async_universal, bulk_result, int_result, sync_universal},
    crate::{
        connection::{aio, Connection},
        error::ClientResult,
        query::{IntoArgument, Request},
        transport::{AsyncTransport, Transport},
    },
    bytes::Bytes,
};

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                         H S E T
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn hset_request(
    key: impl IntoArgument,
    field: impl IntoArgument,
    value: impl IntoArgument,
) -> Request {
    let mut request = Request::new("HSET");
    request.arg(key).arg(field).arg(value);
    request
}

/// Returns the number of fields that were newly created
pub fn hset<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
    value: impl IntoArgument,
) -> ClientResult<i64> {
    sync_universal(con, hset_request(key, field, value), int_result)
}

pub async fn async_hset<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
    value: impl IntoArgument,
) -> ClientResult<i64> {
    async_universal(con, hset_request(key, field, value), int_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                         H G E T
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn hget_request(key: impl IntoArgument, field: impl IntoArgument) -> Request {
    let mut request = Request::new("HGET");
    request.arg(key).arg(field);
    request
}

pub fn hget<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
) -> ClientResult<Option<Bytes>> {
    sync_universal(con, hget_request(key, field), bulk_result)
}

pub async fn async_hget<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
) -> ClientResult<Option<Bytes>> {
    async_universal(con, hget_request(key, field), bulk_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                         H D E L
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn hdel_request(key: impl IntoArgument, field: impl IntoArgument) -> Request {
    let mut request = Request::new("HDEL");
    request.arg(key).arg(field);
    request
}

/// Returns the number of fields that were actually removed
pub fn hdel<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
) -> ClientResult<i64> {
    sync_universal(con, hdel_request(key, field), int_result)
}

pub async fn async_hdel<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
) -> ClientResult<i64> {
    async_universal(con, hdel_request(key, field), int_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                     H I N C R B Y
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn hincrby_request(
    key: impl IntoArgument,
    field: impl IntoArgument,
    increment: i64,
) -> Request {
    let mut request = Request::new("HINCRBY");
    request.arg(key).arg(field).arg(increment);
    request
}

/// Returns the field value after the increment
pub fn hincrby<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
    increment: i64,
) -> ClientResult<i64> {
    sync_universal(con, hincrby_request(key, field, increment), int_result)
}

pub async fn async_hincrby<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
    increment: i64,
) -> ClientResult<i64> {
    async_universal(con, hincrby_request(key, field, increment), int_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                                       H S E T N X
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn hsetnx_request(
    key: impl IntoArgument,
    field: impl IntoArgument,
    value: impl IntoArgument,
) -> Request {
    let mut request = Request::new("HSETNX");
    request.arg(key).arg(field).arg(value);
    request
}

/// Returns 1 if the field was created, 0 if it already existed and was left alone
pub fn hsetnx<T: Transport>(
    con: &mut Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
    value: impl IntoArgument,
) -> ClientResult<i64> {
    sync_universal(con, hsetnx_request(key, field, value), int_result)
}

pub async fn async_hsetnx<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    key: impl IntoArgument,
    field: impl IntoArgument,
    value: impl IntoArgument,
) -> ClientResult<i64> {
    async_universal(con, hsetnx_request(key, field, value), int_result).await
}
