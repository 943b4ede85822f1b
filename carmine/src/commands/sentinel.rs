/*
 * Created on Sat Mar 12 2022
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

//! Bindings for the sentinel inquiry commands that master discovery is built on

use {
    super::{async_universal, sync_universal},
    crate::{
        connection::{aio, Connection},
        error::{ClientResult, Error},
        protocol::{element::Response, ParseError},
        query::{IntoArgument, Request},
        transport::{AsyncTransport, Host, Transport},
    },
    std::collections::HashMap,
};

/// The property maps a sentinel reports for its known peers
pub type SentinelProperties = Vec<HashMap<String, String>>;

fn lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                     S E N T I N E L  (get-master-addr-by-name)
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn get_master_addr_request(master_set: impl IntoArgument) -> Request {
    let mut request = Request::new("SENTINEL");
    request.arg("get-master-addr-by-name").arg(master_set);
    request
}

pub fn master_addr_result(response: Response) -> ClientResult<Host> {
    match &response {
        // a sentinel that does not know the set answers null
        Response::Null => Err(Error::NoData),
        Response::Array(items) if items.len() == 2 => {
            let host = lossy(items[0].data());
            let port = match items[1].as_int() {
                Ok(port) if (0..=i64::from(u16::MAX)).contains(&port) => port as u16,
                _ => return Err(Error::Protocol(ParseError::UnexpectedResponse)),
            };
            Ok((host, port))
        }
        _ => Err(Error::Protocol(ParseError::UnexpectedResponse)),
    }
}

/// Ask a sentinel which endpoint currently holds the master role for `master_set`
pub fn get_master_addr_by_name<T: Transport>(
    con: &mut Connection<T>,
    master_set: impl IntoArgument,
) -> ClientResult<Host> {
    sync_universal(con, get_master_addr_request(master_set), master_addr_result)
}

pub async fn async_get_master_addr_by_name<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    master_set: impl IntoArgument,
) -> ClientResult<Host> {
    async_universal(con, get_master_addr_request(master_set), master_addr_result).await
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//                             S E N T I N E L  (sentinels)
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

pub fn sentinels_request(master_set: impl IntoArgument) -> Request {
    let mut request = Request::new("SENTINEL");
    request.arg("sentinels").arg(master_set);
    request
}

pub fn sentinels_result(response: Response) -> ClientResult<SentinelProperties> {
    match response {
        // an empty array is a fine answer: a lone sentinel knows no peers
        Response::Array(entries) => {
            let mut result = Vec::with_capacity(entries.len());
            for entry in entries {
                let mut properties = HashMap::new();
                if let Some(fields) = entry.elements() {
                    // the properties come as a flat name/value alternation
                    if fields.len() % 2 == 0 {
                        for pair in fields.chunks(2) {
                            properties.insert(lossy(pair[0].data()), lossy(pair[1].data()));
                        }
                    }
                }
                result.push(properties);
            }
            Ok(result)
        }
        _ => Err(Error::Protocol(ParseError::UnexpectedResponse)),
    }
}

/// Ask a sentinel for the other sentinels it knows watching `master_set`
pub fn sentinels<T: Transport>(
    con: &mut Connection<T>,
    master_set: impl IntoArgument,
) -> ClientResult<SentinelProperties> {
    sync_universal(con, sentinels_request(master_set), sentinels_result)
}

pub async fn async_sentinels<T: AsyncTransport>(
    con: &mut aio::Connection<T>,
    master_set: impl IntoArgument,
) -> ClientResult<SentinelProperties> {
    async_universal(con, sentinels_request(master_set), sentinels_result).await
}
