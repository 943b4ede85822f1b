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

use {crate::protocol::ParseError, core::fmt, std::io};

/// A generic result for client operations
pub type ClientResult<T> = Result<T, Error>;

#[derive(Debug)]
/// Everything that can go wrong while talking to a server
pub enum Error {
    /// Name resolution, connect, send or receive failed
    Io(io::Error),
    /// The server answered with an error reply; the message is preserved here and on the
    /// connection that saw it
    Server(String),
    /// The byte stream violated the protocol, or a reply did not fit its command
    Protocol(ParseError),
    /// The server answered null where a value was required
    NoData,
    /// Every host in a fallback list refused the connection
    NoUsableServer,
    /// The reply stream ended before all expected pipeline responses arrived
    IncompleteResponse,
    /// Sentinel discovery exhausted its candidates or its time budget
    NoMoreSentinels,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Server(msg) => write!(f, "Server signaled error: {msg}"),
            Error::Protocol(e) => write!(f, "Protocol error: {e}"),
            Error::NoData => write!(f, "No data from server"),
            Error::NoUsableServer => write!(f, "No usable server found"),
            Error::IncompleteResponse => write!(f, "Not enough data for expected responses"),
            Error::NoMoreSentinels => write!(f, "No more sentinels left to ask for master"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Error::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Protocol(e)
    }
}
