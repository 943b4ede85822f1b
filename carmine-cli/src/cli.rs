/*
 * Created on Mon Mar 14 2022
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

use clap::{CommandFactory, Parser};

#[derive(Parser, Debug)]
// `-h` belongs to the hostname here, so the automatic help flag has to go
#[command(
    name = "carmine-cli",
    version,
    about = "Exercise a Redis server through the carmine client library",
    disable_help_flag = true
)]
pub struct Cli {
    /// Print usage information and exit
    #[arg(long)]
    pub help: bool,
    /// Server hostname
    #[arg(short = 'h', long, default_value = "127.0.0.1")]
    pub hostname: String,
    /// Server port
    #[arg(short = 'p', long, default_value_t = 6379)]
    pub port: u16,
}

pub fn print_help() {
    let mut command = Cli::command();
    let _ = command.print_help();
}
