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

//! A small driver that walks a live server through the client's surface: strings, counters,
//! expiry, hashes and a pipelined batch

#[macro_use]
extern crate log;

// modules
mod cli;
mod error;
// endof modules

use {
    carmine::{
        commands::{self, hash, SetCondition},
        query::Pipeline,
        transport::SingleHost,
        Connection,
    },
    clap::Parser,
    core::time::Duration,
    env_logger::Builder,
    std::{env, process},
};

fn main() {
    Builder::new()
        .parse_filters(&env::var("CARMINE_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    let args = cli::Cli::parse();
    if args.help {
        cli::print_help();
        process::exit(0x08);
    }
    if let Err(e) = run(&args) {
        error!("carmine-cli exited with error: {}", e);
        process::exit(0x01);
    }
}

fn run(args: &cli::Cli) -> error::CliResult<()> {
    let mut con = Connection::new(SingleHost::new(args.hostname.clone(), args.port));

    commands::ping(&mut con)?;
    println!("{}:{} answered the ping", args.hostname, args.port);
    commands::client_setname(&mut con, "carmine-cli")?;

    // plain strings
    commands::set(&mut con, "carmine:greeting", "hello from carmine")?;
    if let Some(value) = commands::get(&mut con, "carmine:greeting")? {
        println!("carmine:greeting = {}", String::from_utf8_lossy(&value));
    }
    let visits = commands::incr(&mut con, "carmine:visits")?;
    println!("carmine:visits -> {visits}");
    let applied = commands::expire(&mut con, "carmine:greeting", Duration::from_secs(30))?;
    println!("expiry on carmine:greeting applied: {applied}");

    // hashes
    hash::hset(&mut con, "carmine:profile", "name", "carmine")?;
    hash::hincrby(&mut con, "carmine:profile", "logins", 1)?;
    if let Some(name) = hash::hget(&mut con, "carmine:profile", "name")? {
        println!("carmine:profile[name] = {}", String::from_utf8_lossy(&name));
    }

    // a pipelined batch: one write, three replies in submission order
    let mut pipeline = Pipeline::new();
    pipeline
        .push(commands::set_request(
            "carmine:pipelined",
            "1",
            None,
            SetCondition::Always,
        ))
        .push(commands::incr_request("carmine:visits"))
        .push(commands::get_request("carmine:pipelined"));
    let results = con.transmit_pipeline(&mut pipeline)?;
    for (position, response) in results.responses().iter().enumerate() {
        println!("pipeline[{position}] -> {response}");
    }

    // leave the server the way we found it
    for key in [
        "carmine:greeting",
        "carmine:visits",
        "carmine:profile",
        "carmine:pipelined",
    ] {
        commands::del(&mut con, key)?;
    }
    println!("demo keys removed");
    Ok(())
}
