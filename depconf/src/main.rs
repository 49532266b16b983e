/*
 * Copyright 2020 Nikhil Marathe <nsm.nikhil@gmail.com>
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use depconf::{parse_args, run, USAGE};

fn main() -> anyhow::Result<()> {
    let command = match parse_args(pico_args::Arguments::from_env()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("depconf: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let level = if command.verbose() { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if !run(command)? {
        std::process::exit(1);
    }
    Ok(())
}
