mod cli;
mod client;
mod models;
mod render;
mod repl;
mod state;

use std::process::ExitCode;

use client::HTTPClient;
use repl::REPL;

fn main() -> ExitCode {
    let config = cli::parse_config();
    let client = match HTTPClient::new(&config.base_url) {
        Ok(client) => client,
        Err(err) => {
            render::error(&err.to_string());
            return ExitCode::FAILURE;
        }
    };
    let mut repl = REPL::new(config, client);
    repl.run();
    ExitCode::SUCCESS
}
