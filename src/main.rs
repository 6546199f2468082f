use clap::Parser;
use std::process;

use spadev::args::ServeArgs;
use spadev::logging::Logger;
use spadev::server::start_server;

fn main() {
    let args = ServeArgs::parse();
    let logger = Logger::from_env();

    if let Err(e) = start_server(args, logger.clone()) {
        logger.error(format_args!("Failed to start server: {}", e));
        process::exit(e.exit_code());
    }
}
