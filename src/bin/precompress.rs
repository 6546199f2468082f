use clap::Parser;
use std::process;

use spadev::args::PrecompressArgs;
use spadev::logging::Logger;
use spadev::precompress::{brotli_available, report, CompressionPass};
use spadev::Result;

fn run(args: &PrecompressArgs, logger: &Logger) -> Result<()> {
    let brotli = brotli_available() && !args.no_brotli;
    let pass = CompressionPass::new(
        &args.directory,
        brotli,
        logger.scoped("spadev::precompress"),
    )?;

    println!("{}", report::header(&args.directory, brotli));
    let outcome = pass.run_with(|entry| println!("{}", report::format_entry(entry)))?;
    println!("{}", report::summary(&outcome));
    Ok(())
}

fn main() {
    let args = PrecompressArgs::parse();
    let logger = Logger::from_env();

    if let Err(e) = run(&args, &logger) {
        logger.error(format_args!("{}", e));
        process::exit(e.exit_code());
    }
}
