use clap::Parser;
use log::{error, info, Level};
use simple_logger::init_with_level;

mod cli;

use cli::{ArgCheck, Args};

fn main() {
    let start = std::time::Instant::now();
    if let Err(e) = init_with_level(Level::Info) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let args: Args = Args::parse();
    args.command.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    args.command.run().unwrap_or_else(|e| {
        error!("{:#}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:?}", elapsed);
}
