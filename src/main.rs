//! viewerq - Named viewer queues for streamer chat.
//!
//! This is the main entry point.

use clap::Parser;
use std::process::ExitCode;

use viewerq::logging;
use viewerq::Commands;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging. The guard keeps the file appender flushing until
    // the process exits.
    let _guard = match logging::init() {
        Ok((guard, _)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Parse command line arguments
    let args = Commands::parse();

    // Run the command
    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
