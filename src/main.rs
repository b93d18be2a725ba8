//! beacon-setup — install and configure the Beacon monitoring agent.

use clap::Parser;
use clap::error::ErrorKind;

use beacon_setup::cli::Cli;
use beacon_setup::error;

#[tokio::main]
async fn main() {
    // The exit-code contract predates clap: help exits 0 and any bad
    // flag/missing argument exits 1 (clap's own default is 2, which is
    // reserved for download failures here).
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(error::exit_code(&e));
    }
}
