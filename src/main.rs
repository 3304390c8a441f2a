//! meterbar CLI entry point.

use meterbar_lib::cli::{self, Cli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Fatal errors, bind failure included, are reported here exactly once
    match cli::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("meterbar: {}", e);
            ExitCode::FAILURE
        },
    }
}
