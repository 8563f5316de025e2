//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use geonames_cli::CliError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match geonames_cli::run() {
        Ok(()) => {}
        // Help and version requests exit through clap with their own status.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("geonames: {err}");
            std::process::exit(1);
        }
    }
}
