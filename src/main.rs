// Entrypoint for the CLI application.
// - Logs go to stderr; stdout carries exactly one JSON line.
// - Flow outcomes exit 0, argument parse errors use clap's exit code.
// - Credentials may come from a `.env` file; real environment wins.

use banner_shim::commands::{run, usage_envelope, Cli};
use banner_shim::config::Config;
use clap::Parser;
use std::env;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    // capture a backtrace where each error is created
    if env::var_os("RUST_LIB_BACKTRACE").is_none() && env::var_os("RUST_BACKTRACE").is_none() {
        env::set_var("RUST_LIB_BACKTRACE", "1");
    }
    dotenvy::dotenv().ok();
    init_logging();

    let (envelope, code) = match Cli::try_parse() {
        Ok(cli) => (run(cli.command, Config::from_env), ExitCode::SUCCESS),
        Err(err) => {
            eprint!("{}", err.render());
            let code = u8::try_from(err.exit_code()).unwrap_or(2);
            (usage_envelope(&err), ExitCode::from(code))
        }
    };

    if let Err(e) = envelope.emit(&mut io::stdout().lock()) {
        eprintln!("Failed to write output: {}", e);
        return ExitCode::FAILURE;
    }
    code
}
