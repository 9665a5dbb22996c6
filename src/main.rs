//! Binary entrypoint for the `sigma-demo` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing .env is fine; variables may come from the real environment.
    let _ = dotenvy::dotenv();

    match sigma_demo::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
