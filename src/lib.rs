//! Demo extension for the Sigma file manager, runnable from a terminal.
//!
//! The extension registers commands, context-menu items and settings with a
//! [`ports::Host`], and carries its commands out by running scripts through
//! an external JavaScript runtime. When the runtime is missing the
//! [`runner`] falls back through an ordered list of candidates, ending with
//! PowerShell where the platform has it.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod extension;
pub mod logging;
pub mod ports;
pub mod runner;
pub mod script;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing, configuration or command
/// execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => {
            err.print().map_err(|e| e.to_string())?;
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    let config = config::Config::from_env()?;
    logging::init(&config);
    commands::dispatch(&cli.command, &config)
}
