//! CLI argument definitions.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};

use crate::script::HashAlgorithm;

/// Top-level CLI parser for `sigma-demo`.
#[derive(Debug, Parser)]
#[command(name = "sigma-demo", version, about = "Run the Sigma demo extension from a terminal")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the commands, menu items and settings the extension registers.
    List,
    /// Hash one or more files.
    Hash {
        /// Files to hash.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Digest algorithm (md5, sha1, sha256, sha512); overrides the setting.
        #[arg(long, value_parser = HashAlgorithm::from_str)]
        algorithm: Option<HashAlgorithm>,
    },
    /// Evaluate a JavaScript expression over a JSON document bound to `data`.
    Transform {
        /// Inline JSON text.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        json: Option<String>,
        /// JSON file to read.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Expression to evaluate.
        #[arg(long = "expr")]
        expression: String,
    },
    /// Show platform, memory and uptime.
    Sysinfo,
    /// Show the configured runtime's version.
    Runtime,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::script::HashAlgorithm;
    use clap::Parser;

    #[test]
    fn parses_list_subcommand() {
        let cli = Cli::parse_from(["sigma-demo", "list"]);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn parses_hash_with_algorithm() {
        let cli = Cli::parse_from(["sigma-demo", "hash", "a.txt", "b.txt", "--algorithm", "md5"]);
        match cli.command {
            Command::Hash { paths, algorithm } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(algorithm, Some(HashAlgorithm::Md5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn hash_requires_a_path_and_a_known_algorithm() {
        assert!(Cli::try_parse_from(["sigma-demo", "hash"]).is_err());
        assert!(Cli::try_parse_from(["sigma-demo", "hash", "a", "--algorithm", "crc32"]).is_err());
    }

    #[test]
    fn transform_takes_json_or_file_but_not_both() {
        assert!(
            Cli::try_parse_from(["sigma-demo", "transform", "--json", "{}", "--expr", "data"])
                .is_ok()
        );
        assert!(Cli::try_parse_from([
            "sigma-demo",
            "transform",
            "--file",
            "a.json",
            "--expr",
            "data"
        ])
        .is_ok());
        assert!(Cli::try_parse_from(["sigma-demo", "transform", "--expr", "data"]).is_err());
        assert!(Cli::try_parse_from([
            "sigma-demo",
            "transform",
            "--json",
            "{}",
            "--file",
            "a.json",
            "--expr",
            "data"
        ])
        .is_err());
    }
}
