// hydropack/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use hydropack_common::error::Result;
use hydropack_common::Config;
use hydropack_core::stages;
use hydropack_net::HttpFetcher;

pub mod package;
pub mod series;

use crate::cli::package::PackageArgs;
use crate::cli::series::SeriesArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "hydropack", bin_name = "hydropack")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Stage to run; defaults to `dev`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Dev(SeriesArgs::default()))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Remove the dist tree (the download cache is kept)
    Clean,
    /// Create the dist directory layout
    Mkdir,
    /// Fetch and unpack the Node.js runtime
    Runtime,
    /// Fetch mongodb, minio and the sandbox into dist
    Extras,
    /// Write the instance workspace and install it with yarn
    Instance,
    /// Trim dist and build the archive
    Package(PackageArgs),
    /// mkdir, runtime, instance, package
    Dev(SeriesArgs),
    /// clean, then everything `dev` does
    All(SeriesArgs),
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Clean => stages::clean(config),
            Self::Mkdir => stages::make_dirs(config),
            Self::Runtime => {
                let fetcher = HttpFetcher::new()?;
                stages::prepare_runtime(config, &fetcher).await
            }
            Self::Extras => {
                let fetcher = Arc::new(HttpFetcher::new()?);
                stages::prepare_extras(config, fetcher).await
            }
            Self::Instance => stages::create_instance(config).await,
            Self::Package(command) => command.run(config),
            Self::Dev(command) => command.run_dev(config).await,
            Self::All(command) => command.run_all(config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_dev() {
        let args = CliArgs::try_parse_from(["hydropack"]).unwrap();
        assert!(matches!(args.command(), Command::Dev(SeriesArgs { no_launcher: false })));
    }

    #[test]
    fn verbose_is_counted_after_the_subcommand() {
        let args = CliArgs::try_parse_from(["hydropack", "package", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.command(), Command::Package(PackageArgs { no_launcher: false })));
    }

    #[test]
    fn no_launcher_flag_reaches_series() {
        let args = CliArgs::try_parse_from(["hydropack", "all", "--no-launcher"]).unwrap();
        assert!(matches!(args.command(), Command::All(SeriesArgs { no_launcher: true })));
    }

    #[test]
    fn unknown_stage_is_rejected() {
        assert!(CliArgs::try_parse_from(["hydropack", "deploy"]).is_err());
    }
}
