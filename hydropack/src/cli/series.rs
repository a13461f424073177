// hydropack/src/cli/series.rs
//! Stage sequences run by `dev` and `all`.
use clap::Args;
use colored::Colorize;
use hydropack_common::error::Result;
use hydropack_common::Config;
use hydropack_core::stages;
use hydropack_net::HttpFetcher;
use tracing::debug;

use crate::cli::package::PackageArgs;

#[derive(Args, Debug, Clone, Default)]
pub struct SeriesArgs {
    /// Do not write the hydro.sh launcher into the bundle
    #[arg(long)]
    pub no_launcher: bool,
}

fn announce(stage: &str) {
    println!("{}{}", "==> ".bold().blue(), stage.bold());
}

impl SeriesArgs {
    /// Stops at the first failing stage.
    pub async fn run_dev(&self, config: &Config) -> Result<()> {
        announce("mkdir");
        stages::make_dirs(config)?;

        announce("runtime");
        let fetcher = HttpFetcher::new()?;
        stages::prepare_runtime(config, &fetcher).await?;

        announce("instance");
        stages::create_instance(config).await?;

        announce("package");
        PackageArgs {
            no_launcher: self.no_launcher,
        }
        .run(config)?;

        debug!("Series finished for {}", config.root().display());
        Ok(())
    }

    pub async fn run_all(&self, config: &Config) -> Result<()> {
        announce("clean");
        stages::clean(config)?;
        self.run_dev(config).await
    }
}
