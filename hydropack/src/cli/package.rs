// hydropack/src/cli/package.rs
use clap::Args;
use hydropack_common::error::Result;
use hydropack_common::Config;
use hydropack_core::stages::{self, PackageOptions};
use tracing::info;

#[derive(Args, Debug, Clone, Default)]
pub struct PackageArgs {
    /// Do not write the hydro.sh launcher into the bundle
    #[arg(long)]
    pub no_launcher: bool,
}

impl PackageArgs {
    pub fn options(&self) -> PackageOptions {
        PackageOptions {
            write_launcher: !self.no_launcher,
        }
    }

    pub fn run(&self, config: &Config) -> Result<()> {
        let sizes = stages::package(config, self.options())?;
        info!(
            "Wrote {} ({})",
            config.archive_path().display(),
            sizes.summary()
        );
        Ok(())
    }
}
