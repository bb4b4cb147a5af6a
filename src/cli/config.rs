use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ec2_to_vdc::config::AdapterConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration file (default: platform configuration directory)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Only print the configuration file path
    #[arg(long, short = 'p')]
    path: bool,
}

impl ConfigArgs {
    pub fn main(self) -> Result<()> {
        let path = AdapterConfig::file_path(self.config.as_deref())?;
        if self.path {
            println!("{}", path.display());
            return Ok(());
        }

        let config = AdapterConfig::load(Some(&path))
            .with_context(|| format!("could not load {}", path.display()))?;
        println!("# {}", path.display());
        println!("{config:#?}");
        println!("base_url: {}", config.base_url());
        Ok(())
    }
}
