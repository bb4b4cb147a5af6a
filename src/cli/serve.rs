use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ec2_to_vdc::{
    config::AdapterConfig,
    ec2::actions,
    server::{self, AppState},
};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Configuration file (default: platform configuration directory)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Address to listen on (overrides `listen`)
    #[arg(long, short = 'l')]
    listen: Option<SocketAddr>,

    /// Log the parameters of every request
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl ServeArgs {
    pub async fn main(self) -> Result<()> {
        let mut config = AdapterConfig::load(self.config.as_deref())
            .with_context(|| "could not load adapter configuration")?;
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        config.verbose_requests |= self.verbose;

        let listen = config.listen;
        let state = AppState::connect(config)?;
        let listener = TcpListener::bind(listen)
            .await
            .with_context(|| format!("could not bind {listen}"))?;

        info!(
            %listen,
            actions = ?actions::supported().collect::<Vec<_>>(),
            max_instances_to_start = state.config().max_instances_to_start,
            "serving EC2 Query API"
        );
        server::serve(listener, state).await?;
        Ok(())
    }
}
