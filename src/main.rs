//! KKBOX proxy server binary.

// crates.io
use clap::Parser;
use color_eyre::Result;
use tokio::net::TcpListener;
// self
use kkbox_proxy::{config::Config, gateway::ProxyGateway, obs};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = Config::parse();

	obs::init_tracing(&config.log_level, config.log_format)?;

	let gateway = ProxyGateway::from_config(&config)?;
	let listener = TcpListener::bind(config.listen_addr()).await?;

	gateway.serve(listener).await?;

	Ok(())
}
