use crate::commandline::Commandline;
use crate::error::WatchsyncError;
use clap::Parser;

mod api_client;
mod commandline;
mod configuration;
mod context;
mod error;
mod history;
mod player;
mod session;
mod time_hub;
mod types;
mod utils;

#[tokio::main]
async fn main() -> Result<(), WatchsyncError> {
	let commandline = Commandline::parse();
	commandline.run().await
}
