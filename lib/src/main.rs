use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use waste_api::Config;
use waste_core::http::PredictResponse;

#[tokio::main]
async fn main() -> Result<()> {
	// a missing .env file is fine, the environment may already be set
	dotenv::dotenv().ok();

	tracing_subscriber::registry()
		.with(tracing_subscriber::fmt::layer())
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = Config::parse();

	if config.dump_schema {
		println!(
			"{}",
			serde_json::to_string_pretty(&schemars::schema_for!(PredictResponse))?
		);
		return Ok(());
	}

	waste_api::start(config).await
}
