use std::sync::Arc;

use anyhow::Result;
use axum::Server;
use waste_core::NUM_CLASSES;

use crate::{
	config::Config, context::AppContext, insights::InsightClient, model::build_classifier, routes,
	shutdown,
};

/// Validate configuration, build the model and serve the API until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the model cannot be built, or the server fails to bind.
pub async fn start(config: Config) -> Result<()> {
	let settings = config.settings()?;

	let insights = InsightClient::new(&settings.insights)?;
	#[allow(clippy::cast_possible_wrap)]
	let classifier = tokio::task::spawn_blocking(move || {
		build_classifier(config.resnet_size, NUM_CLASSES as i64, config.pruning_amount)
	})
	.await??;
	tracing::info!("Model pruned and loaded successfully!");

	let app = routes::handler(
		AppContext::new(Arc::new(classifier), insights),
		settings.max_upload_bytes,
	);

	tracing::info!("Starting server on {}...", settings.addr);
	Server::try_bind(&settings.addr)?
		.serve(app.into_make_service())
		.with_graceful_shutdown(shutdown::signal())
		.await?;

	tracing::info!("Server stopped");
	Ok(())
}
