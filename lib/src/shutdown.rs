use tokio::signal;

/// Resolves once the process receives Ctrl+C or, on unix, SIGTERM.
pub async fn signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::error!("Failed to listen for Ctrl+C: {e}");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				tracing::error!("Failed to listen for SIGTERM: {e}");
				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
		() = terminate => tracing::info!("Received SIGTERM, shutting down"),
	}
}
