use std::{
	net::{IpAddr, SocketAddr},
	time::Duration,
};

use clap::Parser;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_INSIGHTS_MODEL: &str = "openai/gpt-4-turbo-preview";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Invalid resnet_size {0}. Choose 34 or 50.")]
	UnsupportedArchitecture(u32),

	#[error("Pruning amount must lie between 0 and 1, got {0}")]
	InvalidPruningAmount(f64),

	#[error("OPENROUTER_API_KEY not found in environment variables")]
	MissingApiKey,

	#[error("Invalid header value for {0}")]
	InvalidHeader(&'static str),

	#[error("Failed to build HTTP client: {0}")]
	HttpClient(#[from] reqwest::Error),
}

/// Waste classification API server
#[derive(Debug, Clone, Parser)]
#[command(name = "waste-api", version, about)]
pub struct Config {
	/// Address to bind the HTTP server to
	#[arg(long, env = "HOST", default_value = "0.0.0.0")]
	pub host: IpAddr,

	/// Port to bind the HTTP server to
	#[arg(long, env = "PORT", default_value_t = 8000)]
	pub port: u16,

	/// ResNet backbone depth (34 or 50)
	#[arg(long, env = "RESNET_SIZE", default_value_t = 50)]
	pub resnet_size: u32,

	/// Fraction of each layer's weights to prune at startup
	#[arg(long, env = "PRUNING_AMOUNT", default_value_t = 0.3)]
	pub pruning_amount: f64,

	/// Bearer token for the chat-completion API
	#[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
	pub api_key: Option<String>,

	/// Chat-completion endpoint
	#[arg(long, env = "OPENROUTER_URL", default_value = DEFAULT_ENDPOINT)]
	pub endpoint: Url,

	/// Model identifier sent to the chat-completion API
	#[arg(long, env = "INSIGHTS_MODEL", default_value = DEFAULT_INSIGHTS_MODEL)]
	pub insights_model: String,

	/// Seconds to wait for the chat-completion API before giving up
	#[arg(long, env = "INSIGHTS_TIMEOUT", default_value_t = 5)]
	pub insights_timeout: u64,

	/// Public URL of this service, sent as the HTTP referer
	#[arg(long, env = "PUBLIC_URL", default_value = "http://localhost:8000")]
	pub public_url: String,

	/// Largest accepted upload, in bytes
	#[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
	pub max_upload_bytes: usize,

	/// Print the JSON schema of the prediction response and exit
	#[arg(long)]
	pub dump_schema: bool,
}

/// Validated startup settings.
#[derive(Debug, Clone)]
pub struct Settings {
	pub addr: SocketAddr,
	pub insights: InsightSettings,
	pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct InsightSettings {
	pub api_key: String,
	pub endpoint: Url,
	pub model: String,
	pub referer: String,
	pub timeout: Duration,
}

impl std::fmt::Debug for InsightSettings {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InsightSettings")
			.field("api_key", &"<redacted>")
			.field("endpoint", &self.endpoint.as_str())
			.field("model", &self.model)
			.field("referer", &self.referer)
			.field("timeout", &self.timeout)
			.finish()
	}
}

impl Config {
	/// Validate the raw configuration.
	///
	/// # Errors
	///
	/// Returns an error if the API key is missing. The model options are checked by [`crate::build_classifier`].
	pub fn settings(&self) -> Result<Settings, ConfigError> {
		Ok(Settings {
			addr: SocketAddr::new(self.host, self.port),
			insights: InsightSettings {
				api_key: self
					.api_key
					.as_deref()
					.map(str::trim)
					.filter(|key| !key.is_empty())
					.ok_or(ConfigError::MissingApiKey)?
					.to_string(),
				endpoint: self.endpoint.clone(),
				model: self.insights_model.clone(),
				referer: self.public_url.clone(),
				timeout: Duration::from_secs(self.insights_timeout),
			},
			max_upload_bytes: self.max_upload_bytes,
		})
	}
}

/// Ensure a pruning fraction lies in [0, 1].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPruningAmount`] for values outside the range.
pub fn validate_pruning_amount(amount: f64) -> Result<f64, ConfigError> {
	if (0.0..=1.0).contains(&amount) {
		Ok(amount)
	} else {
		Err(ConfigError::InvalidPruningAmount(amount))
	}
}
