use reqwest::{
	header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
	Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ConfigError, InsightSettings};

pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 500;
pub const APP_TITLE: &str = "Waste Classification API";

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
	#[error("Network error while connecting to OpenRouter: {0}")]
	Network(#[from] reqwest::Error),

	#[error("OpenRouter API error (Status {status}): {body}")]
	Upstream { status: u16, body: String },

	#[error("Invalid JSON response from OpenRouter API")]
	InvalidJson(#[source] serde_json::Error),

	#[error("Unable to parse response from OpenRouter API")]
	MissingChoices,

	#[error("OpenRouter API returned an empty completion")]
	EmptyCompletion,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
	model: &'a str,
	messages: [ChatMessage<'a>; 1],
	temperature: f64,
	max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
	role: &'a str,
	content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
	#[serde(default)]
	choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
	message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
	content: String,
}

/// Client for the chat-completion endpoint that writes waste handling guidance.
#[derive(Debug, Clone)]
pub struct InsightClient {
	client: Client,
	endpoint: Url,
	model: String,
}

impl InsightClient {
	/// Build a client that authenticates every request with the configured key.
	///
	/// # Errors
	///
	/// Returns an error if a header value is invalid or the HTTP client cannot be built.
	pub fn new(settings: &InsightSettings) -> Result<Self, ConfigError> {
		let mut headers = HeaderMap::new();

		let mut authorization = HeaderValue::from_str(&format!("Bearer {}", settings.api_key))
			.map_err(|_| ConfigError::InvalidHeader("Authorization"))?;
		authorization.set_sensitive(true);
		headers.insert(AUTHORIZATION, authorization);
		headers.insert(
			"HTTP-Referer",
			HeaderValue::from_str(&settings.referer).map_err(|_| ConfigError::InvalidHeader("HTTP-Referer"))?,
		);
		headers.insert("X-Title", HeaderValue::from_static(APP_TITLE));
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(Self {
			client: Client::builder()
				.user_agent(format!("waste-api/{}", env!("CARGO_PKG_VERSION")))
				.default_headers(headers)
				.timeout(settings.timeout)
				.build()?,
			endpoint: settings.endpoint.clone(),
			model: settings.model.clone(),
		})
	}

	/// Ask the chat-completion API for handling guidance on `material`.
	///
	/// # Errors
	///
	/// Returns an error if the request fails, the API answers with a non-200 status, or the body has no usable completion.
	pub async fn fetch(&self, material: &str) -> Result<String, InsightError> {
		let prompt = prompt(material);
		let request = ChatRequest {
			model: &self.model,
			messages: [ChatMessage {
				role: "user",
				content: &prompt,
			}],
			temperature: TEMPERATURE,
			max_tokens: MAX_TOKENS,
		};

		tracing::debug!("Requesting insights for {material} from {}", self.endpoint);
		let response = self
			.client
			.post(self.endpoint.clone())
			.json(&request)
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		if status != StatusCode::OK {
			return Err(InsightError::Upstream {
				status: status.as_u16(),
				body,
			});
		}

		parse_completion(&body)
	}

	/// Like [`InsightClient::fetch`], with failures turned into a readable message.
	pub async fn insights(&self, material: &str) -> String {
		match self.fetch(material).await {
			Ok(text) => text,
			Err(error) => {
				tracing::warn!("Failed to fetch insights for {material}: {error}");
				error.to_string()
			},
		}
	}
}

fn parse_completion(body: &str) -> Result<String, InsightError> {
	let value: serde_json::Value = serde_json::from_str(body).map_err(InsightError::InvalidJson)?;
	let completion: ChatCompletion =
		serde_json::from_value(value).map_err(|_| InsightError::MissingChoices)?;

	let content = completion
		.choices
		.into_iter()
		.next()
		.ok_or(InsightError::MissingChoices)?
		.message
		.content;

	let content = content.replace("\n\n", "\n").trim().to_string();
	if content.is_empty() {
		return Err(InsightError::EmptyCompletion);
	}

	Ok(content)
}

/// Prompt asking for structured guidance on handling `material` waste.
#[must_use]
pub fn prompt(material: &str) -> String {
	format!(
		"Provide a structured response about managing {material} waste. Follow this exact format and tailor your answer according to the unique properties of the material type:

Decomposition/Composting:

Write 2-3 sentences describing decomposition and composting methods suitable for {material} waste.

If the material is unsuitable for composting, explain why and suggest alternative natural breakdown methods if applicable.

Recycling Process:

Write 2-3 sentences detailing recycling methods for {material} waste, including sorting techniques and any challenges specific to the material.

Note any limitations if the material is difficult or non-recyclable.

Energy Conversion (Community-based and Home Implementation):

Write 2-3 sentences explaining how torrefaction converts waste into bioenergy pellets and how landfill gas (LFG) can be captured for renewable energy.

Include practical advice for implementing these techniques at home or within a community setting, or suggest alternatives if the material does not lend itself to energy conversion.

Disposal Guidelines:

Write 2-3 sentences outlining proper disposal practices for {material} waste to ensure safety and minimize environmental harm.

Environmental Impact:

Write 2-3 sentences summarizing the environmental consequences of managing {material} waste, highlighting benefits from energy conversion methods like reduced greenhouse gas emissions, or potential drawbacks if the material is problematic.

If a section does not apply to {material} waste, say so briefly instead of inventing details."
	)
}
