use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{classifier::ModelInfo, prediction::Prediction};

pub const WELCOME_MESSAGE: &str = "Welcome to Waste Classification API";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RootResponse {
	pub message: String,
}

impl Default for RootResponse {
	fn default() -> Self {
		Self {
			message: WELCOME_MESSAGE.to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictResponse {
	/// Predicted waste category
	pub class: String,
	/// Probability of the predicted category, as a percentage
	pub confidence: f64,
	/// Name of the uploaded file
	pub filename: Option<String>,
	/// Percentage for every category, in label order
	pub probabilities: IndexMap<String, f64>,
	/// Handling guidance for the predicted category, or a description of why it could not be fetched
	pub waste_management_insights: String,
}

impl PredictResponse {
	#[must_use]
	pub fn new(prediction: &Prediction, filename: Option<String>, insights: String) -> Self {
		Self {
			filename,
			class: prediction.label().to_string(),
			confidence: prediction.confidence(),
			probabilities: prediction.percentages(),
			waste_management_insights: insights,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
	Ready,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct HealthCheck {
	/// Current health status
	pub status: Health,
	/// Loaded model
	pub model: ModelInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
	pub detail: String,
}
