use anyhow::Result;
use serde::Serialize;

use crate::{prediction::PredictionError, transform::ImageTensor};

/// An image classifier over the waste class labels.
pub trait Classifier: Send + Sync {
	/// Describe the loaded model
	fn info(&self) -> ModelInfo;

	/// Run a forward pass and return the softmax distribution over the class labels
	///
	/// # Errors
	///
	/// Returns an error if the backend fails to evaluate the input.
	fn probabilities(&self, input: &ImageTensor) -> Result<Vec<f32>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
pub struct ModelInfo {
	/// Backbone architecture, e.g. `resnet50`
	pub architecture: String,
	/// Width of the classification head
	pub classes: usize,
	/// Fraction of each layer's weights zeroed at startup
	pub pruning_amount: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
	#[error("Failed to run inference: {0}")]
	Backend(#[from] anyhow::Error),

	#[error("Inference task failed: {0}")]
	Internal(String),

	#[error("Model produced an invalid distribution: {0}")]
	Output(#[from] PredictionError),
}
