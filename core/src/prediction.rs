use indexmap::IndexMap;

use crate::labels::{CLASS_LABELS, NUM_CLASSES};

/// Maximum distance from 1 a probability distribution may sum to.
pub const SUM_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
	#[error("Expected {NUM_CLASSES} class probabilities, got {0}")]
	WrongWidth(usize),

	#[error("Probability for class {0} is not a finite value in [0, 1]")]
	OutOfRange(usize),

	#[error("Class probabilities sum to {0} instead of 1")]
	NotNormalized(f32),
}

/// Top class and full distribution for a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
	index: usize,
	probabilities: Vec<f32>,
}

impl Prediction {
	/// Build a prediction from a softmax output.
	///
	/// # Errors
	///
	/// Returns an error if the distribution does not have one entry per class label,
	/// contains values outside [0, 1], or does not sum to 1.
	pub fn from_probabilities(probabilities: Vec<f32>) -> Result<Self, PredictionError> {
		if probabilities.len() != NUM_CLASSES {
			return Err(PredictionError::WrongWidth(probabilities.len()));
		}

		if let Some(i) = probabilities
			.iter()
			.position(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
		{
			return Err(PredictionError::OutOfRange(i));
		}

		let sum: f32 = probabilities.iter().sum();
		if (sum - 1.0).abs() > SUM_TOLERANCE {
			return Err(PredictionError::NotNormalized(sum));
		}

		// first index wins on ties
		let index = probabilities
			.iter()
			.enumerate()
			.fold(0, |best, (i, p)| if *p > probabilities[best] { i } else { best });

		Ok(Self {
			index,
			probabilities,
		})
	}

	#[must_use]
	pub const fn index(&self) -> usize {
		self.index
	}

	#[must_use]
	pub const fn label(&self) -> &'static str {
		CLASS_LABELS[self.index]
	}

	#[must_use]
	pub fn probability(&self) -> f32 {
		self.probabilities[self.index]
	}

	/// Top-class probability as a percentage rounded to 2 decimals.
	#[must_use]
	pub fn confidence(&self) -> f64 {
		percentage(self.probability())
	}

	/// Every class label mapped to its rounded percentage, in label order.
	#[must_use]
	pub fn percentages(&self) -> IndexMap<String, f64> {
		CLASS_LABELS
			.iter()
			.zip(&self.probabilities)
			.map(|(label, p)| ((*label).to_string(), percentage(*p)))
			.collect()
	}
}

/// Convert a probability to a percentage with 2 decimal places.
#[must_use]
pub fn percentage(probability: f32) -> f64 {
	(f64::from(probability) * 100.0 * 100.0).round() / 100.0
}
