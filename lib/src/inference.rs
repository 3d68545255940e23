use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use waste_core::{Classifier, ImageError, ImageTensor, InferenceError, Prediction};

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
	#[error(transparent)]
	Image(#[from] ImageError),

	#[error(transparent)]
	Inference(#[from] InferenceError),
}

fn with_timing<T>(cb: impl FnOnce() -> T) -> (T, Duration) {
	let start = Instant::now();
	let result = cb();

	(result, start.elapsed())
}

/// Decode, preprocess and classify an uploaded image.
///
/// # Errors
///
/// Returns [`PredictError::Image`] for undecodable bytes and [`PredictError::Inference`] if the forward pass fails.
pub fn predict(classifier: &dyn Classifier, bytes: &[u8]) -> Result<Prediction, PredictError> {
	let input = ImageTensor::from_bytes(bytes)?;

	let (probabilities, elapsed) = with_timing(|| classifier.probabilities(&input));
	let prediction = Prediction::from_probabilities(probabilities.map_err(InferenceError::Backend)?)
		.map_err(InferenceError::Output)?;

	tracing::debug!(
		"Predicted {} ({:.2}%) in {elapsed:?}",
		prediction.label(),
		prediction.confidence()
	);

	Ok(prediction)
}

/// Run [`predict`] on the blocking thread pool.
///
/// # Errors
///
/// Returns the errors of [`predict`], or [`InferenceError::Internal`] if the blocking task panics or is cancelled.
pub async fn predict_blocking(
	classifier: Arc<dyn Classifier>,
	bytes: Vec<u8>,
) -> Result<Prediction, PredictError> {
	tokio::task::spawn_blocking(move || predict(classifier.as_ref(), &bytes))
		.await
		.map_err(|e| InferenceError::Internal(e.to_string()))?
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_helpers::{png, StubClassifier};

	#[test]
	fn classifies_a_decodable_image() {
		let classifier = StubClassifier::favouring(6);

		let prediction = predict(&classifier, &png(40, 30)).unwrap();

		assert_eq!(prediction.label(), "Plastic");
		assert_eq!(classifier.calls(), 1);
	}

	#[test]
	fn corrupt_bytes_never_reach_the_model() {
		let classifier = StubClassifier::favouring(0);

		assert!(matches!(
			predict(&classifier, b"definitely not an image"),
			Err(PredictError::Image(ImageError::Decode(_)))
		));
		assert_eq!(classifier.calls(), 0);
	}

	#[test]
	fn backend_failures_are_inference_errors() {
		let classifier = StubClassifier::failing("CUDA out of memory");

		assert!(matches!(
			predict(&classifier, &png(8, 8)),
			Err(PredictError::Inference(InferenceError::Backend(e))) if e.to_string() == "CUDA out of memory"
		));
	}

	#[test]
	fn malformed_outputs_are_inference_errors() {
		let classifier = StubClassifier::returning(vec![0.5, 0.5]);

		assert!(matches!(
			predict(&classifier, &png(8, 8)),
			Err(PredictError::Inference(InferenceError::Output(_)))
		));
	}

	#[tokio::test]
	async fn panics_in_the_backend_are_contained() {
		let classifier = Arc::new(StubClassifier::panicking());

		assert!(matches!(
			predict_blocking(classifier, png(8, 8)).await,
			Err(PredictError::Inference(InferenceError::Internal(_)))
		));
	}
}
