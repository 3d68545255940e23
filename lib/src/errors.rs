use axum::{
	extract::multipart::MultipartError,
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use waste_core::{http::ErrorResponse, ImageError};

use crate::inference::PredictError;

#[derive(Debug)]
pub struct HTTPError {
	detail: String,
	status_code: StatusCode,
}

impl HTTPError {
	pub fn new(detail: &str) -> Self {
		Self {
			detail: detail.to_string(),
			status_code: StatusCode::UNPROCESSABLE_ENTITY,
		}
	}

	#[must_use]
	pub const fn with_status(mut self, status_code: StatusCode) -> Self {
		self.status_code = status_code;
		self
	}

	#[must_use]
	pub const fn status(&self) -> StatusCode {
		self.status_code
	}
}

impl IntoResponse for HTTPError {
	fn into_response(self) -> Response {
		(
			self.status_code,
			Json(ErrorResponse {
				detail: self.detail,
			}),
		)
			.into_response()
	}
}

impl From<MultipartError> for HTTPError {
	fn from(e: MultipartError) -> Self {
		let status_code = match e.status() {
			StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
			_ => StatusCode::UNPROCESSABLE_ENTITY,
		};

		Self::new(&format!("Failed to read upload: {}", e.body_text())).with_status(status_code)
	}
}

impl From<ImageError> for HTTPError {
	fn from(e: ImageError) -> Self {
		let status_code = match e {
			ImageError::UnsupportedContentType(_) => StatusCode::BAD_REQUEST,
			ImageError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};

		Self::new(&e.to_string()).with_status(status_code)
	}
}

impl From<PredictError> for HTTPError {
	fn from(e: PredictError) -> Self {
		match e {
			PredictError::Image(e) => e.into(),
			PredictError::Inference(e) => {
				tracing::error!("Prediction failed: {e}");
				Self::new(&e.to_string()).with_status(StatusCode::INTERNAL_SERVER_ERROR)
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use waste_core::InferenceError;

	#[test]
	fn content_type_errors_are_bad_requests() {
		let error: HTTPError = ImageError::UnsupportedContentType(Some("text/plain".to_string())).into();

		assert_eq!(error.status(), StatusCode::BAD_REQUEST);
		assert_eq!(error.detail, "File must be an image");
	}

	#[test]
	fn inference_errors_are_server_errors() {
		let error: HTTPError =
			PredictError::Inference(InferenceError::Internal("task cancelled".to_string())).into();

		assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(error.detail, "Inference task failed: task cancelled");
	}

	#[test]
	fn errors_default_to_unprocessable() {
		assert_eq!(
			HTTPError::new("Missing `file` field").status(),
			StatusCode::UNPROCESSABLE_ENTITY
		);
	}
}
