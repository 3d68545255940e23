use axum::{
	extract::{Multipart, State},
	routing::post,
	Json, Router,
};
use waste_core::{http::PredictResponse, transform::ensure_image};

use crate::{context::AppContext, errors::HTTPError, inference::predict_blocking};

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

pub fn handler() -> Router<AppContext> {
	Router::new().route("/predict", post(predict))
}

struct Upload {
	filename: Option<String>,
	bytes: Vec<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, HTTPError> {
	while let Some(field) = multipart.next_field().await? {
		if field.name() != Some(FILE_FIELD) {
			continue;
		}

		// reject before buffering the body
		ensure_image(field.content_type())?;

		return Ok(Upload {
			filename: field.file_name().map(str::to_string),
			bytes: field.bytes().await?.to_vec(),
		});
	}

	Err(HTTPError::new("Missing `file` field in multipart upload"))
}

pub async fn predict(
	State(ctx): State<AppContext>,
	mut multipart: Multipart,
) -> Result<Json<PredictResponse>, HTTPError> {
	let upload = read_upload(&mut multipart).await?;
	tracing::debug!(
		"Received {} bytes for prediction{}",
		upload.bytes.len(),
		upload
			.filename
			.as_ref()
			.map_or(String::new(), |name| format!(" ({name})"))
	);

	let prediction = predict_blocking(ctx.classifier.clone(), upload.bytes).await?;
	let insights = ctx.insights.insights(prediction.label()).await;

	Ok(Json(PredictResponse::new(
		&prediction,
		upload.filename,
		insights,
	)))
}
