use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::CorsLayer;

use crate::context::AppContext;

pub mod predict;
pub mod system;

pub fn handler(ctx: AppContext, max_upload_bytes: usize) -> Router {
	Router::new()
		.merge(system::handler())
		.merge(predict::handler())
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.layer(CorsLayer::permissive())
		.with_state(ctx)
}
