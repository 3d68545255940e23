use axum::{extract::State, routing::get, Json, Router};
use waste_core::http::{Health, HealthCheck, RootResponse};

use crate::context::AppContext;

pub fn handler() -> Router<AppContext> {
	Router::new()
		.route("/", get(root))
		.route("/health-check", get(health_check))
}

#[allow(clippy::unused_async)]
pub async fn root() -> Json<RootResponse> {
	Json(RootResponse::default())
}

#[allow(clippy::unused_async)]
pub async fn health_check(State(ctx): State<AppContext>) -> Json<HealthCheck> {
	Json(HealthCheck {
		status: Health::Ready,
		model: ctx.classifier.info(),
	})
}
