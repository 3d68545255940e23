use std::sync::Arc;

use waste_core::Classifier;

use crate::insights::InsightClient;

/// Immutable state shared by every request handler.
#[derive(Clone)]
pub struct AppContext {
	pub classifier: Arc<dyn Classifier>,
	pub insights: InsightClient,
}

impl AppContext {
	pub fn new(classifier: Arc<dyn Classifier>, insights: InsightClient) -> Self {
		Self {
			classifier,
			insights,
		}
	}
}
