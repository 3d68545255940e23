use std::{
	io::Cursor,
	net::TcpListener,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	time::Duration,
};

use anyhow::{bail, Result};
use axum::{response::Response, Router};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use serde_json::Value;
use url::Url;
use waste_core::{Classifier, ImageTensor, ModelInfo, NUM_CLASSES};

use crate::{
	config::{InsightSettings, DEFAULT_INSIGHTS_MODEL},
	context::AppContext,
	insights::InsightClient,
	routes,
};

pub const BOUNDARY: &str = "waste-api-test-boundary";

enum Behaviour {
	Return(Vec<f32>),
	Fail(String),
	Panic,
}

/// Classifier double that counts forward passes.
pub struct StubClassifier {
	calls: AtomicUsize,
	behaviour: Behaviour,
}

impl StubClassifier {
	fn new(behaviour: Behaviour) -> Self {
		Self {
			calls: AtomicUsize::new(0),
			behaviour,
		}
	}

	pub fn favouring(index: usize) -> Self {
		let mut probabilities = vec![0.05; NUM_CLASSES];
		probabilities[index] = 0.6;

		Self::returning(probabilities)
	}

	pub fn returning(probabilities: Vec<f32>) -> Self {
		Self::new(Behaviour::Return(probabilities))
	}

	pub fn failing(message: &str) -> Self {
		Self::new(Behaviour::Fail(message.to_string()))
	}

	pub fn panicking() -> Self {
		Self::new(Behaviour::Panic)
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl Classifier for StubClassifier {
	fn info(&self) -> ModelInfo {
		ModelInfo {
			architecture: "stub".to_string(),
			classes: NUM_CLASSES,
			pruning_amount: 0.3,
		}
	}

	fn probabilities(&self, input: &ImageTensor) -> Result<Vec<f32>> {
		assert_eq!(input.as_slice().len(), 3 * 224 * 224);
		self.calls.fetch_add(1, Ordering::SeqCst);

		match &self.behaviour {
			Behaviour::Return(probabilities) => Ok(probabilities.clone()),
			Behaviour::Fail(message) => bail!("{message}"),
			Behaviour::Panic => panic!("backend exploded"),
		}
	}
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
	let mut bytes = Vec::new();
	DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 140, 60])))
		.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
		.unwrap();

	bytes
}

/// Encode a single-field multipart body.
pub fn multipart(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
	let mut body = format!(
		"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
	)
	.into_bytes();
	body.extend_from_slice(data);
	body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

	body
}

/// Serve `router` on an ephemeral local port and return its chat-completion URL.
pub async fn serve(router: Router) -> Url {
	let listener = TcpListener::bind("127.0.0.1:0").unwrap();
	listener.set_nonblocking(true).unwrap();
	let addr = listener.local_addr().unwrap();

	tokio::spawn(axum::Server::from_tcp(listener).unwrap().serve(router.into_make_service()));

	Url::parse(&format!("http://{addr}/api/v1/chat/completions")).unwrap()
}

/// A URL on a local port with nothing listening.
pub fn closed_port_endpoint() -> Url {
	let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

	Url::parse(&format!("http://{addr}/api/v1/chat/completions")).unwrap()
}

pub fn insight_settings(endpoint: Url) -> InsightSettings {
	InsightSettings {
		endpoint,
		api_key: "sk-test".to_string(),
		model: DEFAULT_INSIGHTS_MODEL.to_string(),
		referer: "http://localhost:8000".to_string(),
		timeout: Duration::from_secs(5),
	}
}

/// The full router backed by `classifier`, with insights fetched from `endpoint`.
pub fn app_with(classifier: Arc<dyn Classifier>, endpoint: Url) -> Router {
	app_with_limit(classifier, endpoint, 1024 * 1024)
}

/// Like [`app_with`], accepting uploads of at most `max_upload_bytes`.
pub fn app_with_limit(classifier: Arc<dyn Classifier>, endpoint: Url, max_upload_bytes: usize) -> Router {
	let insights = InsightClient::new(&insight_settings(endpoint)).unwrap();

	routes::handler(AppContext::new(classifier, insights), max_upload_bytes)
}

pub fn app() -> Router {
	app_with(Arc::new(StubClassifier::favouring(2)), closed_port_endpoint())
}

pub async fn body_json(response: Response) -> Value {
	let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();

	serde_json::from_slice(&bytes).unwrap()
}
