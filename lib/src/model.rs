use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use tch::{
	nn::{self, FuncT, ModuleT, VarStore},
	vision::resnet,
	Device, Kind, Tensor,
};
use waste_core::{Classifier, ImageTensor, ModelInfo, NUM_CLASSES};

use crate::{
	config::{validate_pruning_amount, ConfigError},
	prune::{collect_layers, L1Unstructured, LayerVisitor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
	ResNet34,
	ResNet50,
}

impl Architecture {
	#[must_use]
	pub const fn name(self) -> &'static str {
		match self {
			Self::ResNet34 => "resnet34",
			Self::ResNet50 => "resnet50",
		}
	}

	/// Width of the pooled features entering the classification head.
	const fn features(self) -> i64 {
		match self {
			Self::ResNet34 => 512,
			Self::ResNet50 => 2048,
		}
	}

	fn backbone(self, p: &nn::Path) -> FuncT<'static> {
		match self {
			Self::ResNet34 => resnet::resnet34_no_final_layer(p),
			Self::ResNet50 => resnet::resnet50_no_final_layer(p),
		}
	}
}

impl TryFrom<u32> for Architecture {
	type Error = ConfigError;

	fn try_from(size: u32) -> Result<Self, Self::Error> {
		match size {
			34 => Ok(Self::ResNet34),
			50 => Ok(Self::ResNet50),
			other => Err(ConfigError::UnsupportedArchitecture(other)),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("Failed to prune model: {0}")]
	Prune(#[from] tch::TchError),
}

/// A randomly initialised, pruned ResNet with a waste classification head.
pub struct ResNetClassifier {
	device: Device,
	info: ModelInfo,
	net: Mutex<FuncT<'static>>,
	_vs: VarStore,
}

impl std::fmt::Debug for ResNetClassifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResNetClassifier")
			.field("device", &self.device)
			.field("info", &self.info)
			.finish_non_exhaustive()
	}
}

/// Build the classifier on the best available device.
///
/// # Errors
///
/// Returns an error if `resnet_size` is not 34 or 50, the pruning fraction is outside [0, 1], or pruning fails.
pub fn build_classifier(
	resnet_size: u32,
	num_classes: i64,
	pruning_fraction: f64,
) -> Result<ResNetClassifier, BuildError> {
	let architecture = Architecture::try_from(resnet_size)?;
	let pruning_amount = validate_pruning_amount(pruning_fraction)?;

	ResNetClassifier::build(architecture, pruning_amount, num_classes, Device::cuda_if_available())
}

impl ResNetClassifier {
	/// Build the backbone, replace its head, prune every conv/linear layer and freeze the weights.
	/// `pruning_amount` must already lie in [0, 1].
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn build(
		architecture: Architecture,
		pruning_amount: f64,
		num_classes: i64,
		device: Device,
	) -> Result<Self, BuildError> {
		let mut vs = VarStore::new(device);
		let root = vs.root();
		let backbone = architecture.backbone(&root);
		let head = nn::linear(&root / "fc", architecture.features(), num_classes, nn::LinearConfig::default());
		let net = nn::func_t(move |xs, train| xs.apply_t(&backbone, train).apply(&head));

		let layers = collect_layers(&vs);
		let mut pruner = L1Unstructured::new(pruning_amount);
		pruner.visit_all(&layers)?;
		vs.freeze();

		tracing::info!(
			"Built {} with {num_classes} classes on {device:?}: pruned {} weights across {} layers",
			architecture.name(),
			pruner.pruned(),
			pruner.layers(),
		);

		Ok(Self {
			device,
			net: Mutex::new(net),
			info: ModelInfo {
				architecture: architecture.name().to_string(),
				classes: num_classes as usize,
				pruning_amount,
			},
			_vs: vs,
		})
	}
}

impl Classifier for ResNetClassifier {
	fn info(&self) -> ModelInfo {
		self.info.clone()
	}

	#[allow(clippy::cast_possible_wrap)]
	fn probabilities(&self, input: &ImageTensor) -> Result<Vec<f32>> {
		let [channels, height, width] = ImageTensor::SHAPE.map(|d| d as i64);
		let xs = Tensor::from_slice(input.as_slice())
			.f_view([1, channels, height, width])?
			.to_device(self.device);

		// weights are frozen; a poisoned lock guards nothing
		let net = self.net.lock().unwrap_or_else(PoisonError::into_inner);
		let probabilities = tch::no_grad(|| net.forward_t(&xs, false).f_softmax(-1, Kind::Float))?;
		drop(net);

		let probabilities = probabilities.to_device(Device::Cpu).f_view([-1])?;
		let probabilities = Vec::<f32>::try_from(&probabilities)?;

		if probabilities.len() != NUM_CLASSES {
			tracing::warn!("Model returned {} scores for {NUM_CLASSES} labels", probabilities.len());
		}

		Ok(probabilities)
	}
}
