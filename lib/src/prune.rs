use tch::{nn::VarStore, Kind, TchError, Tensor};

/// Layer types whose weights take part in magnitude pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
	Conv2d,
	Linear,
}

impl LayerKind {
	// conv kernels are [out, in, kh, kw], linear weights are [out, in]
	const fn from_rank(rank: usize) -> Option<Self> {
		match rank {
			4 => Some(Self::Conv2d),
			2 => Some(Self::Linear),
			_ => None,
		}
	}
}

/// Handle to the weight tensor of a prunable layer. The tensor shares storage with the var store.
#[derive(Debug)]
pub struct PrunableLayer {
	pub name: String,
	pub kind: LayerKind,
	weight: Tensor,
}

impl PrunableLayer {
	#[must_use]
	pub const fn weight(&self) -> &Tensor {
		&self.weight
	}

	/// Fraction of exactly-zero weights.
	#[must_use]
	#[allow(clippy::cast_precision_loss)]
	pub fn sparsity(&self) -> f64 {
		let zeros = self.weight.eq(0.0).sum(Kind::Int64).int64_value(&[]);

		zeros as f64 / self.weight.numel() as f64
	}
}

/// Collect the convolution and linear weights of every layer registered in `vs`, sorted by name.
#[must_use]
pub fn collect_layers(vs: &VarStore) -> Vec<PrunableLayer> {
	let mut layers = vs
		.variables()
		.into_iter()
		.filter(|(name, _)| name == "weight" || name.ends_with(".weight"))
		.filter_map(|(name, weight)| {
			let kind = LayerKind::from_rank(weight.dim())?;
			Some(PrunableLayer { name, kind, weight })
		})
		.collect::<Vec<_>>();

	layers.sort_by(|a, b| a.name.cmp(&b.name));
	layers
}

pub trait LayerVisitor {
	/// Visit a single prunable layer
	///
	/// # Errors
	///
	/// Returns an error if the layer cannot be processed.
	fn visit(&mut self, layer: &PrunableLayer) -> Result<(), TchError>;

	/// Visit every layer in order, stopping at the first error
	///
	/// # Errors
	///
	/// Returns the first error raised by [`LayerVisitor::visit`].
	fn visit_all(&mut self, layers: &[PrunableLayer]) -> Result<(), TchError> {
		layers.iter().try_for_each(|layer| self.visit(layer))
	}
}

/// One-shot L1 unstructured pruning with the mask baked into the weights.
#[derive(Debug, Clone, Default)]
pub struct L1Unstructured {
	amount: f64,
	layers: usize,
	pruned: i64,
}

impl L1Unstructured {
	#[must_use]
	pub const fn new(amount: f64) -> Self {
		Self {
			amount,
			layers: 0,
			pruned: 0,
		}
	}

	#[must_use]
	pub const fn layers(&self) -> usize {
		self.layers
	}

	#[must_use]
	pub const fn pruned(&self) -> i64 {
		self.pruned
	}
}

impl LayerVisitor for L1Unstructured {
	fn visit(&mut self, layer: &PrunableLayer) -> Result<(), TchError> {
		let pruned = l1_unstructured(&layer.weight, self.amount)?;
		tracing::trace!("Pruned {pruned} weights from {} ({:?})", layer.name, layer.kind);

		self.layers += 1;
		self.pruned += pruned;

		Ok(())
	}
}

/// Zero the `amount` fraction of `weight` entries with the smallest absolute value, in place.
/// Returns the number of zeroed entries.
///
/// # Errors
///
/// Returns an error if the tensor is not contiguous or a libtorch operation fails.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn l1_unstructured(weight: &Tensor, amount: f64) -> Result<i64, TchError> {
	let count = (amount * weight.numel() as f64).round() as i64;
	if count == 0 {
		return Ok(0);
	}

	tch::no_grad(|| {
		let mut flat = weight.f_view([-1])?;
		let (_, indices) = flat.f_abs()?.f_topk(count, 0, false, false)?;
		flat.f_index_fill_(0, &indices, 0.0)?;

		Ok(count)
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use tch::{nn, Device};

	fn values(tensor: &Tensor) -> Vec<f32> {
		Vec::<f32>::try_from(&tensor.view([-1])).unwrap()
	}

	#[test]
	fn zeroes_the_smallest_magnitudes() {
		let weight = Tensor::from_slice(&[0.5f32, -0.1, 0.9, 0.05, -0.7, 0.3, -0.02, 0.8, 0.6, -0.4]);

		let pruned = l1_unstructured(&weight, 0.3).unwrap();

		assert_eq!(pruned, 3);
		assert_eq!(
			values(&weight),
			vec![0.5, 0.0, 0.9, 0.0, -0.7, 0.3, 0.0, 0.8, 0.6, -0.4]
		);
	}

	#[test]
	fn rounds_the_number_of_pruned_weights() {
		let weight = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0]).view([2, 2]);

		assert_eq!(l1_unstructured(&weight, 0.3).unwrap(), 1);
		assert_eq!(values(&weight), vec![0.0, 2.0, 3.0, 4.0]);
	}

	#[test]
	fn zero_amount_is_a_no_op() {
		let weight = Tensor::from_slice(&[1.0f32, -2.0, 3.0]);

		assert_eq!(l1_unstructured(&weight, 0.0).unwrap(), 0);
		assert_eq!(values(&weight), vec![1.0, -2.0, 3.0]);
	}

	#[test]
	fn collects_only_conv_and_linear_weights() {
		let vs = VarStore::new(Device::Cpu);
		let root = vs.root();
		let _conv = nn::conv2d(&root / "conv", 3, 4, 3, nn::ConvConfig::default());
		let _bn = nn::batch_norm2d(&root / "bn", 4, nn::BatchNormConfig::default());
		let _fc = nn::linear(&root / "fc", 4, 2, nn::LinearConfig::default());

		let layers = collect_layers(&vs);

		assert_eq!(
			layers
				.iter()
				.map(|l| (l.name.as_str(), l.kind))
				.collect::<Vec<_>>(),
			vec![("conv.weight", LayerKind::Conv2d), ("fc.weight", LayerKind::Linear)]
		);
	}

	#[test]
	fn pruning_a_layer_updates_the_var_store() {
		let vs = VarStore::new(Device::Cpu);
		let _fc = nn::linear(&vs.root() / "fc", 10, 10, nn::LinearConfig::default());

		let layers = collect_layers(&vs);
		let mut pruner = L1Unstructured::new(0.3);
		pruner.visit_all(&layers).unwrap();

		assert_eq!(pruner.layers(), 1);
		assert_eq!(pruner.pruned(), 30);

		let variables = vs.variables();
		let zeros = values(&variables["fc.weight"]).iter().filter(|v| **v == 0.0).count();
		assert_eq!(zeros, 30);
		assert!((layers[0].sparsity() - 0.3).abs() < 1e-9);
	}
}
