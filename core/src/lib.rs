#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod classifier;
pub mod http;
pub mod labels;
pub mod prediction;
pub mod transform;

pub use classifier::{Classifier, InferenceError, ModelInfo};
pub use labels::{CLASS_LABELS, NUM_CLASSES};
pub use prediction::{Prediction, PredictionError};
pub use transform::{ImageError, ImageTensor};
