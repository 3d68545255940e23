use image::{imageops::FilterType, DynamicImage, RgbImage};

/// Shorter side length after the initial resize.
pub const RESIZE: u32 = 256;
/// Side length of the square center crop fed to the network.
pub const CROP: u32 = 224;

/// Per-channel statistics of the backbone's training distribution.
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
	#[error("File must be an image")]
	UnsupportedContentType(Option<String>),

	#[error("Failed to decode image: {0}")]
	Decode(#[from] image::ImageError),
}

/// Reject uploads whose declared content type is not `image/*`.
///
/// # Errors
///
/// Returns [`ImageError::UnsupportedContentType`] for missing or non-image content types.
pub fn ensure_image(content_type: Option<&str>) -> Result<(), ImageError> {
	match content_type {
		Some(mime) if mime.trim().to_ascii_lowercase().starts_with("image/") => Ok(()),
		other => Err(ImageError::UnsupportedContentType(other.map(str::to_string))),
	}
}

/// Normalized CHW float buffer, ready to be batched into a `1x3x224x224` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
	data: Vec<f32>,
}

impl ImageTensor {
	pub const SHAPE: [usize; 3] = [3, CROP as usize, CROP as usize];

	/// Decode raw bytes and run the full preprocessing pipeline.
	///
	/// # Errors
	///
	/// Returns an error if the bytes are not a decodable image.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
		let image = image::load_from_memory(bytes)?;

		Ok(Self::from_image(&image))
	}

	#[must_use]
	pub fn from_image(image: &DynamicImage) -> Self {
		let rgb = center_crop(&resize_shorter_side(&image.to_rgb8(), RESIZE), CROP);

		Self {
			data: normalize(&rgb),
		}
	}

	#[must_use]
	pub fn zeros() -> Self {
		Self {
			data: vec![0.0; Self::SHAPE.iter().product()],
		}
	}

	#[must_use]
	pub fn as_slice(&self) -> &[f32] {
		&self.data
	}
}

fn resize_shorter_side(image: &RgbImage, target: u32) -> RgbImage {
	let (width, height) = image.dimensions();
	let (width, height) = if width <= height {
		(target, scale(height, target, width))
	} else {
		(scale(width, target, height), target)
	};

	image::imageops::resize(image, width, height, FilterType::Triangle)
}

// long side scaled by target/short, truncated
#[allow(clippy::cast_possible_truncation)]
fn scale(long: u32, target: u32, short: u32) -> u32 {
	((u64::from(long) * u64::from(target)) / u64::from(short.max(1))).max(1) as u32
}

fn center_crop(image: &RgbImage, size: u32) -> RgbImage {
	let (width, height) = image.dimensions();

	image::imageops::crop_imm(image, crop_offset(width, size), crop_offset(height, size), size, size).to_image()
}

// half the margin, rounding .5 to even
const fn crop_offset(length: u32, size: u32) -> u32 {
	let margin = length.saturating_sub(size);
	let half = margin / 2;

	if margin % 2 == 1 && half % 2 == 1 {
		half + 1
	} else {
		half
	}
}

fn normalize(image: &RgbImage) -> Vec<f32> {
	let plane = (image.width() * image.height()) as usize;
	let mut data = vec![0.0; 3 * plane];

	for (i, pixel) in image.pixels().enumerate() {
		for channel in 0..3 {
			let value = f32::from(pixel[channel]) / 255.0;
			data[channel * plane + i] = (value - MEAN[channel]) / STD[channel];
		}
	}

	data
}
