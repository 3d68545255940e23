/// Waste categories, index-aligned with the classifier's output layer.
pub const CLASS_LABELS: [&str; 9] = [
	"Cardboard",
	"Food Organics",
	"Glass",
	"Metal",
	"Miscellaneous Trash",
	"Paper",
	"Plastic",
	"Textile Trash",
	"Vegetation",
];

pub const NUM_CLASSES: usize = CLASS_LABELS.len();
