//! User-facing message constants.

pub const SAVE: &str = "Saved.";
pub const OVER_IMAGE_SIZE: &str = "Image must be 5 MB or smaller.";
pub const RECOMMENDED_SIZE: &str = "Recommended size: 480 x 480 px";
pub const SELECT_AREA: &str = "Select the area to keep";
pub const REMOVE_IMAGE: &str = "✕ Remove";
