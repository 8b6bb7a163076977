use std::path::Path;

use egui::ColorImage;

use super::FormError;

/// Banner shown above the form when present.
pub const HEADER_IMAGE: &str = "palmer_penguin.png";
/// Picture shown before the first prediction.
pub const GENERIC_IMAGE: &str = "penguins.png";

/// Decode an image file into RGBA pixels egui can upload.
pub fn load_color_image(path: &Path) -> Result<ColorImage, FormError> {
    let image = image::open(path)
        .map_err(|source| FormError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        image.as_raw(),
    ))
}
