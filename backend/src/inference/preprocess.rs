use std::path::Path;

use image::imageops::FilterType;
use ndarray::Array4;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("failed to read image file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decodes a persisted upload into the `[1, height, width, 3]` tensor the
/// convolutional model expects, with pixel values scaled to `[0, 1]`.
///
/// The format is sniffed from the file content so a mislabelled extension
/// does not matter. `size` is `[height, width]`.
pub fn image_tensor(path: &Path, size: [u32; 2]) -> Result<Array4<f32>, PreprocessError> {
    let [height, width] = size;
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    let rgb = img
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Array4::<f32>::zeros((1, height as usize, width as usize, 3));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for (channel, value) in pixel.0.iter().enumerate() {
            tensor[[0, y as usize, x as usize, channel]] = f32::from(*value) / 255.0;
        }
    }
    Ok(tensor)
}
