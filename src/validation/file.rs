use tracing::debug;

use crate::error::{ValidationError, ValidationField};
use crate::image_processing;
use crate::job::SourceImage;

pub const SUPPORTED_FORMATS: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const MIN_IMAGE_DIMENSION: u32 = 64;
pub const MAX_IMAGE_DIMENSION: u32 = 2048;

pub fn validate_image_file(image: &SourceImage) -> Result<(), ValidationError> {
    if !SUPPORTED_FORMATS.contains(&image.mime_type.as_str()) {
        return Err(ValidationError::new(
            ValidationField::File,
            format!(
                "Unsupported file format. Supported formats: {}",
                SUPPORTED_FORMATS.join(", ")
            ),
        ));
    }

    if image.size() > MAX_FILE_SIZE {
        let max_mb = MAX_FILE_SIZE / (1024 * 1024);
        return Err(ValidationError::new(
            ValidationField::File,
            format!("File size must be less than {max_mb}MB"),
        ));
    }

    Ok(())
}

/// Decodes the upload on the blocking pool and checks its pixel size.
pub async fn validate_image_dimensions(image: &SourceImage) -> Result<(), ValidationError> {
    let bytes = image.bytes.clone();
    let mime_type = image.mime_type.clone();
    let decoded = tokio::task::spawn_blocking(move || {
        image_processing::get_dimensions(&bytes, &mime_type)
    })
    .await;

    let (width, height) = match decoded {
        Ok(Ok(dimensions)) => dimensions,
        Ok(Err(err)) => {
            debug!(file = %image.file_name, "image decode failed: {err}");
            return Err(invalid_image());
        }
        Err(err) => {
            debug!(file = %image.file_name, "image decode task failed: {err}");
            return Err(invalid_image());
        }
    };

    check_dimensions(width, height)
}

pub fn check_dimensions(width: u32, height: u32) -> Result<(), ValidationError> {
    if width < MIN_IMAGE_DIMENSION || height < MIN_IMAGE_DIMENSION {
        return Err(ValidationError::new(
            ValidationField::Dimensions,
            format!(
                "Image dimensions must be at least {MIN_IMAGE_DIMENSION}x{MIN_IMAGE_DIMENSION}"
            ),
        ));
    }
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(ValidationError::new(
            ValidationField::Dimensions,
            format!(
                "Image dimensions must not exceed {MAX_IMAGE_DIMENSION}x{MAX_IMAGE_DIMENSION}"
            ),
        ));
    }
    Ok(())
}

fn invalid_image() -> ValidationError {
    ValidationError::new(ValidationField::File, "Invalid image file")
}
