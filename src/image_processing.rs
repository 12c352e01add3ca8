use std::io::Cursor;

use anyhow::{Result, anyhow};
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};

pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    None
}

pub fn mime_to_format(mime_type: &str) -> Result<ImageFormat> {
    match mime_type {
        "image/png" => Ok(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Ok(ImageFormat::Jpeg),
        "image/webp" => Ok(ImageFormat::WebP),
        "image/gif" => Ok(ImageFormat::Gif),
        _ => Err(anyhow!("unsupported mime type: {mime_type}")),
    }
}

/// Fully decodes the image and reports its pixel size.
///
/// Falls back to sniffing the bytes when the declared MIME type is not one we decode.
pub fn get_dimensions(bytes: &[u8], mime_type: &str) -> Result<(u32, u32)> {
    let format = match mime_to_format(mime_type) {
        Ok(format) => format,
        Err(_) => image::guess_format(bytes).map_err(|err| anyhow!("unknown image format: {err}"))?,
    };
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| anyhow!("decode image failed: {err}"))?;
    Ok(image.dimensions())
}

pub fn encode_solid_png(width: u32, height: u32, color: [u8; 3]) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(anyhow!("cannot encode an empty {width}x{height} image"));
    }
    let canvas = RgbImage::from_pixel(width, height, Rgb(color));
    let mut output = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|err| anyhow!("encode png failed: {err}"))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_roundtrip_dimensions() {
        let png = encode_solid_png(96, 64, [10, 20, 30]).unwrap();
        assert_eq!(detect_mime_type(&png), Some("image/png"));
        assert_eq!(get_dimensions(&png, "image/png").unwrap(), (96, 64));
    }

    #[test]
    fn test_dimensions_with_wrong_declared_mime() {
        let png = encode_solid_png(80, 80, [0, 0, 0]).unwrap();
        assert_eq!(get_dimensions(&png, "application/octet-stream").unwrap(), (80, 80));
    }

    #[test]
    fn test_garbage_is_not_an_image() {
        assert!(get_dimensions(b"definitely not pixels", "image/png").is_err());
        assert_eq!(detect_mime_type(b"nope"), None);
    }

    #[test]
    fn test_webp_magic() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(detect_mime_type(&bytes), Some("image/webp"));
    }
}
