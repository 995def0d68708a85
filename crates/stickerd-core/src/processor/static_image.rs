//! Static sticker conversion: decode a raster image, optionally stretch to
//! the requested size, re-encode. Pure CPU work, no subprocess.

use std::io::Cursor;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};

use super::StickerProcessor;
use crate::error::ConvertError;
use crate::format::{InputFormat, OutputFormat};
use crate::types::CancelFlag;

const KIND: &str = "static";
const ALLOWED_INPUTS: &[InputFormat] = &[InputFormat::Png, InputFormat::Webp];
const ALLOWED_OUTPUTS: &[OutputFormat] =
    &[OutputFormat::Png, OutputFormat::Jpg, OutputFormat::Webp];

#[derive(Debug, Default)]
pub struct StaticProcessor;

#[async_trait]
impl StickerProcessor for StaticProcessor {
    async fn process(
        &self,
        data: Vec<u8>,
        input: InputFormat,
        output: OutputFormat,
        width: u32,
        height: u32,
        _cancel: CancelFlag,
    ) -> Result<Vec<u8>, ConvertError> {
        if !ALLOWED_INPUTS.contains(&input) {
            return Err(ConvertError::UnsupportedInput { input, kind: KIND });
        }
        if !ALLOWED_OUTPUTS.contains(&output) {
            return Err(ConvertError::UnsupportedOutput { output, kind: KIND });
        }

        tokio::task::spawn_blocking(move || {
            let mut img = image::load_from_memory(&data)
                .map_err(|e| ConvertError::Conversion(format!("failed to decode image: {e}")))?
                .to_rgba8();
            // Plain stretch to the exact target; zero dimensions keep the
            // native size.
            if width > 0 && height > 0 {
                img = image::imageops::resize(&img, width, height, FilterType::CatmullRom);
            }
            encode_rgba(img, output)
        })
        .await
        .map_err(|e| ConvertError::Conversion(format!("image task failed: {e}")))?
    }
}

/// Encode an RGBA buffer into the requested still-image container.
///
/// JPEG has no alpha channel, so that path flattens to RGB first.
pub(crate) fn encode_rgba(img: RgbaImage, output: OutputFormat) -> Result<Vec<u8>, ConvertError> {
    let mut cursor = Cursor::new(Vec::new());
    let encoded = match output {
        OutputFormat::Png => DynamicImage::ImageRgba8(img).write_to(&mut cursor, ImageFormat::Png),
        OutputFormat::Webp => {
            DynamicImage::ImageRgba8(img).write_to(&mut cursor, ImageFormat::WebP)
        }
        OutputFormat::Jpg => {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8())
                .write_to(&mut cursor, ImageFormat::Jpeg)
        }
        other => return Err(ConvertError::UnsupportedOutput { output: other, kind: KIND }),
    };
    encoded.map_err(|e| ConvertError::Conversion(format!("failed to encode {output}: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn webp_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 60, 30, 255]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::WebP)
            .expect("fixture encode");
        cursor.into_inner()
    }

    #[tokio::test]
    async fn webp_input_resized_to_png() {
        let out = StaticProcessor
            .process(
                webp_fixture(50, 50),
                InputFormat::Webp,
                OutputFormat::Png,
                100,
                100,
                CancelFlag::new(),
            )
            .await
            .expect("conversion should succeed");
        assert!(!out.is_empty());
        let decoded = image::load_from_memory(&out).expect("output must decode");
        assert_eq!(image::guess_format(&out).expect("format"), ImageFormat::Png);
        assert_eq!((decoded.width(), decoded.height()), (100, 100));
    }

    #[tokio::test]
    async fn zero_dimensions_keep_native_size() {
        let out = StaticProcessor
            .process(
                webp_fixture(40, 24),
                InputFormat::Webp,
                OutputFormat::Png,
                0,
                0,
                CancelFlag::new(),
            )
            .await
            .expect("conversion should succeed");
        let decoded = image::load_from_memory(&out).expect("output must decode");
        assert_eq!((decoded.width(), decoded.height()), (40, 24));
    }

    #[tokio::test]
    async fn jpeg_output_flattens_alpha() {
        let out = StaticProcessor
            .process(
                webp_fixture(16, 16),
                InputFormat::Webp,
                OutputFormat::Jpg,
                0,
                0,
                CancelFlag::new(),
            )
            .await
            .expect("jpeg conversion should succeed");
        assert_eq!(
            image::guess_format(&out).expect("format"),
            ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn rejects_non_raster_input() {
        let err = StaticProcessor
            .process(
                vec![1, 2, 3],
                InputFormat::Tgs,
                OutputFormat::Png,
                0,
                0,
                CancelFlag::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedInput { .. }));
    }

    #[tokio::test]
    async fn rejects_motion_output() {
        let err = StaticProcessor
            .process(
                webp_fixture(8, 8),
                InputFormat::Webp,
                OutputFormat::Mp4,
                0,
                0,
                CancelFlag::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedOutput { .. }));
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_with_conversion_error() {
        let err = StaticProcessor
            .process(
                vec![0xFF; 64],
                InputFormat::Png,
                OutputFormat::Png,
                0,
                0,
                CancelFlag::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Conversion(_)));
    }
}
