//! Bitmap-to-blob encoding

use image::{ImageEncoder, RgbaImage};
use scrawl_core::error::{ExportError, Result};
use scrawl_core::types::{BitmapData, ExportResult};
use scrawl_core::ExportFormat;

/// Encodes rendered pages into downloadable blobs
///
/// Stateless apart from defaults; safe to share by reference.
pub struct PageExporter {
    default_format: ExportFormat,
    default_quality: f32,
}

impl PageExporter {
    pub fn new() -> Self {
        Self {
            default_format: ExportFormat::Png,
            default_quality: 0.92,
        }
    }

    pub fn with_defaults(format: ExportFormat, quality: f32) -> Self {
        Self {
            default_format: format,
            default_quality: clamp_quality(quality),
        }
    }

    /// The preferred format on this build: WebP compresses best, PNG is
    /// the universal fallback, JPEG last since it loses the paper grain.
    pub fn optimal_format(&self) -> ExportFormat {
        ExportFormat::Webp
    }

    /// Encode one page. Failures are reported in the result, never
    /// panicked; the blob is `None` exactly when `success` is false.
    pub fn to_blob(&self, bitmap: &BitmapData, format: ExportFormat, quality: f32) -> ExportResult {
        let quality = clamp_quality(quality);
        match encode(bitmap, format, quality) {
            Ok(blob) => ExportResult {
                size: blob.len(),
                blob: Some(blob),
                format,
                width: bitmap.width,
                height: bitmap.height,
                success: true,
                error: None,
            },
            Err(e) => {
                log::warn!("export to {format:?} failed: {e}");
                ExportResult {
                    blob: None,
                    format,
                    size: 0,
                    width: bitmap.width,
                    height: bitmap.height,
                    success: false,
                    error: Some(e.to_string()),
                }
            },
        }
    }

    /// Encode with this exporter's default format and quality.
    pub fn to_blob_default(&self, bitmap: &BitmapData) -> ExportResult {
        self.to_blob(bitmap, self.default_format, self.default_quality)
    }

    /// Encode every page, one result per page. A page that fails leaves
    /// its error in place and the batch carries on.
    pub fn batch_to_blobs(
        &self,
        pages: &[BitmapData],
        format: ExportFormat,
        quality: f32,
    ) -> Vec<ExportResult> {
        pages
            .iter()
            .map(|page| self.to_blob(page, format, quality))
            .collect()
    }
}

impl Default for PageExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_quality(quality: f32) -> f32 {
    if quality.is_finite() {
        quality.clamp(0.1, 1.0)
    } else {
        0.92
    }
}

fn validate(bitmap: &BitmapData) -> Result<RgbaImage> {
    if bitmap.width == 0 || bitmap.height == 0 {
        return Err(ExportError::CanvasValidation(format!(
            "zero-sized page {}x{}",
            bitmap.width, bitmap.height
        ))
        .into());
    }
    let expected = bitmap.width as usize * bitmap.height as usize * 4;
    if bitmap.data.len() < expected {
        return Err(ExportError::CanvasValidation(format!(
            "pixel buffer holds {} bytes, {}x{} needs {}",
            bitmap.data.len(),
            bitmap.width,
            bitmap.height,
            expected
        ))
        .into());
    }
    RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.data[..expected].to_vec()).ok_or_else(
        || ExportError::ConversionFailed("could not build image buffer".to_string()).into(),
    )
}

fn encode(bitmap: &BitmapData, format: ExportFormat, quality: f32) -> Result<Vec<u8>> {
    let img = validate(bitmap)?;
    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                &mut out,
                image::codecs::png::CompressionType::Default,
                image::codecs::png::FilterType::Sub,
            );
            encoder
                .write_image(
                    img.as_raw(),
                    bitmap.width,
                    bitmap.height,
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| ExportError::ConversionFailed(e.to_string()))?;
        },
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut out,
                (quality * 100.0).round() as u8,
            );
            encoder
                .write_image(
                    rgb.as_raw(),
                    bitmap.width,
                    bitmap.height,
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| ExportError::ConversionFailed(e.to_string()))?;
        },
        ExportFormat::Webp => {
            // The image crate encodes WebP losslessly; quality does not apply
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut out);
            encoder
                .encode(
                    img.as_raw(),
                    bitmap.width,
                    bitmap.height,
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| ExportError::ConversionFailed(e.to_string()))?;
        },
    }
    if out.is_empty() {
        return Err(ExportError::ConversionFailed("encoder produced no bytes".to_string()).into());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(w: u32, h: u32) -> BitmapData {
        BitmapData::new(w, h, vec![180u8; (w * h * 4) as usize])
    }

    #[test]
    fn png_export_round_trips_through_a_decoder() {
        let exporter = PageExporter::new();
        let result = exporter.to_blob(&page(12, 9), ExportFormat::Png, 1.0);
        assert!(result.success);
        let blob = result.blob.unwrap();
        let decoded = image::load_from_memory(&blob).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 9));
    }

    #[test]
    fn jpeg_and_webp_both_encode() {
        let exporter = PageExporter::new();
        for format in [ExportFormat::Jpeg, ExportFormat::Webp] {
            let result = exporter.to_blob(&page(8, 8), format, 0.8);
            assert!(result.success, "{format:?} failed: {:?}", result.error);
            assert!(result.size > 0);
        }
    }

    #[test]
    fn zero_sized_pages_fail_without_panicking() {
        let exporter = PageExporter::new();
        let result = exporter.to_blob(&BitmapData::new(0, 10, vec![]), ExportFormat::Png, 1.0);
        assert!(!result.success);
        assert!(result.blob.is_none());
        assert!(result.error.unwrap().contains("zero-sized"));
    }

    #[test]
    fn short_pixel_buffers_are_rejected() {
        let exporter = PageExporter::new();
        let bad = BitmapData::new(10, 10, vec![0u8; 16]);
        let result = exporter.to_blob(&bad, ExportFormat::Png, 1.0);
        assert!(!result.success);
    }

    #[test]
    fn batch_continues_past_failures() {
        let exporter = PageExporter::new();
        let pages = vec![page(4, 4), BitmapData::new(0, 0, vec![]), page(4, 4)];
        let results = exporter.batch_to_blobs(&pages, ExportFormat::Png, 1.0);
        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[2].success);
    }

    #[test]
    fn quality_is_clamped_into_range() {
        let exporter = PageExporter::new();
        // Out-of-range quality must not panic the jpeg encoder
        let result = exporter.to_blob(&page(4, 4), ExportFormat::Jpeg, 7.0);
        assert!(result.success);
        let result = exporter.to_blob(&page(4, 4), ExportFormat::Jpeg, f32::NAN);
        assert!(result.success);
    }
}
