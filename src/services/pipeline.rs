// src/services/pipeline.rs
use crate::errors::GenlyzError;
use crate::models::{
    JPEG, NormalizedAsset, SizeReport, SourceAsset, is_accepted_media_type, is_image_media_type,
};
use bytes::Bytes;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use log::info;

/// Hard cap on what the gate will submit. The endpoint itself rejects
/// anything over 6 MiB, so every upload that clears this cap is
/// acceptable server-side.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Quality used when converting a non-JPEG/PNG image to JPEG.
const CONVERT_QUALITY: u8 = 92;

const MIB: usize = 1024 * 1024;

/// JPEG quality for one compression pass, a pure function of the byte
/// size entering the reducer. Below every tier the lightest quality
/// applies, which is only reachable when the cap is lowered for tests.
pub fn quality_for_size(bytes: usize) -> u8 {
    if bytes > 15 * MIB {
        50
    } else if bytes > 10 * MIB {
        60
    } else {
        70
    }
}

/// Format normalizer and size reducer. The gate drives the two steps
/// separately; `process` composes them for callers that do not track
/// intermediate state.
pub struct ImagePipeline {
    max_bytes: usize,
}

impl ImagePipeline {
    pub fn new() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_max_bytes(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn needs_conversion(&self, asset: &SourceAsset) -> bool {
        !is_accepted_media_type(&asset.media_type)
    }

    /// Format normalization, convert anything that is not already
    /// JPEG/PNG through a decode/re-encode cycle at high quality.
    pub fn convert_to_jpeg(&self, asset: SourceAsset) -> Result<SourceAsset, GenlyzError> {
        info!(
            "converting {} ({}) to JPEG at quality {}",
            asset.name, asset.media_type, CONVERT_QUALITY
        );
        let img = decode(&asset.data)?;
        let data = encode_jpeg(&img, CONVERT_QUALITY)?;
        Ok(SourceAsset::new(asset.name, JPEG, data))
    }

    /// Size reduction for a format-compliant asset: a no-op at or
    /// under the cap (the output bytes share the input allocation),
    /// otherwise exactly one compression pass at a tier-selected
    /// quality, failing closed if the result is still over the cap.
    pub fn reduce(&self, asset: SourceAsset) -> Result<(NormalizedAsset, SizeReport), GenlyzError> {
        // `image/jpg` is a nonstandard alias some hosts report.
        let media_type = if asset.media_type == "image/jpg" {
            JPEG.to_string()
        } else {
            asset.media_type
        };

        let original = asset.data.len();
        if original <= self.max_bytes {
            return Ok((
                NormalizedAsset::new(asset.name, media_type, asset.data),
                SizeReport::passthrough(original),
            ));
        }

        let quality = quality_for_size(original);
        info!(
            "{} is {} bytes, compressing once at quality {}",
            asset.name, original, quality
        );
        let img = decode(&asset.data)?;
        let compressed = encode_jpeg(&img, quality)?;
        if compressed.len() > self.max_bytes {
            return Err(GenlyzError::TooLarge {
                original,
                compressed: compressed.len(),
                limit: self.max_bytes,
            });
        }

        let report = SizeReport {
            original_bytes: original,
            final_bytes: compressed.len(),
            quality: Some(quality),
        };
        Ok((NormalizedAsset::new(asset.name, JPEG, compressed), report))
    }

    /// Full normalization in one call: media-type check, optional
    /// JPEG conversion, then the size step.
    pub fn process(
        &self,
        asset: SourceAsset,
    ) -> Result<(NormalizedAsset, SizeReport), GenlyzError> {
        if !is_image_media_type(&asset.media_type) {
            return Err(GenlyzError::InvalidFileType(asset.media_type));
        }
        let asset = if self.needs_conversion(&asset) {
            self.convert_to_jpeg(asset)?
        } else {
            asset
        };
        self.reduce(asset)
    }
}

impl Default for ImagePipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, GenlyzError> {
    image::load_from_memory(data).map_err(|e| GenlyzError::Decode(e.to_string()))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, GenlyzError> {
    // The JPEG encoder takes RGB; alpha is flattened the same way a
    // canvas draw would discard it.
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut out);
    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| GenlyzError::Encode(e.to_string()))?;
    Ok(Bytes::from(out))
}

#[cfg(test)]
pub(crate) mod test_images {
    use super::*;
    use image::{ImageOutputFormat, RgbImage};

    pub fn solid_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb([120, 80, 40])))
    }

    pub fn encode_as(img: &DynamicImage, format: ImageOutputFormat) -> Bytes {
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), format)
            .unwrap();
        Bytes::from(out)
    }
}

#[cfg(test)]
mod tests {
    use super::test_images::{encode_as, solid_image};
    use super::*;
    use crate::models::PNG;
    use image::ImageOutputFormat;

    #[test]
    fn quality_tiers() {
        assert_eq!(quality_for_size(20 * MIB), 50);
        assert_eq!(quality_for_size(15 * MIB + 1), 50);
        assert_eq!(quality_for_size(15 * MIB), 60);
        assert_eq!(quality_for_size(12 * MIB), 60);
        assert_eq!(quality_for_size(10 * MIB), 70);
        assert_eq!(quality_for_size(7 * MIB), 70);
    }

    #[test]
    fn compliant_asset_passes_through_unchanged() {
        let data = encode_as(&solid_image(16, 16), ImageOutputFormat::Png);
        let ptr = data.as_ptr();
        let pipeline = ImagePipeline::new();
        let (asset, report) = pipeline
            .process(SourceAsset::new("a.png", PNG, data))
            .unwrap();
        // Same allocation, no re-encode.
        assert_eq!(asset.data.as_ptr(), ptr);
        assert_eq!(asset.media_type, PNG);
        assert!(!report.was_compressed());
        assert_eq!(report.original_bytes, report.final_bytes);
    }

    #[test]
    fn jpg_alias_is_reported_as_jpeg_without_reencoding() {
        let data = encode_as(&solid_image(16, 16), ImageOutputFormat::Jpeg(90));
        let ptr = data.as_ptr();
        let (asset, _) = ImagePipeline::new()
            .process(SourceAsset::new("a.jpg", "image/jpg", data))
            .unwrap();
        assert_eq!(asset.media_type, JPEG);
        assert_eq!(asset.data.as_ptr(), ptr);
    }

    #[test]
    fn non_jpeg_png_image_converts_to_jpeg() {
        let data = encode_as(&solid_image(16, 16), ImageOutputFormat::Gif);
        let (asset, report) = ImagePipeline::new()
            .process(SourceAsset::new("a.gif", "image/gif", data))
            .unwrap();
        assert_eq!(asset.media_type, JPEG);
        assert_eq!(
            image::guess_format(&asset.data).unwrap(),
            image::ImageFormat::Jpeg
        );
        assert!(!report.was_compressed());
    }

    #[test]
    fn non_image_media_type_is_rejected_before_decoding() {
        let err = ImagePipeline::new()
            .process(SourceAsset::new(
                "notes.txt",
                "text/plain",
                Bytes::from_static(b"hello"),
            ))
            .unwrap_err();
        assert!(matches!(err, GenlyzError::InvalidFileType(_)));
    }

    #[test]
    fn corrupt_image_surfaces_decode_error() {
        let err = ImagePipeline::new()
            .process(SourceAsset::new(
                "bad.webp",
                "image/webp",
                Bytes::from_static(b"\x00\x01\x02\x03"),
            ))
            .unwrap_err();
        assert!(matches!(err, GenlyzError::Decode(_)));
    }

    #[test]
    fn oversized_asset_gets_exactly_one_compression_pass() {
        let data = encode_as(&solid_image(256, 256), ImageOutputFormat::Png);
        let original = data.len();
        // Cap below the PNG size but with plenty of room for the
        // solid-color JPEG.
        let pipeline = ImagePipeline::with_max_bytes(original - 1);
        let (asset, report) = pipeline
            .process(SourceAsset::new("big.png", PNG, data))
            .unwrap();
        assert_eq!(asset.media_type, JPEG);
        assert_eq!(report.original_bytes, original);
        assert_eq!(report.final_bytes, asset.len());
        assert_eq!(report.quality, Some(70));
        assert!(asset.len() <= pipeline.max_bytes());
    }

    #[test]
    fn still_oversized_after_one_pass_fails_closed() {
        let data = encode_as(&solid_image(64, 64), ImageOutputFormat::Png);
        // A cap no JPEG of this image can fit under.
        let pipeline = ImagePipeline::with_max_bytes(16);
        let err = pipeline
            .process(SourceAsset::new("big.png", PNG, data))
            .unwrap_err();
        match err {
            GenlyzError::TooLarge {
                original,
                compressed,
                limit,
            } => {
                assert!(original > limit);
                assert!(compressed > limit);
                assert_eq!(limit, 16);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }
}
