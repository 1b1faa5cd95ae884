//! The image codec: sniff, decode, orient, resize, and encode to WebP.
//!
//! All pixel work is delegated to the `image` and `webp` crates; this module
//! only sequences the stages. Everything here is synchronous and CPU-bound —
//! the orchestrator runs it inside `spawn_blocking`.

mod metadata;
mod resize;

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::error::ConvertError;
use crate::options::ConversionOptions;

/// Source format admitted by the pipeline, sniffed from actual bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
}

/// Sniff the source format from byte content.
///
/// Filename extensions and declared content-types are never consulted; only
/// JPEG and PNG magic bytes are accepted. Everything else — including bytes
/// that don't sniff as any known image — is rejected before decode.
pub fn sniff_format(bytes: &[u8]) -> Result<SourceFormat, ConvertError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok(SourceFormat::Jpeg),
        Ok(ImageFormat::Png) => Ok(SourceFormat::Png),
        _ => Err(ConvertError::UnsupportedFormat),
    }
}

/// Convert JPEG/PNG bytes to WebP per the normalized options.
///
/// Stages, in order: sniff, decode, EXIF orientation correction, optional
/// resize (never upscaling), encode, and — when metadata is preserved —
/// re-attachment of the source EXIF block to the WebP container.
pub fn transcode(bytes: &[u8], options: &ConversionOptions) -> Result<Vec<u8>, ConvertError> {
    let format = sniff_format(bytes)?;

    let image_format = match format {
        SourceFormat::Jpeg => ImageFormat::Jpeg,
        SourceFormat::Png => ImageFormat::Png,
    };
    let mut img = image::load_from_memory_with_format(bytes, image_format)
        .map_err(|e| ConvertError::Decode(e.to_string()))?;

    // EXIF is read from the source both for orientation correction and for
    // optional preservation in the output container.
    let exif = read_exif(bytes);
    if let Some(exif) = &exif {
        apply_orientation(&mut img, exif);
    }

    if options.resize_requested() {
        img = resize::apply(img, options.width, options.height, options.fit);
    }

    // Normalize to RGBA8 before encoding; libwebp consumes exactly this
    // layout and it doubles as the standard color space conversion.
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let has_alpha = rgba.pixels().any(|p| p.0[3] != u8::MAX);

    let encoded = encode_webp(&rgba, width, height, options)?;

    if !options.strip_metadata {
        if let Some(exif) = &exif {
            return Ok(metadata::embed_exif(
                encoded,
                exif.buf(),
                width,
                height,
                has_alpha,
            ));
        }
    }
    Ok(encoded)
}

fn encode_webp(
    rgba: &[u8],
    width: u32,
    height: u32,
    options: &ConversionOptions,
) -> Result<Vec<u8>, ConvertError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|()| ConvertError::Encode("failed to initialize encoder config".into()))?;
    config.lossless = i32::from(options.lossless);
    config.quality = f32::from(options.quality);
    config.method = i32::from(options.effort);

    let encoder = webp::Encoder::from_rgba(rgba, width, height);
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| ConvertError::Encode(format!("{e:?}")))?;
    Ok(memory.to_vec())
}

fn read_exif(bytes: &[u8]) -> Option<exif::Exif> {
    exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
}

/// Rotate/flip the decoded image per the EXIF Orientation tag.
fn apply_orientation(img: &mut DynamicImage, exif: &exif::Exif) {
    let value = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(1);

    let Ok(value) = u8::try_from(value) else {
        return;
    };
    if let Some(orientation) = image::metadata::Orientation::from_exif(value) {
        img.apply_orientation(orientation);
    }
}
