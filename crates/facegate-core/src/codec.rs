//! Image codec — base64 payloads in, pixel data out.
//!
//! Everything is staged in memory; no transient files are ever
//! written, so concurrent requests cannot collide on disk.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode a base64-encoded image payload into RGB pixel data.
///
/// Accepts any container format the `image` crate recognizes by
/// content sniffing (JPEG, PNG, ...).
pub fn decode_base64_image(payload: &str) -> Result<RgbImage, CodecError> {
    let bytes = STANDARD.decode(payload.trim())?;
    let img = image::load_from_memory(&bytes)?;
    Ok(img.to_rgb8())
}

/// Re-encode pixel data as PNG for transport to the embedding
/// capability.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, CodecError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
