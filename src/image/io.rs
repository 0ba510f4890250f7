//! Decoding of text-safe image payloads.
//!
//! Images travel as standard-alphabet base64 without line wrapping. A
//! `data:<mime>;base64,` prefix is tolerated so browser captures can be passed
//! through unchanged.

use crate::util::{RealignError, RealignResult};
use ::image::{ImageError, RgbImage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Encodes raw bytes as standard base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes a base64 payload into its raw bytes.
pub fn decode_base64(encoded: &str) -> RealignResult<Vec<u8>> {
    let payload = strip_data_uri(encoded.trim());
    STANDARD
        .decode(payload)
        .map_err(|err| RealignError::Decode {
            reason: err.to_string(),
        })
}

/// Decodes a base64-encoded image container into an 8-bit RGB raster.
///
/// Invalid base64 and corrupt pixel data fail with [`RealignError::Decode`].
/// Payloads whose container cannot be identified, or that need a decoder this
/// build does not carry, fail with [`RealignError::UnsupportedFormat`].
pub fn decode_image(encoded: &str) -> RealignResult<RgbImage> {
    let bytes = decode_base64(encoded)?;
    decode_image_bytes(&bytes)
}

/// Decodes raw container bytes (PNG, JPEG, ...) into an 8-bit RGB raster.
pub fn decode_image_bytes(bytes: &[u8]) -> RealignResult<RgbImage> {
    let format = ::image::guess_format(bytes).map_err(|err| RealignError::UnsupportedFormat {
        reason: err.to_string(),
    })?;
    let img = ::image::load_from_memory_with_format(bytes, format).map_err(|err| match err {
        ImageError::Unsupported(_) => RealignError::UnsupportedFormat {
            reason: err.to_string(),
        },
        other => RealignError::Decode {
            reason: other.to_string(),
        },
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(RealignError::UnsupportedFormat {
            reason: "image has no pixels".to_string(),
        });
    }
    Ok(img.to_rgb8())
}

fn strip_data_uri(payload: &str) -> &str {
    if !payload.starts_with("data:") {
        return payload;
    }
    match payload.find(";base64,") {
        Some(pos) => &payload[pos + ";base64,".len()..],
        None => payload,
    }
}
