//! Input-format inference: request hints first, byte sniffing as a fallback.

use crate::error::ConvertError;
use crate::format::InputFormat;

/// 8-byte PNG file signature.
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Determine the concrete source encoding of a downloaded sticker.
///
/// Precedence (first match wins):
/// 1. `is_animated` hint ⇒ TGS,
/// 2. `is_video` hint ⇒ WEBM,
/// 3. PNG magic ⇒ PNG,
/// 4. RIFF container with a `WEBP` subtype tag ⇒ WebP.
///
/// Hints dominate sniffing: the platform's flags are authoritative metadata,
/// while sniffing only exists to classify unhinted static stickers.
pub fn infer_input_format(
    is_animated: bool,
    is_video: bool,
    data: &[u8],
) -> Result<InputFormat, ConvertError> {
    if is_animated {
        return Ok(InputFormat::Tgs);
    }
    if is_video {
        return Ok(InputFormat::Webm);
    }
    if data.starts_with(&PNG_MAGIC) {
        return Ok(InputFormat::Png);
    }
    if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WEBP" {
        return Ok(InputFormat::Webp);
    }
    Err(ConvertError::UnrecognizedFormat)
}
