//! Static format tables: the concrete input encodings a sticker can arrive
//! in, the output containers clients may request, and the MIME content type
//! attached to each produced container.
//!
//! All tables are process-lifetime constants shared read-only across calls.

use std::fmt;

/// Concrete source encoding of a downloaded sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Gzip-compressed Lottie JSON (Telegram's TGS container).
    Tgs,
    /// WEBM video sticker.
    Webm,
    /// Static PNG raster.
    Png,
    /// Static WebP raster.
    Webp,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Tgs => "tgs",
            InputFormat::Webm => "webm",
            InputFormat::Png => "png",
            InputFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output container a client may request.
///
/// The wire enum carries more values than this (static/animated WebP aliases,
/// a PNG-sequence alias); the RPC layer collapses those onto the canonical
/// container before dispatch. `Svg` and `Tgs` are representable but no
/// processor produces them, so requesting either yields `UnsupportedOutput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpg,
    Webp,
    Gif,
    Webm,
    Mp4,
    Svg,
    Tgs,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Webp => "webp",
            OutputFormat::Gif => "gif",
            OutputFormat::Webm => "webm",
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Svg => "svg",
            OutputFormat::Tgs => "tgs",
        }
    }

    /// MIME content type for containers the processors can actually produce.
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            OutputFormat::Png => Some("image/png"),
            OutputFormat::Jpg => Some("image/jpeg"),
            OutputFormat::Webp => Some("image/webp"),
            OutputFormat::Gif => Some("image/gif"),
            OutputFormat::Webm => Some("video/webm"),
            OutputFormat::Mp4 => Some("video/mp4"),
            OutputFormat::Svg | OutputFormat::Tgs => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_all_producible_formats() {
        for fmt in [
            OutputFormat::Png,
            OutputFormat::Jpg,
            OutputFormat::Webp,
            OutputFormat::Gif,
            OutputFormat::Webm,
            OutputFormat::Mp4,
        ] {
            assert!(
                fmt.content_type().is_some(),
                "missing content type for {fmt}"
            );
        }
    }

    #[test]
    fn unproducible_formats_have_no_content_type() {
        assert_eq!(OutputFormat::Svg.content_type(), None);
        assert_eq!(OutputFormat::Tgs.content_type(), None);
    }
}
