use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::format::OutputFormat;

/// Immutable description of a single conversion call, built once from the
/// wire request.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Opaque file identifier understood by the file store.
    pub file_id: String,
    /// Platform hint: the source is a TGS vector animation.
    pub is_animated: bool,
    /// Platform hint: the source is a WEBM video sticker.
    pub is_video: bool,
    pub output: OutputFormat,
    /// Target width in pixels; zero means "keep native size" (static only).
    pub width: u32,
    /// Target height in pixels; zero means "keep native size" (static only).
    pub height: u32,
}

/// Converted asset, fully materialized, ready to be chunked for streaming.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: &'static str,
    /// Canonical container actually produced, echoed back to the client.
    pub format: OutputFormat,
}

/// Cooperative cancellation flag shared between the call future and the
/// blocking codec work it spawned.
///
/// The RPC layer arms a drop-guard around each call; when the transport
/// drops the call future (client disconnect), the flag trips and the frame
/// writer stops feeding the encoder at the next frame boundary, ending the
/// subprocess via EOF on its input.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
