//! The three conversion strategies, one per sticker kind, behind a single
//! `process` capability.

mod animated;
mod static_image;
mod video;

use async_trait::async_trait;

pub use animated::AnimatedProcessor;
pub use static_image::StaticProcessor;
pub use video::VideoProcessor;

use crate::error::ConvertError;
use crate::format::{InputFormat, OutputFormat};
use crate::types::CancelFlag;

/// A format-family-specific conversion strategy.
///
/// Implementations own the whole conversion for one sticker kind: they
/// validate the (input, output) pair, run any external codec work on the
/// blocking pool, and return the encoded result buffer.
#[async_trait]
pub trait StickerProcessor: Send + Sync {
    async fn process(
        &self,
        data: Vec<u8>,
        input: InputFormat,
        output: OutputFormat,
        width: u32,
        height: u32,
        cancel: CancelFlag,
    ) -> Result<Vec<u8>, ConvertError>;
}
