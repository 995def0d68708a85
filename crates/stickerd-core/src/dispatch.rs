//! Processor selection and result assembly.

use std::sync::Arc;

use tracing::info;

use crate::error::ConvertError;
use crate::format::InputFormat;
use crate::lottie::AnimationEngine;
use crate::processor::{AnimatedProcessor, StaticProcessor, StickerProcessor, VideoProcessor};
use crate::types::{CancelFlag, ConversionRequest, ConversionResult};

/// Routes a conversion request to the processor for its sticker kind.
///
/// Selection is a pure function of the request hints, with the same
/// precedence as input-format inference (animated over video over static),
/// so hint-driven routing and hint-driven inference can never disagree.
pub struct Dispatcher {
    animated: AnimatedProcessor,
    video: VideoProcessor,
    still: StaticProcessor,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn AnimationEngine>) -> Self {
        Self {
            animated: AnimatedProcessor::new(engine),
            video: VideoProcessor,
            still: StaticProcessor,
        }
    }

    pub async fn dispatch(
        &self,
        request: &ConversionRequest,
        data: Vec<u8>,
        input: InputFormat,
        cancel: CancelFlag,
    ) -> Result<ConversionResult, ConvertError> {
        let (kind, processor): (&str, &dyn StickerProcessor) = if request.is_animated {
            ("animated", &self.animated)
        } else if request.is_video {
            ("video", &self.video)
        } else {
            ("static", &self.still)
        };
        info!(
            file_id = %request.file_id,
            kind,
            input = %input,
            output = %request.output,
            width = request.width,
            height = request.height,
            "dispatching conversion"
        );

        let bytes = processor
            .process(
                data,
                input,
                request.output,
                request.width,
                request.height,
                cancel,
            )
            .await?;
        let content_type = request.output.content_type().ok_or_else(|| {
            ConvertError::Conversion(format!("no content type for {}", request.output))
        })?;
        Ok(ConversionResult {
            bytes,
            content_type,
            format: request.output,
        })
    }
}
