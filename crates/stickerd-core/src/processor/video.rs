//! Video (WEBM) sticker conversion: a single-shot ffmpeg transcode with a
//! scale filter. No per-frame control is needed here because ffmpeg demuxes
//! the source container natively.

use async_trait::async_trait;
use ffmpeg_sidecar::command::FfmpegCommand;

use super::StickerProcessor;
use crate::error::ConvertError;
use crate::ffmpeg::{feed_buffer, run_piped};
use crate::format::{InputFormat, OutputFormat};
use crate::types::CancelFlag;

const KIND: &str = "video";
const ALLOWED_OUTPUTS: &[OutputFormat] = &[
    OutputFormat::Mp4,
    OutputFormat::Webm,
    OutputFormat::Gif,
    OutputFormat::Webp,
];

#[derive(Debug, Default)]
pub struct VideoProcessor;

#[async_trait]
impl StickerProcessor for VideoProcessor {
    async fn process(
        &self,
        data: Vec<u8>,
        input: InputFormat,
        output: OutputFormat,
        width: u32,
        height: u32,
        cancel: CancelFlag,
    ) -> Result<Vec<u8>, ConvertError> {
        if input != InputFormat::Webm {
            return Err(ConvertError::UnsupportedInput { input, kind: KIND });
        }
        if !ALLOWED_OUTPUTS.contains(&output) {
            return Err(ConvertError::UnsupportedOutput { output, kind: KIND });
        }

        tokio::task::spawn_blocking(move || {
            let mut cmd = FfmpegCommand::new();
            // In the scale filter a zero dimension means "input size", so
            // zero width/height falls through to the native resolution.
            cmd.hide_banner()
                .input("-")
                .args(["-vf", &format!("scale={width}:{height}")]);
            if output == OutputFormat::Mp4 {
                // The mp4 muxer cannot seek on a pipe; fragmented output
                // avoids the rewrite of the moov atom.
                cmd.args(["-movflags", "frag_keyframe+empty_moov"]);
            }
            cmd.format(output.as_str()).output("-");

            run_piped(cmd, move |stdin| feed_buffer(&data, stdin, &cancel))
        })
        .await
        .map_err(|e| ConvertError::Conversion(format!("video task failed: {e}")))?
    }
}
