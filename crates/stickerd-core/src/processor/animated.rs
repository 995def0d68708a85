//! Animated (TGS) sticker conversion.
//!
//! Still-image outputs rasterize frame 0 only. Motion outputs stream every
//! frame, in index order, into an ffmpeg encoder: the writer thread renders
//! and feeds one frame at a time so the raw frame stream is never
//! materialized in full, and the encoder starts compressing while later
//! frames are still being rasterized.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use ffmpeg_sidecar::command::FfmpegCommand;
use image::RgbaImage;

use super::StickerProcessor;
use super::static_image::encode_rgba;
use crate::error::ConvertError;
use crate::ffmpeg::run_piped;
use crate::format::{InputFormat, OutputFormat};
use crate::lottie::{AnimationEngine, AnimationRenderer, decode_tgs};
use crate::types::CancelFlag;

const KIND: &str = "animated";
const STATIC_OUTPUTS: &[OutputFormat] =
    &[OutputFormat::Png, OutputFormat::Jpg, OutputFormat::Webp];
const MOTION_OUTPUTS: &[OutputFormat] =
    &[OutputFormat::Webm, OutputFormat::Mp4, OutputFormat::Gif];

/// Encoder configuration for one motion container.
struct MotionPreset {
    container: &'static str,
    vcodec: Option<&'static str>,
    pix_fmt: &'static str,
    extra_args: &'static [&'static str],
}

fn motion_preset(output: OutputFormat) -> Option<MotionPreset> {
    match output {
        OutputFormat::Mp4 => Some(MotionPreset {
            container: "mp4",
            vcodec: Some("libx264"),
            pix_fmt: "yuv420p",
            // Fragmented mp4 so the muxer can write to a pipe; low-latency
            // x264 settings since sticker clips are short.
            extra_args: &[
                "-movflags",
                "frag_keyframe+empty_moov",
                "-preset",
                "ultrafast",
                "-tune",
                "zerolatency",
            ],
        }),
        OutputFormat::Webm => Some(MotionPreset {
            container: "webm",
            vcodec: Some("libvpx"),
            pix_fmt: "yuv420p",
            extra_args: &[
                "-b:v",
                "0",
                "-deadline",
                "realtime",
                "-cpu-used",
                "5",
                "-crf",
                "32",
            ],
        }),
        OutputFormat::Gif => Some(MotionPreset {
            container: "gif",
            vcodec: None,
            pix_fmt: "rgb24",
            extra_args: &[],
        }),
        _ => None,
    }
}

pub struct AnimatedProcessor {
    engine: Arc<dyn AnimationEngine>,
}

impl AnimatedProcessor {
    pub fn new(engine: Arc<dyn AnimationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl StickerProcessor for AnimatedProcessor {
    async fn process(
        &self,
        data: Vec<u8>,
        input: InputFormat,
        output: OutputFormat,
        width: u32,
        height: u32,
        cancel: CancelFlag,
    ) -> Result<Vec<u8>, ConvertError> {
        if input != InputFormat::Tgs {
            return Err(ConvertError::UnsupportedInput { input, kind: KIND });
        }
        if !STATIC_OUTPUTS.contains(&output) && !MOTION_OUTPUTS.contains(&output) {
            return Err(ConvertError::UnsupportedOutput { output, kind: KIND });
        }
        // The rasterizer has no native size to fall back on.
        if width == 0 || height == 0 {
            return Err(ConvertError::Conversion(
                "target dimensions must be positive for animated stickers".to_owned(),
            ));
        }

        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || {
            let json = decode_tgs(&data)?;
            let mut renderer = engine.load(&json)?;
            if MOTION_OUTPUTS.contains(&output) {
                encode_motion(renderer, output, width, height, &cancel)
            } else {
                let frame = render_frame(renderer.as_mut(), 0, width, height)?;
                encode_rgba(bgra_frame_to_image(frame, width, height)?, output)
            }
        })
        .await
        .map_err(|e| ConvertError::Conversion(format!("animation task failed: {e}")))?
    }
}

/// Render one frame and verify the buffer length is exactly `w*h*4`.
fn render_frame(
    renderer: &mut dyn AnimationRenderer,
    index: usize,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ConvertError> {
    let frame = renderer.render(index, width, height)?;
    if frame.len() != (width as usize) * (height as usize) * 4 {
        return Err(ConvertError::Conversion("frame size mismatch".to_owned()));
    }
    Ok(frame)
}

/// Feed frames `0..frame_count` in order into `sink`, validating each one.
///
/// This is the encoder-input half of the motion pipeline, split out from the
/// subprocess so the ordering and size invariants are testable against a
/// plain `Write` sink.
fn feed_frames(
    renderer: &mut dyn AnimationRenderer,
    width: u32,
    height: u32,
    sink: &mut dyn Write,
    cancel: &CancelFlag,
) -> Result<(), ConvertError> {
    let total = renderer.frame_count();
    for index in 0..total {
        if cancel.is_cancelled() {
            return Err(ConvertError::Conversion("conversion cancelled".to_owned()));
        }
        let frame = render_frame(renderer, index, width, height)?;
        match sink.write_all(&frame) {
            Ok(()) => {}
            // The encoder closing its input early is its call to make; the
            // exit status decides whether the encode succeeded.
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
            Err(e) => {
                return Err(ConvertError::Conversion(format!(
                    "failed to feed frame {index}: {e}"
                )));
            }
        }
    }
    Ok(())
}

fn encode_motion(
    mut renderer: Box<dyn AnimationRenderer>,
    output: OutputFormat,
    width: u32,
    height: u32,
    cancel: &CancelFlag,
) -> Result<Vec<u8>, ConvertError> {
    let preset = motion_preset(output).ok_or(ConvertError::UnsupportedOutput {
        output,
        kind: KIND,
    })?;
    let total_frames = renderer.frame_count();
    if total_frames == 0 {
        return Err(ConvertError::Conversion(
            "animation has no frames".to_owned(),
        ));
    }
    let frame_rate = renderer.frame_rate();

    let mut cmd = FfmpegCommand::new();
    cmd.hide_banner()
        .format("rawvideo")
        .pix_fmt("bgra")
        .size(width, height)
        .rate(frame_rate as f32)
        .input("-")
        .args(["-frames:v", &total_frames.to_string()])
        .pix_fmt(preset.pix_fmt);
    if let Some(vcodec) = preset.vcodec {
        cmd.codec_video(vcodec);
    }
    cmd.args(preset.extra_args.iter().copied())
        .format(preset.container)
        .output("-");

    let cancel = cancel.clone();
    run_piped(cmd, move |stdin| {
        feed_frames(renderer.as_mut(), width, height, stdin, &cancel)
    })
}

/// Wrap a BGRA frame buffer as an RGBA image for the still-image encoders.
fn bgra_frame_to_image(
    mut frame: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<RgbaImage, ConvertError> {
    for px in frame.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    RgbaImage::from_raw(width, height, frame)
        .ok_or_else(|| ConvertError::Conversion("frame size mismatch".to_owned()))
}
