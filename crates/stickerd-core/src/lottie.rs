//! Vector-animation rasterization boundary.
//!
//! The conversion core never rasterizes Lottie itself; it talks to an
//! [`AnimationEngine`] that loads a parsed animation description and renders
//! individual frames. The production engine is backed by the system rlottie
//! library (behind the `rlottie` cargo feature); tests inject synthetic
//! engines through the same traits.

use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::ConvertError;

/// A loaded animation that can render any frame at an arbitrary size.
///
/// Frames are rendered as premultiplied BGRA (rlottie's native pixel
/// layout), `width * height * 4` bytes per frame.
pub trait AnimationRenderer: Send {
    fn frame_count(&self) -> usize;

    /// Native frames-per-second of the animation.
    fn frame_rate(&self) -> f64;

    fn render(&mut self, frame: usize, width: u32, height: u32) -> Result<Vec<u8>, ConvertError>;
}

/// Loads Lottie JSON into a renderable animation.
pub trait AnimationEngine: Send + Sync {
    fn load(&self, lottie_json: &str) -> Result<Box<dyn AnimationRenderer>, ConvertError>;
}

/// Decompress a TGS envelope and validate that the body is Lottie JSON.
///
/// Returns the JSON text; the engine receives it verbatim.
pub fn decode_tgs(data: &[u8]) -> Result<String, ConvertError> {
    let mut json = String::new();
    GzDecoder::new(data)
        .read_to_string(&mut json)
        .map_err(|e| ConvertError::Conversion(format!("invalid TGS gzip envelope: {e}")))?;
    // Parse once to reject truncated or non-JSON payloads before handing the
    // text to the native engine.
    serde_json::from_str::<serde_json::Value>(&json)
        .map_err(|e| ConvertError::Conversion(format!("invalid animation JSON: {e}")))?;
    Ok(json)
}

/// Placeholder engine used when the crate is built without `rlottie`.
///
/// Lets the server run and serve static/video stickers on hosts without the
/// native library; animated requests fail at load time.
#[derive(Debug, Default)]
pub struct DisabledEngine;

impl AnimationEngine for DisabledEngine {
    fn load(&self, _lottie_json: &str) -> Result<Box<dyn AnimationRenderer>, ConvertError> {
        Err(ConvertError::Conversion(
            "animation engine unavailable: built without rlottie support".to_owned(),
        ))
    }
}

#[cfg(feature = "rlottie")]
pub use self::rlottie_engine::RlottieEngine;

#[cfg(feature = "rlottie")]
mod rlottie_engine {
    use rlottie::{Animation, Size, Surface};

    use super::{AnimationEngine, AnimationRenderer};
    use crate::error::ConvertError;

    /// [`AnimationEngine`] backed by the system rlottie library.
    #[derive(Debug, Default)]
    pub struct RlottieEngine;

    impl AnimationEngine for RlottieEngine {
        fn load(&self, lottie_json: &str) -> Result<Box<dyn AnimationRenderer>, ConvertError> {
            let animation = Animation::from_data(lottie_json.as_bytes().to_vec(), "sticker", ".")
                .ok_or_else(|| {
                    ConvertError::Conversion("rlottie rejected the animation".to_owned())
                })?;
            Ok(Box::new(RlottieRenderer { animation }))
        }
    }

    struct RlottieRenderer {
        animation: Animation,
    }

    impl AnimationRenderer for RlottieRenderer {
        fn frame_count(&self) -> usize {
            self.animation.totalframe()
        }

        fn frame_rate(&self) -> f64 {
            self.animation.framerate()
        }

        fn render(
            &mut self,
            frame: usize,
            width: u32,
            height: u32,
        ) -> Result<Vec<u8>, ConvertError> {
            let mut surface = Surface::new(Size::new(width as usize, height as usize));
            self.animation.render(frame, &mut surface);
            let mut bytes = Vec::with_capacity(surface.data().len() * 4);
            for px in surface.data() {
                bytes.extend_from_slice(&[px.b, px.g, px.r, px.a]);
            }
            Ok(bytes)
        }
    }
}
