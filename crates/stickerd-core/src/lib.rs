//! stickerd-core – sticker conversion pipeline.
//!
//! Converts chat-platform sticker media between formats: TGS vector
//! animations, WEBM video stickers, and static PNG/WebP rasters, each with
//! its own processor variant. The RPC surface lives in `stickerd-proto` and
//! the server binary; this crate is transport-agnostic.
//!
//! External capabilities are consumed behind seams: the Telegram file store
//! through [`filestore::FileStore`], the Lottie rasterizer through
//! [`lottie::AnimationEngine`], and ffmpeg through spawned subprocesses.

pub mod chunk;
pub mod dispatch;
pub mod error;
mod ffmpeg;
pub mod filestore;
pub mod format;
pub mod infer;
pub mod lottie;
pub mod processor;
pub mod types;

pub use chunk::{CHUNK_SIZE, ResponseChunk, ResponseChunks};
pub use dispatch::Dispatcher;
pub use error::ConvertError;
pub use format::{InputFormat, OutputFormat};
pub use infer::infer_input_format;
pub use types::{CancelFlag, ConversionRequest, ConversionResult};
