//! stickerd-proto – wire schema and conversions between wire and core types.
//!
//! The protobuf/tonic code is generated at build time from
//! `proto/stickerd.proto`. This crate also owns the two lossy mappings at
//! the RPC boundary: collapsing wire format aliases onto the canonical core
//! containers, and translating core errors into gRPC status codes.

use stickerd_core::chunk::ResponseChunk;
use stickerd_core::{ConvertError, OutputFormat};

pub mod v1 {
    include!(concat!(env!("OUT_DIR"), "/stickerd.v1.rs"));
}

/// Map a requested wire format onto the container the processors understand.
///
/// Aliases collapse: both WebP variants become `Webp` and a PNG sequence
/// becomes a single `Png`. `None` for `Unspecified`.
pub fn requested_format(wire: v1::OutputFormat) -> Option<OutputFormat> {
    match wire {
        v1::OutputFormat::Unspecified => None,
        v1::OutputFormat::Png | v1::OutputFormat::PngSequence => Some(OutputFormat::Png),
        v1::OutputFormat::WebpStatic | v1::OutputFormat::WebpAnimated => Some(OutputFormat::Webp),
        v1::OutputFormat::Gif => Some(OutputFormat::Gif),
        v1::OutputFormat::Webm => Some(OutputFormat::Webm),
        v1::OutputFormat::Svg => Some(OutputFormat::Svg),
        v1::OutputFormat::TgsRaw => Some(OutputFormat::Tgs),
        v1::OutputFormat::Jpg => Some(OutputFormat::Jpg),
        v1::OutputFormat::Mp4 => Some(OutputFormat::Mp4),
    }
}

/// Canonical wire code for a produced container, echoed in the metadata
/// chunk. The inverse of [`requested_format`] up to alias collapsing: a
/// `WEBP_ANIMATED` request is answered with `WEBP_STATIC`.
pub fn canonical_format(fmt: OutputFormat) -> v1::OutputFormat {
    match fmt {
        OutputFormat::Png => v1::OutputFormat::Png,
        OutputFormat::Jpg => v1::OutputFormat::Jpg,
        OutputFormat::Webp => v1::OutputFormat::WebpStatic,
        OutputFormat::Gif => v1::OutputFormat::Gif,
        OutputFormat::Webm => v1::OutputFormat::Webm,
        OutputFormat::Mp4 => v1::OutputFormat::Mp4,
        OutputFormat::Svg => v1::OutputFormat::Svg,
        OutputFormat::Tgs => v1::OutputFormat::TgsRaw,
    }
}

/// Wrap a core response chunk in its wire envelope.
pub fn chunk_to_wire(chunk: ResponseChunk) -> v1::StickerFileChunk {
    let payload = match chunk {
        ResponseChunk::Metadata {
            input_file_id,
            content_type,
            format,
        } => v1::sticker_file_chunk::Payload::Metadata(v1::StickerFileMetadata {
            input_file_id,
            content_type: content_type.to_owned(),
            actual_format: canonical_format(format) as i32,
        }),
        ResponseChunk::Data(data) => v1::sticker_file_chunk::Payload::DataChunk(data),
    };
    v1::StickerFileChunk {
        payload: Some(payload),
    }
}

/// Translate a core error into the gRPC status reported to the client.
///
/// Every conversion failure is reported before the first chunk is sent, so
/// this mapping is the entire client-visible error surface.
pub fn status_from_error(err: ConvertError) -> tonic::Status {
    let message = err.to_string();
    match err {
        ConvertError::GetFile(_) => tonic::Status::not_found(message),
        ConvertError::Download(_) => tonic::Status::unavailable(message),
        ConvertError::UnrecognizedFormat
        | ConvertError::UnsupportedInput { .. }
        | ConvertError::UnsupportedOutput { .. } => tonic::Status::invalid_argument(message),
        ConvertError::Conversion(_) => tonic::Status::internal(message),
    }
}
