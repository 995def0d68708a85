use thiserror::Error;

use crate::format::{InputFormat, OutputFormat};

/// Errors produced by the conversion core.
///
/// This is the complete client-visible error vocabulary: every failure in the
/// fetch → infer → convert pipeline collapses onto one of these variants, and
/// the RPC layer maps each variant onto a stable status code.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// The file store could not resolve the sticker's retrieval location.
    #[error("failed to resolve file location: {0}")]
    GetFile(String),

    /// Downloading the sticker bytes failed or returned an empty body.
    #[error("file download failed: {0}")]
    Download(String),

    /// Neither the request hints nor byte sniffing could classify the input.
    #[error("unrecognized sticker format")]
    UnrecognizedFormat,

    /// The processor for this sticker kind does not accept the input format.
    #[error("unsupported input format {input} for {kind} stickers")]
    UnsupportedInput {
        input: InputFormat,
        kind: &'static str,
    },

    /// The processor for this sticker kind cannot produce the output format.
    #[error("unsupported output format {output} for {kind} stickers")]
    UnsupportedOutput {
        output: OutputFormat,
        kind: &'static str,
    },

    /// An external codec failed, exited non-zero, or produced malformed data.
    #[error("conversion failed: {0}")]
    Conversion(String),
}
