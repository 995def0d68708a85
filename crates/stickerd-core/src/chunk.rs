//! Chunked response encoding: slice a fully materialized conversion result
//! into one metadata chunk followed by fixed-size data chunks.

use crate::format::OutputFormat;
use crate::types::ConversionResult;

/// Size of one data chunk in the response stream (256 KiB).
pub const CHUNK_SIZE: usize = 1 << 18;

/// One unit of the streamed response.
///
/// Exactly one `Metadata` chunk precedes all `Data` chunks; concatenating
/// the `Data` payloads in emission order reconstructs the result buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseChunk {
    Metadata {
        input_file_id: String,
        content_type: &'static str,
        format: OutputFormat,
    },
    Data(Vec<u8>),
}

/// Lazy chunk sequence over a conversion result.
///
/// A pure function of the already-complete buffer: iterating never blocks
/// and re-running the conversion is the only way to "restart" it.
pub struct ResponseChunks {
    result: ConversionResult,
    input_file_id: String,
    /// Offset of the next data chunk; `None` until metadata has been emitted.
    offset: Option<usize>,
}

impl ResponseChunks {
    pub fn new(result: ConversionResult, input_file_id: impl Into<String>) -> Self {
        Self {
            result,
            input_file_id: input_file_id.into(),
            offset: None,
        }
    }
}

impl Iterator for ResponseChunks {
    type Item = ResponseChunk;

    fn next(&mut self) -> Option<ResponseChunk> {
        let Some(offset) = self.offset else {
            self.offset = Some(0);
            return Some(ResponseChunk::Metadata {
                input_file_id: self.input_file_id.clone(),
                content_type: self.result.content_type,
                format: self.result.format,
            });
        };
        if offset >= self.result.bytes.len() {
            return None;
        }
        let end = (offset + CHUNK_SIZE).min(self.result.bytes.len());
        self.offset = Some(end);
        Some(ResponseChunk::Data(self.result.bytes[offset..end].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(bytes: Vec<u8>) -> ConversionResult {
        ConversionResult {
            bytes,
            content_type: "image/png",
            format: OutputFormat::Png,
        }
    }

    fn reassemble(chunks: &[ResponseChunk]) -> Vec<u8> {
        chunks
            .iter()
            .filter_map(|c| match c {
                ResponseChunk::Data(d) => Some(d.as_slice()),
                ResponseChunk::Metadata { .. } => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    #[test]
    fn metadata_is_emitted_exactly_once_and_first() {
        for len in [0usize, 1, CHUNK_SIZE, CHUNK_SIZE * 3, CHUNK_SIZE + 7] {
            let chunks: Vec<_> = ResponseChunks::new(result_with(vec![0xAB; len]), "abc").collect();
            assert!(
                matches!(chunks[0], ResponseChunk::Metadata { .. }),
                "first chunk must be metadata for len {len}"
            );
            let meta_count = chunks
                .iter()
                .filter(|c| matches!(c, ResponseChunk::Metadata { .. }))
                .count();
            assert_eq!(meta_count, 1, "exactly one metadata chunk for len {len}");
        }
    }

    #[test]
    fn data_chunks_reassemble_the_buffer_exactly() {
        for len in [0usize, 1, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE * 2, CHUNK_SIZE * 2 + 3] {
            let bytes: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let chunks: Vec<_> =
                ResponseChunks::new(result_with(bytes.clone()), "abc").collect();
            assert_eq!(reassemble(&chunks), bytes, "round-trip failed for len {len}");
        }
    }

    #[test]
    fn empty_result_yields_metadata_only() {
        let chunks: Vec<_> = ResponseChunks::new(result_with(Vec::new()), "abc").collect();
        assert_eq!(chunks.len(), 1);
        assert!(matches!(chunks[0], ResponseChunk::Metadata { .. }));
    }

    #[test]
    fn chunks_respect_the_size_limit() {
        let chunks: Vec<_> =
            ResponseChunks::new(result_with(vec![1; CHUNK_SIZE * 2 + 5]), "abc").collect();
        let sizes: Vec<usize> = chunks
            .iter()
            .filter_map(|c| match c {
                ResponseChunk::Data(d) => Some(d.len()),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![CHUNK_SIZE, CHUNK_SIZE, 5]);
    }

    #[test]
    fn metadata_carries_the_request_file_id() {
        let mut chunks = ResponseChunks::new(result_with(vec![1, 2, 3]), "file-42");
        match chunks.next() {
            Some(ResponseChunk::Metadata { input_file_id, content_type, format }) => {
                assert_eq!(input_file_id, "file-42");
                assert_eq!(content_type, "image/png");
                assert_eq!(format, OutputFormat::Png);
            }
            other => panic!("expected metadata chunk, got {other:?}"),
        }
    }
}
