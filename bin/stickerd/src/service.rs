//! gRPC service implementation: the fetch → infer → convert → stream
//! orchestration for one `GetSticker` call.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

use stickerd_core::filestore::FileStore;
use stickerd_core::{
    CancelFlag, ConversionRequest, ConversionResult, ConvertError, Dispatcher, ResponseChunks,
    infer_input_format,
};
use stickerd_proto::v1::sticker_converter_service_server::StickerConverterService;
use stickerd_proto::v1::{GetStickerRequest, StickerFileChunk};
use stickerd_proto::{chunk_to_wire, requested_format, status_from_error};

pub struct ConverterService {
    store: Arc<dyn FileStore>,
    dispatcher: Arc<Dispatcher>,
}

impl ConverterService {
    pub fn new(store: Arc<dyn FileStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Run the pipeline up to a fully materialized result. Every failure
    /// happens here, before the first response chunk exists, so the caller
    /// can always report a clean status.
    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: CancelFlag,
    ) -> Result<ConversionResult, ConvertError> {
        let location = self.store.resolve_location(&request.file_id).await?;
        let data = self.store.download(&location).await?;
        if data.is_empty() {
            return Err(ConvertError::Download("empty download".to_owned()));
        }
        let input = infer_input_format(request.is_animated, request.is_video, &data)?;
        self.dispatcher
            .dispatch(request, data, input, cancel)
            .await
    }
}

/// Trips the cancellation flag if the call future is dropped mid-conversion
/// (client disconnect), so in-flight codec subprocesses stop feeding.
struct CancelGuard {
    flag: CancelFlag,
    armed: bool,
}

impl CancelGuard {
    fn arm(flag: CancelFlag) -> Self {
        Self { flag, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.flag.cancel();
        }
    }
}

#[tonic::async_trait]
impl StickerConverterService for ConverterService {
    type GetStickerStream = ReceiverStream<Result<StickerFileChunk, Status>>;

    async fn get_sticker(
        &self,
        request: Request<GetStickerRequest>,
    ) -> Result<Response<Self::GetStickerStream>, Status> {
        let wire = request.into_inner();
        let output = requested_format(wire.desired_format())
            .ok_or_else(|| Status::invalid_argument("desired format must be specified"))?;
        let width = u32::try_from(wire.width)
            .map_err(|_| Status::invalid_argument("width must not be negative"))?;
        let height = u32::try_from(wire.height)
            .map_err(|_| Status::invalid_argument("height must not be negative"))?;
        let request = ConversionRequest {
            file_id: wire.sticker_file_id,
            is_animated: wire.is_animated,
            is_video: wire.is_video,
            output,
            width,
            height,
        };
        info!(
            file_id = %request.file_id,
            output = %request.output,
            "sticker conversion requested"
        );

        let cancel = CancelFlag::new();
        let guard = CancelGuard::arm(cancel.clone());
        let result = self.convert(&request, cancel).await.map_err(|err| {
            warn!(file_id = %request.file_id, error = %err, "conversion failed");
            status_from_error(err)
        })?;
        guard.disarm();
        info!(
            file_id = %request.file_id,
            content_type = result.content_type,
            len = result.bytes.len(),
            "conversion complete, streaming result"
        );

        let chunks = ResponseChunks::new(result, request.file_id);
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            for chunk in chunks {
                // A send error means the client went away; stop streaming.
                if tx.send(Ok(chunk_to_wire(chunk))).await.is_err() {
                    break;
                }
            }
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;

    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use tokio_stream::StreamExt;

    use stickerd_core::lottie::DisabledEngine;
    use stickerd_proto::v1::{OutputFormat, sticker_file_chunk::Payload};

    use super::*;

    /// In-memory file store: file id "X" resolves to location "loc/X".
    struct FakeStore {
        files: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl FileStore for FakeStore {
        async fn resolve_location(&self, file_id: &str) -> Result<String, ConvertError> {
            if self.files.contains_key(file_id) {
                Ok(format!("loc/{file_id}"))
            } else {
                Err(ConvertError::GetFile(format!("no such file: {file_id}")))
            }
        }

        async fn download(&self, location: &str) -> Result<Vec<u8>, ConvertError> {
            let file_id = location
                .strip_prefix("loc/")
                .ok_or_else(|| ConvertError::Download("bad location".to_owned()))?;
            self.files
                .get(file_id)
                .cloned()
                .ok_or_else(|| ConvertError::Download("gone".to_owned()))
        }
    }

    fn service_with(files: HashMap<String, Vec<u8>>) -> ConverterService {
        ConverterService::new(
            Arc::new(FakeStore { files }),
            Arc::new(Dispatcher::new(Arc::new(DisabledEngine))),
        )
    }

    fn webp_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([90, 120, 30, 255]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::WebP)
            .expect("fixture encode");
        cursor.into_inner()
    }

    fn request(file_id: &str, format: OutputFormat, width: i32, height: i32) -> GetStickerRequest {
        GetStickerRequest {
            sticker_file_id: file_id.to_owned(),
            is_animated: false,
            is_video: false,
            desired_format: format as i32,
            width,
            height,
        }
    }

    async fn collect(
        stream: ReceiverStream<Result<StickerFileChunk, Status>>,
    ) -> Vec<StickerFileChunk> {
        let mut stream = stream;
        let mut chunks = Vec::new();
        while let Some(item) = stream.next().await {
            chunks.push(item.expect("stream item should be ok"));
        }
        chunks
    }

    #[tokio::test]
    async fn webp_sticker_streams_back_as_resized_png() {
        let svc = service_with(HashMap::from([(
            "abc".to_owned(),
            webp_fixture(50, 50),
        )]));
        let response = svc
            .get_sticker(Request::new(request("abc", OutputFormat::Png, 100, 100)))
            .await
            .expect("call should succeed");
        let chunks = collect(response.into_inner()).await;

        let Some(Payload::Metadata(meta)) = &chunks[0].payload else {
            panic!("first chunk must be metadata");
        };
        assert_eq!(meta.input_file_id, "abc");
        assert_eq!(meta.content_type, "image/png");
        assert_eq!(meta.actual_format, OutputFormat::Png as i32);

        let bytes: Vec<u8> = chunks[1..]
            .iter()
            .flat_map(|c| match &c.payload {
                Some(Payload::DataChunk(d)) => d.as_slice(),
                other => panic!("expected data chunk after metadata, got {other:?}"),
            })
            .copied()
            .collect();
        let decoded = image::load_from_memory(&bytes).expect("reassembled bytes must decode");
        assert_eq!(
            image::guess_format(&bytes).expect("format"),
            ImageFormat::Png
        );
        assert_eq!((decoded.width(), decoded.height()), (100, 100));
    }

    #[tokio::test]
    async fn empty_download_fails_before_any_chunk() {
        let svc = service_with(HashMap::from([("abc".to_owned(), Vec::new())]));
        let status = svc
            .get_sticker(Request::new(request("abc", OutputFormat::Png, 100, 100)))
            .await
            .err()
            .expect("empty body must fail the call");
        assert_eq!(status.code(), tonic::Code::Unavailable);
        assert!(status.message().contains("empty"));
    }

    #[tokio::test]
    async fn unknown_file_id_reports_not_found() {
        let svc = service_with(HashMap::new());
        let status = svc
            .get_sticker(Request::new(request("nope", OutputFormat::Png, 0, 0)))
            .await
            .err()
            .expect("unknown id must fail");
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn unspecified_format_is_invalid_argument() {
        let svc = service_with(HashMap::new());
        let status = svc
            .get_sticker(Request::new(request("abc", OutputFormat::Unspecified, 0, 0)))
            .await
            .err()
            .expect("unspecified format must fail");
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn unsniffable_bytes_report_invalid_argument() {
        let svc = service_with(HashMap::from([(
            "abc".to_owned(),
            b"certainly not an image".to_vec(),
        )]));
        let status = svc
            .get_sticker(Request::new(request("abc", OutputFormat::Png, 0, 0)))
            .await
            .err()
            .expect("unrecognized input must fail");
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
