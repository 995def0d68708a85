//! Shared ffmpeg subprocess plumbing.
//!
//! Both the animated and video processors pipe data through an external
//! ffmpeg process: a dedicated writer thread feeds stdin while the event
//! iterator drains stdout, so neither side can deadlock when both pipe
//! buffers fill. Callers run this on the blocking pool.

use std::io;
use std::process::ChildStdin;

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use tracing::debug;

use crate::error::ConvertError;

/// Spawn `cmd`, feed its stdin from `feed` on a separate thread, and collect
/// the encoded output from stdout.
pub(crate) fn run_piped(
    mut cmd: FfmpegCommand,
    feed: impl FnOnce(&mut ChildStdin) -> Result<(), ConvertError> + Send + 'static,
) -> Result<Vec<u8>, ConvertError> {
    let mut child = cmd
        .spawn()
        .map_err(|e| ConvertError::Conversion(format!("failed to spawn ffmpeg: {e}")))?;
    let mut stdin = child
        .take_stdin()
        .ok_or_else(|| ConvertError::Conversion("ffmpeg stdin unavailable".to_owned()))?;

    let writer = std::thread::spawn(move || {
        let result = feed(&mut stdin);
        // Dropping stdin closes the pipe and signals end-of-input.
        drop(stdin);
        result
    });

    let events = child
        .iter()
        .map_err(|e| ConvertError::Conversion(format!("failed to read ffmpeg events: {e}")))?;
    let (output, diagnostics) = drain_events(events);

    let status = child
        .wait()
        .map_err(|e| ConvertError::Conversion(format!("failed to wait for ffmpeg: {e}")))?;
    let fed = writer
        .join()
        .map_err(|_| ConvertError::Conversion("ffmpeg writer thread panicked".to_owned()))?;

    resolve_outcome(status.success(), &diagnostics, fed, output)
}

/// Collect the encoded output and error-level diagnostics from the event
/// stream. Lower log levels go to tracing.
fn drain_events(events: impl Iterator<Item = FfmpegEvent>) -> (Vec<u8>, String) {
    let mut output = Vec::new();
    let mut diagnostics = String::new();
    for event in events {
        match event {
            FfmpegEvent::OutputChunk(chunk) => output.extend_from_slice(&chunk),
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, msg) => {
                diagnostics.push_str(&msg);
                diagnostics.push('\n');
            }
            FfmpegEvent::Error(msg) => {
                diagnostics.push_str(&msg);
                diagnostics.push('\n');
            }
            FfmpegEvent::Log(level, msg) => debug!("[ffmpeg {level:?}] {msg}"),
            _ => {}
        }
    }
    (output, diagnostics)
}

/// Decide the encode outcome once the process has exited and the writer
/// thread has joined.
///
/// Error precedence: a non-zero exit status (with ffmpeg's own diagnostic
/// text) wins over writer-side errors, because a failed encode usually
/// breaks the input pipe as a side effect.
fn resolve_outcome(
    exited_ok: bool,
    diagnostics: &str,
    fed: Result<(), ConvertError>,
    output: Vec<u8>,
) -> Result<Vec<u8>, ConvertError> {
    if !exited_ok {
        return Err(ConvertError::Conversion(format!(
            "ffmpeg failed: {}",
            diagnostics.trim()
        )));
    }
    fed?;
    if output.is_empty() {
        return Err(ConvertError::Conversion(
            "ffmpeg produced no output".to_owned(),
        ));
    }
    Ok(output)
}

/// Write `data` to `sink` in bounded slices, honouring cancellation between
/// writes. An encoder that closes its input early ends the feed without
/// error; the exit status decides whether the encode succeeded.
pub(crate) fn feed_buffer(
    data: &[u8],
    sink: &mut dyn io::Write,
    cancel: &crate::types::CancelFlag,
) -> Result<(), ConvertError> {
    const WRITE_CHUNK: usize = 64 * 1024;
    for slice in data.chunks(WRITE_CHUNK) {
        if cancel.is_cancelled() {
            return Err(ConvertError::Conversion("conversion cancelled".to_owned()));
        }
        match sink.write_all(slice) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
            Err(e) => {
                return Err(ConvertError::Conversion(format!(
                    "failed to feed encoder input: {e}"
                )));
            }
        }
    }
    Ok(())
}
