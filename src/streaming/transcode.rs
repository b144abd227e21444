//! On-the-fly ffmpeg transcoding to fragmented MP4.
//!
//! Each request gets its own ffmpeg process writing to stdout. The child is
//! owned by [`TranscodeStream`] and spawned with `kill_on_drop`, so dropping
//! the response body (client gone, request cancelled) terminates it.

use bytes::Bytes;
use futures::Stream;
use mediasort_common::{Error, Result};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::config::TranscodeConfig;

const CHUNK_SIZE: usize = 64 * 1024;

/// Builds and spawns ffmpeg transcode processes.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    settings: TranscodeConfig,
}

impl Transcoder {
    /// Use `ffmpeg_path` from config, else ffmpeg found on PATH, else the
    /// bare name (spawn will then report the failure).
    pub fn new(settings: &TranscodeConfig) -> Self {
        let ffmpeg = settings
            .ffmpeg_path
            .clone()
            .or_else(|| which::which("ffmpeg").ok())
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));

        Self {
            ffmpeg,
            settings: settings.clone(),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// ffmpeg arguments for `input`, seeking to `start_seconds` first when
    /// given.
    pub fn args(&self, input: &Path, start_seconds: Option<f64>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(24);
        args.push("-hide_banner".into());
        args.extend(["-loglevel".into(), "error".into()]);
        if let Some(t) = start_seconds {
            args.extend(["-ss".into(), format!("{}", t).into()]);
        }
        args.extend(["-i".into(), input.as_os_str().to_owned()]);
        args.extend([
            "-c:v".into(),
            self.settings.video_codec.clone().into(),
            "-preset".into(),
            self.settings.preset.clone().into(),
            "-crf".into(),
            self.settings.crf.to_string().into(),
            "-c:a".into(),
            self.settings.audio_codec.clone().into(),
            "-b:a".into(),
            self.settings.audio_bitrate.clone().into(),
            "-movflags".into(),
            "frag_keyframe+empty_moov".into(),
            "-f".into(),
            "mp4".into(),
            "pipe:1".into(),
        ]);
        args
    }

    /// Start ffmpeg for `input` and return its stdout as a byte stream.
    pub fn spawn(&self, input: &Path, start_seconds: Option<f64>) -> Result<TranscodeStream> {
        let mut child = Command::new(&self.ffmpeg)
            .args(self.args(input, start_seconds))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::tool(
                    "ffmpeg",
                    format!("failed to spawn {}: {}", self.ffmpeg.display(), e),
                )
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool("ffmpeg", "stdout was not captured"))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr, input.to_path_buf()));
        }

        info!(
            file = %input.display(),
            start = ?start_seconds,
            pid = ?child.id(),
            "Started transcode"
        );

        Ok(TranscodeStream {
            child,
            stdout: ReaderStream::with_capacity(stdout, CHUNK_SIZE),
            input: input.to_path_buf(),
            finished: false,
        })
    }
}

/// Log ffmpeg diagnostics, skipping progress lines.
async fn log_stderr(stderr: ChildStderr, input: PathBuf) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !line.trim().is_empty() && !line.contains("frame=") {
                    warn!(file = %input.display(), "ffmpeg: {}", line);
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Stopped reading ffmpeg stderr: {}", e);
                break;
            }
        }
    }
}

/// Transcoder stdout as a body stream. Owns the child process.
pub struct TranscodeStream {
    child: Child,
    stdout: ReaderStream<ChildStdout>,
    input: PathBuf,
    finished: bool,
}

impl TranscodeStream {
    /// OS process id of the running transcoder, if still alive.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

impl Stream for TranscodeStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.stdout).poll_next(cx) {
            Poll::Ready(None) => {
                this.finished = true;
                match this.child.try_wait() {
                    Ok(Some(status)) if !status.success() => {
                        warn!(file = %this.input.display(), %status, "Transcode exited with failure");
                    }
                    Ok(Some(_)) => debug!(file = %this.input.display(), "Transcode finished"),
                    Ok(None) => debug!(file = %this.input.display(), "Transcode closed stdout"),
                    Err(e) => warn!(file = %this.input.display(), "Failed to poll transcode: {}", e),
                }
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                this.finished = true;
                warn!(file = %this.input.display(), "Transcode read error: {}", e);
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

impl Drop for TranscodeStream {
    fn drop(&mut self) {
        if !self.finished {
            debug!(file = %self.input.display(), "Transcode stream dropped early, stopping ffmpeg");
            let _ = self.child.start_kill();
        }
    }
}
