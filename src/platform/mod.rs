//! Platform boundaries for capture and encoding
//!
//! The recorder never captures pixels or muxes containers itself. It asks a
//! `CaptureSource` for a live stream, wraps that stream in an `Encoder`
//! obtained from an `EncoderFactory`, and consumes the fragments the encoder
//! pushes over a channel.
//!
//! Built-in platforms:
//! - `synthetic`: a virtual surface that emits generated fragments
//! - `replay`: replays an existing media file as a live stream

pub mod replay;
pub mod synthetic;

use bytes::Bytes;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{RecorderError, RecorderResult};

/// What the recorder asks the capture source for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Video is always required
    pub video: bool,
    /// Audio is requested but the platform may omit it
    pub audio: bool,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Event pushed by a running encoder
#[derive(Debug, Clone)]
pub enum EncoderEvent {
    /// A piece of the container stream became available
    Fragment(Bytes),
    /// The encoder hit an unrecoverable failure
    Fault(String),
}

/// Capture acquisition boundary
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Ask the platform for a live capture stream
    ///
    /// May wait indefinitely on a user/platform response.
    async fn acquire(&self, request: CaptureRequest) -> RecorderResult<Box<dyn CaptureStream>>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// A live capture stream handle
#[async_trait::async_trait]
pub trait CaptureStream: Send + Sync {
    /// Platform identifier for the stream
    fn id(&self) -> &str;

    /// Whether the granted stream carries an audio track
    fn has_audio(&self) -> bool;

    /// Stop all tracks and release the stream
    async fn release(&mut self) -> RecorderResult<()>;
}

/// Encoding boundary
///
/// Mirrors a platform media encoder: started once, pushes events until it is
/// stopped, then closes its channel after flushing any buffered fragment.
#[async_trait::async_trait]
pub trait Encoder: Send + Sync {
    /// Start encoding
    ///
    /// Returns a channel receiver that will receive encoder events
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<EncoderEvent>>;

    /// Finalize: flush buffered data and close the event channel
    async fn stop(&mut self) -> RecorderResult<()>;

    /// Check if the encoder is currently running
    fn is_encoding(&self) -> bool;

    /// Encoder name for logging
    fn name(&self) -> &str;
}

/// Builds an encoder bound to a granted capture stream
pub trait EncoderFactory: Send + Sync {
    fn create(&self, stream: &dyn CaptureStream) -> RecorderResult<Box<dyn Encoder>>;
}

/// Capture source plus the encoder factory that goes with it
#[derive(Clone)]
pub struct Platform {
    pub capture: Arc<dyn CaptureSource>,
    pub encoders: Arc<dyn EncoderFactory>,
}

impl Platform {
    pub fn new(capture: Arc<dyn CaptureSource>, encoders: Arc<dyn EncoderFactory>) -> Self {
        Self { capture, encoders }
    }
}

/// Which built-in platform to run against
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Synthetic,
    Replay,
}

/// Configuration for the built-in platforms
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Platform implementation
    pub source: PlatformKind,
    /// Interval between emitted fragments in milliseconds
    pub timeslice_ms: u64,
    /// Bytes per fragment for the synthetic encoder and replay reads
    pub fragment_bytes: usize,
    /// Whether the synthetic surface offers an audio track
    pub with_audio: bool,
    /// Make the synthetic source refuse permission (for exercising the UI)
    pub deny_permission: bool,
    /// File replayed by the `replay` platform
    pub replay_path: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: PlatformKind::Synthetic,
            timeslice_ms: 1000,
            fragment_bytes: 64 * 1024,
            with_audio: true,
            deny_permission: false,
            replay_path: None,
        }
    }
}

/// Platform factory
pub struct PlatformFactory;

impl PlatformFactory {
    /// Create a platform based on configuration
    pub fn create(config: &CaptureConfig) -> RecorderResult<Platform> {
        match config.source {
            PlatformKind::Synthetic => {
                let capture = synthetic::SyntheticSource::new(config.with_audio, config.deny_permission);
                let encoders =
                    synthetic::SyntheticEncoderFactory::new(config.fragment_bytes, config.timeslice_ms);
                Ok(Platform::new(Arc::new(capture), Arc::new(encoders)))
            }

            PlatformKind::Replay => {
                let path = config.replay_path.clone().ok_or_else(|| {
                    RecorderError::NoCaptureSource("replay platform needs capture.replay_path".into())
                })?;
                let capture = replay::ReplaySource::new(path.clone());
                let encoders =
                    replay::ReplayEncoderFactory::new(path, config.fragment_bytes, config.timeslice_ms);
                Ok(Platform::new(Arc::new(capture), Arc::new(encoders)))
            }
        }
    }
}
