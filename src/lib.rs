pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod platform;
pub mod recorder;

pub use config::Config;
pub use error::{RecorderError, RecorderResult};
pub use export::{DirectorySink, ExportArtifact, ExportAssembler, ExportSink};
pub use http::{create_router, AppState, RecordingMode};
pub use platform::{
    CaptureConfig, CaptureRequest, CaptureSource, CaptureStream, Encoder, EncoderEvent,
    EncoderFactory, Platform, PlatformFactory, PlatformKind,
};
pub use recorder::{
    ChunkSequence, Fragment, RecorderConfig, RecorderController, RecorderSnapshot, SessionState,
    SessionSummary, StartOutcome, StopOutcome, ToggleOutcome,
};
