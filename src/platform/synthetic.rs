// Synthetic capture platform
//
// Grants a virtual surface and produces generated fragments at a fixed
// timeslice. Useful for running the recorder without a display server.

use bytes::Bytes;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{CaptureRequest, CaptureSource, CaptureStream, Encoder, EncoderEvent, EncoderFactory};
use crate::error::{RecorderError, RecorderResult};

/// Capture source backed by a virtual surface
pub struct SyntheticSource {
    with_audio: bool,
    deny_permission: bool,
}

impl SyntheticSource {
    pub fn new(with_audio: bool, deny_permission: bool) -> Self {
        Self {
            with_audio,
            deny_permission,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for SyntheticSource {
    async fn acquire(&self, request: CaptureRequest) -> RecorderResult<Box<dyn CaptureStream>> {
        if self.deny_permission {
            return Err(RecorderError::PermissionDenied(
                "synthetic source is configured to refuse capture".to_string(),
            ));
        }

        if !request.video {
            return Err(RecorderError::NoCaptureSource(
                "a video track is required".to_string(),
            ));
        }

        let stream = SyntheticStream {
            id: format!("synthetic-{}", uuid::Uuid::new_v4()),
            has_audio: request.audio && self.with_audio,
            live: true,
        };

        info!(
            "Synthetic capture granted: {} (audio={})",
            stream.id, stream.has_audio
        );

        Ok(Box::new(stream))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

pub struct SyntheticStream {
    id: String,
    has_audio: bool,
    live: bool,
}

#[async_trait::async_trait]
impl CaptureStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_audio(&self) -> bool {
        self.has_audio
    }

    async fn release(&mut self) -> RecorderResult<()> {
        if !self.live {
            warn!("Synthetic stream {} already released", self.id);
            return Ok(());
        }

        self.live = false;
        info!("Synthetic stream {} released", self.id);
        Ok(())
    }
}

/// Builds synthetic encoders
pub struct SyntheticEncoderFactory {
    fragment_bytes: usize,
    timeslice: Duration,
}

impl SyntheticEncoderFactory {
    pub fn new(fragment_bytes: usize, timeslice_ms: u64) -> Self {
        Self {
            fragment_bytes,
            timeslice: Duration::from_millis(timeslice_ms.max(1)),
        }
    }
}

impl EncoderFactory for SyntheticEncoderFactory {
    fn create(&self, stream: &dyn CaptureStream) -> RecorderResult<Box<dyn Encoder>> {
        Ok(Box::new(SyntheticEncoder {
            name: format!("synthetic-encoder:{}", stream.id()),
            fragment_bytes: self.fragment_bytes,
            timeslice: self.timeslice,
            stop_tx: None,
            task: None,
        }))
    }
}

/// Emits one generated fragment per timeslice and a proportional flush on stop
pub struct SyntheticEncoder {
    name: String,
    fragment_bytes: usize,
    timeslice: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SyntheticEncoder {
    fn payload(sequence: u64, len: usize) -> Bytes {
        (0..len)
            .map(|i| (sequence as usize).wrapping_add(i) as u8)
            .collect::<Vec<u8>>()
            .into()
    }
}

#[async_trait::async_trait]
impl Encoder for SyntheticEncoder {
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<EncoderEvent>> {
        if self.task.is_some() {
            return Err(RecorderError::EncoderFault("already encoding".to_string()));
        }

        let (tx, rx) = mpsc::channel(32);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let fragment_bytes = self.fragment_bytes;
        let timeslice = self.timeslice;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + timeslice, timeslice);
            let mut sequence: u64 = 0;
            let mut last_flush = Instant::now();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let fragment = SyntheticEncoder::payload(sequence, fragment_bytes);
                        sequence += 1;
                        last_flush = Instant::now();
                        if tx.send(EncoderEvent::Fragment(fragment)).await.is_err() {
                            debug!("Synthetic encoder receiver dropped");
                            return;
                        }
                    }
                    _ = &mut stop_rx => {
                        // Flush whatever accumulated since the last timeslice
                        let elapsed = last_flush.elapsed().as_millis();
                        let partial = (fragment_bytes as u128 * elapsed
                            / timeslice.as_millis().max(1))
                            .min(fragment_bytes as u128) as usize;
                        let _ = tx
                            .send(EncoderEvent::Fragment(SyntheticEncoder::payload(sequence, partial)))
                            .await;
                        return;
                    }
                }
            }
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);

        info!("{} started ({}ms timeslice)", self.name, timeslice.as_millis());

        Ok(rx)
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        task.await
            .map_err(|e| RecorderError::EncoderFault(format!("encoder task panicked: {}", e)))?;

        info!("{} finalized", self.name);
        Ok(())
    }

    fn is_encoding(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
