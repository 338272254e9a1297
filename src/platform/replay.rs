// Replay capture platform
//
// Treats an existing media file as a live capture: the file's bytes are
// emitted as fragments, one slice per timeslice, until the recorder stops.

use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info};

use super::{CaptureRequest, CaptureSource, CaptureStream, Encoder, EncoderEvent, EncoderFactory};
use crate::error::{RecorderError, RecorderResult};

pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait::async_trait]
impl CaptureSource for ReplaySource {
    async fn acquire(&self, _request: CaptureRequest) -> RecorderResult<Box<dyn CaptureStream>> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| {
            RecorderError::NoCaptureSource(format!("{}: {}", self.path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(RecorderError::NoCaptureSource(format!(
                "{} is not a file",
                self.path.display()
            )));
        }

        info!(
            "Replay capture granted: {} ({} bytes)",
            self.path.display(),
            metadata.len()
        );

        Ok(Box::new(ReplayStream {
            id: self.path.display().to_string(),
            live: true,
        }))
    }

    fn name(&self) -> &str {
        "replay"
    }
}

pub struct ReplayStream {
    id: String,
    live: bool,
}

#[async_trait::async_trait]
impl CaptureStream for ReplayStream {
    fn id(&self) -> &str {
        &self.id
    }

    // The replayed container is opaque, so no track layout is known
    fn has_audio(&self) -> bool {
        false
    }

    async fn release(&mut self) -> RecorderResult<()> {
        if !std::mem::replace(&mut self.live, false) {
            return Ok(());
        }

        info!("Replay stream {} released", self.id);
        Ok(())
    }
}

pub struct ReplayEncoderFactory {
    path: PathBuf,
    fragment_bytes: usize,
    timeslice: Duration,
}

impl ReplayEncoderFactory {
    pub fn new(path: PathBuf, fragment_bytes: usize, timeslice_ms: u64) -> Self {
        Self {
            path,
            fragment_bytes: fragment_bytes.max(1),
            timeslice: Duration::from_millis(timeslice_ms.max(1)),
        }
    }
}

impl EncoderFactory for ReplayEncoderFactory {
    fn create(&self, stream: &dyn CaptureStream) -> RecorderResult<Box<dyn Encoder>> {
        Ok(Box::new(ReplayEncoder {
            name: format!("replay-encoder:{}", stream.id()),
            path: self.path.clone(),
            fragment_bytes: self.fragment_bytes,
            timeslice: self.timeslice,
            stop_tx: None,
            task: None,
        }))
    }
}

pub struct ReplayEncoder {
    name: String,
    path: PathBuf,
    fragment_bytes: usize,
    timeslice: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl Encoder for ReplayEncoder {
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<EncoderEvent>> {
        if self.task.is_some() {
            return Err(RecorderError::EncoderFault("already encoding".to_string()));
        }

        let mut file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            RecorderError::EncoderFault(format!("failed to open {}: {}", self.path.display(), e))
        })?;

        let (tx, rx) = mpsc::channel(32);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let fragment_bytes = self.fragment_bytes as u64;
        let timeslice = self.timeslice;
        let name = self.name.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + timeslice, timeslice);
            let mut exhausted = false;

            loop {
                tokio::select! {
                    _ = ticker.tick(), if !exhausted => {
                        let mut buf = Vec::with_capacity(fragment_bytes as usize);
                        match (&mut file).take(fragment_bytes).read_to_end(&mut buf).await {
                            Ok(0) => {
                                info!("{} reached end of input", name);
                                exhausted = true;
                            }
                            Ok(_) => {
                                if tx.send(EncoderEvent::Fragment(Bytes::from(buf))).await.is_err() {
                                    return;
                                }
                            }
                            Err(e) => {
                                error!("{} read failed: {}", name, e);
                                let _ = tx.send(EncoderEvent::Fault(e.to_string())).await;
                                return;
                            }
                        }
                    }
                    _ = &mut stop_rx => return,
                }
            }
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);

        info!("{} started", self.name);

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
