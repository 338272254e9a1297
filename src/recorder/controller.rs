use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::chunks::{ChunkSequence, Fragment};
use super::config::RecorderConfig;
use super::state::{
    RecorderSnapshot, SessionState, SessionSummary, StartOutcome, StopOutcome, ToggleOutcome,
};
use crate::error::{RecorderError, RecorderResult};
use crate::export::{ExportArtifact, ExportAssembler, ExportSink};
use crate::platform::{CaptureRequest, CaptureStream, Encoder, EncoderEvent, Platform};

/// Live capture stream, its encoder, and the task draining the encoder
struct Pipeline {
    stream: Box<dyn CaptureStream>,
    encoder: Box<dyn Encoder>,
    pump: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    id: String,
    started_at: DateTime<Utc>,
    fragments_before: usize,
    bytes_before: usize,
}

#[derive(Default)]
struct SessionSlot {
    state: SessionState,
    /// Stop arrived while `Requesting`
    cancel_requested: bool,
    session: Option<ActiveSession>,
    /// Present only while `Recording`
    pipeline: Option<Pipeline>,
    /// Fault reported while `stop()` was finalizing
    finalize_fault: Option<String>,
}

struct Inner {
    platform: Platform,
    config: RecorderConfig,
    assembler: ExportAssembler,
    // Lock order: slot, then chunks
    slot: Mutex<SessionSlot>,
    chunks: Mutex<ChunkSequence>,
    snapshot: watch::Sender<RecorderSnapshot>,
}

/// Drives a capture session and owns the fragments it produces
///
/// State moves `Idle → Requesting → Recording → Stopped → Idle`. Every
/// failure path ends in `Idle` with the stream and encoder released.
#[derive(Clone)]
pub struct RecorderController {
    inner: Arc<Inner>,
}

impl RecorderController {
    pub fn new(platform: Platform, config: RecorderConfig) -> Self {
        let (snapshot, _) = watch::channel(RecorderSnapshot::default());
        let assembler = ExportAssembler::new(config.mime_type.clone(), config.file_name.clone());

        Self {
            inner: Arc::new(Inner {
                platform,
                config,
                assembler,
                slot: Mutex::new(SessionSlot::default()),
                chunks: Mutex::new(ChunkSequence::new()),
                snapshot,
            }),
        }
    }

    /// Request a capture stream and begin recording
    ///
    /// Only an idle recorder starts a new request; otherwise this is a no-op.
    pub async fn start(&self) -> RecorderResult<StartOutcome> {
        {
            let mut slot = self.inner.slot.lock().await;
            if slot.state != SessionState::Idle {
                warn!("Start ignored: recorder is {:?}", slot.state);
                return Ok(StartOutcome::AlreadyActive(slot.state));
            }

            slot.state = SessionState::Requesting;
            slot.cancel_requested = false;
            slot.finalize_fault = None;
            self.inner.publish_state(&slot);
            self.inner.publish_notice(None);
        }

        let (stream, encoder, events) = match self.inner.open_pipeline().await {
            Ok(opened) => opened,
            Err(e) => {
                warn!("Capture request failed: {}", e);
                let mut slot = self.inner.slot.lock().await;
                slot.state = SessionState::Idle;
                slot.cancel_requested = false;
                self.inner.publish_state(&slot);
                self.inner.publish_notice(Some(e.notice()));
                return Err(e);
            }
        };

        let (session_id, cancelled) = {
            let mut slot = self.inner.slot.lock().await;

            let (fragments_before, bytes_before) = {
                let mut chunks = self.inner.chunks.lock().await;
                if !self.inner.config.append_sessions && !chunks.is_empty() {
                    info!("Clearing {} fragments from the previous session", chunks.len());
                    chunks.reset();
                    self.inner.publish_chunks(&chunks);
                }
                (chunks.len(), chunks.total_bytes())
            };

            let session = ActiveSession {
                id: uuid::Uuid::new_v4().to_string(),
                started_at: Utc::now(),
                fragments_before,
                bytes_before,
            };

            info!(
                "Recording session {} started (stream {}, audio={}, encoder {})",
                session.id,
                stream.id(),
                stream.has_audio(),
                encoder.name()
            );

            let pump = tokio::spawn(Inner::pump(
                Arc::clone(&self.inner),
                events,
                session.id.clone(),
            ));

            slot.pipeline = Some(Pipeline {
                stream,
                encoder,
                pump: Some(pump),
            });
            let session_id = session.id.clone();
            slot.session = Some(session);
            slot.state = SessionState::Recording;
            self.inner.publish_state(&slot);

            // Claim the pipeline before anyone else can observe `Recording`
            let cancelled = if std::mem::take(&mut slot.cancel_requested) {
                self.inner.begin_stop(&mut slot)
            } else {
                None
            };

            (session_id, cancelled)
        };

        if let Some((pipeline, session)) = cancelled {
            info!("Stop was requested during acquisition; stopping {}", session_id);
            let summary = self.inner.finish_stop(pipeline, session).await?;
            return Ok(StartOutcome::Cancelled(summary));
        }

        Ok(StartOutcome::Started { session_id })
    }

    /// Finalize the encoder and release the capture stream
    ///
    /// Every fragment the encoder flushes before closing is accepted. Stopping
    /// while a request is pending cancels it once acquisition resolves.
    pub async fn stop(&self) -> RecorderResult<StopOutcome> {
        let (pipeline, session) = {
            let mut slot = self.inner.slot.lock().await;
            match slot.state {
                SessionState::Recording => {}
                SessionState::Requesting => {
                    info!("Stop requested while acquiring; will stop once the stream resolves");
                    slot.cancel_requested = true;
                    return Ok(StopOutcome::CancelPending);
                }
                other => {
                    debug!("Stop ignored: recorder is {:?}", other);
                    return Ok(StopOutcome::NotRecording);
                }
            }

            match self.inner.begin_stop(&mut slot) {
                Some(claimed) => claimed,
                // Teardown already owns the pipeline
                None => return Ok(StopOutcome::NotRecording),
            }
        };

        let summary = self.inner.finish_stop(pipeline, session).await?;
        Ok(StopOutcome::Stopped(summary))
    }

    /// Start/Stop command: stops an active session, otherwise starts one
    pub async fn toggle(&self) -> RecorderResult<ToggleOutcome> {
        match self.state() {
            // While finalizing the control is inert; stop() reports NotRecording
            SessionState::Recording | SessionState::Requesting | SessionState::Stopped => {
                Ok(ToggleOutcome::Stop(self.stop().await?))
            }
            SessionState::Idle => Ok(ToggleOutcome::Start(self.start().await?)),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> RecorderSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<RecorderSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Whether any fragments are available for export
    pub fn can_export(&self) -> bool {
        self.inner.snapshot.borrow().can_export()
    }

    /// Copy of the accumulated fragments in arrival order
    pub async fn current_sequence(&self) -> Vec<Fragment> {
        self.inner.chunks.lock().await.fragments().to_vec()
    }

    /// Discard accumulated fragments
    ///
    /// Rejected while a session is active.
    pub async fn reset(&self) -> RecorderResult<()> {
        let slot = self.inner.slot.lock().await;
        if slot.state != SessionState::Idle {
            return Err(RecorderError::Busy(slot.state));
        }

        let mut chunks = self.inner.chunks.lock().await;
        info!("Discarding {} accumulated fragments", chunks.len());
        chunks.reset();
        self.inner.publish_chunks(&chunks);
        Ok(())
    }

    /// Assemble the current sequence without saving it
    pub async fn artifact(&self) -> Option<ExportArtifact> {
        let chunks = self.inner.chunks.lock().await;
        self.inner.assembler.assemble(chunks.fragments())
    }

    /// Assemble the current sequence and hand it to a sink
    ///
    /// Returns `Ok(None)` without touching the sink when nothing was recorded.
    pub async fn export(&self, sink: &dyn ExportSink) -> RecorderResult<Option<ExportArtifact>> {
        let Some(artifact) = self.artifact().await else {
            debug!("Export skipped: no fragments recorded");
            return Ok(None);
        };

        sink.save(&artifact).await?;
        info!(
            "Exported {} ({} bytes, {})",
            artifact.file_name,
            artifact.len(),
            artifact.mime_type
        );

        Ok(Some(artifact))
    }
}

impl Inner {
    async fn open_pipeline(
        &self,
    ) -> RecorderResult<(Box<dyn CaptureStream>, Box<dyn Encoder>, mpsc::Receiver<EncoderEvent>)> {
        info!("Requesting capture stream from {}", self.platform.capture.name());

        let mut stream = self.platform.capture.acquire(CaptureRequest::default()).await?;

        let mut encoder = match self.platform.encoders.create(stream.as_ref()) {
            Ok(encoder) => encoder,
            Err(e) => {
                release_stream(stream.as_mut()).await;
                return Err(e);
            }
        };

        match encoder.start().await {
            Ok(events) => Ok((stream, encoder, events)),
            Err(e) => {
                release_stream(stream.as_mut()).await;
                Err(e)
            }
        }
    }

    /// Take the pipeline out of a `Recording` slot and move to `Stopped`
    fn begin_stop(&self, slot: &mut SessionSlot) -> Option<(Pipeline, ActiveSession)> {
        let session = slot.session.clone()?;
        let pipeline = slot.pipeline.take()?;

        slot.state = SessionState::Stopped;
        self.publish_state(slot);
        Some((pipeline, session))
    }

    /// Close a claimed pipeline and settle back to `Idle`
    async fn finish_stop(
        &self,
        pipeline: Pipeline,
        session: ActiveSession,
    ) -> RecorderResult<SessionSummary> {
        info!("Stopping recording session {}", session.id);

        let closed = self.close_pipeline(pipeline).await;

        let (summary, fault) = {
            let mut slot = self.slot.lock().await;
            slot.state = SessionState::Idle;
            self.publish_state(&slot);

            let chunks = self.chunks.lock().await;
            let summary = SessionSummary {
                session_id: session.id,
                started_at: session.started_at,
                stopped_at: Utc::now(),
                fragments: chunks.len().saturating_sub(session.fragments_before),
                bytes: chunks.total_bytes().saturating_sub(session.bytes_before),
            };
            (summary, slot.finalize_fault.take())
        };

        let result = closed.and_then(|()| match fault {
            Some(reason) => Err(RecorderError::EncoderFault(reason)),
            None => Ok(()),
        });
        if let Err(e) = result {
            warn!(
                "Recording session {} stopped with {} fragments kept: {}",
                summary.session_id, summary.fragments, e
            );
            self.publish_notice(Some(e.notice()));
            return Err(e);
        }

        info!(
            "Recording session {} stopped: {} fragments, {} bytes in {:.1}s",
            summary.session_id,
            summary.fragments,
            summary.bytes,
            summary.duration_secs()
        );
        Ok(summary)
    }

    /// Sole writer of the chunk sequence while a session records
    async fn pump(self: Arc<Self>, mut events: mpsc::Receiver<EncoderEvent>, session_id: String) {
        debug!("Fragment pump started for {}", session_id);

        while let Some(event) = events.recv().await {
            match event {
                EncoderEvent::Fragment(data) => {
                    let size = data.len();
                    let mut chunks = self.chunks.lock().await;
                    if chunks.append(Fragment::from(data)) {
                        debug!("Accepted fragment #{} ({} bytes)", chunks.len(), size);
                        self.publish_chunks(&chunks);
                    } else {
                        debug!("Dropped empty fragment");
                    }
                }
                EncoderEvent::Fault(reason) => {
                    error!("Encoder fault in session {}: {}", session_id, reason);
                    // Stop reading so a finalizing encoder never blocks on us
                    drop(events);
                    self.abort_on_fault(reason).await;
                    return;
                }
            }
        }

        debug!("Fragment pump finished for {}", session_id);
    }

    /// Implicit stop after an encoder fault; accumulated fragments are kept
    async fn abort_on_fault(&self, reason: String) {
        let mut pipeline = {
            let mut slot = self.slot.lock().await;
            let Some(pipeline) = slot.pipeline.take() else {
                // stop() is finalizing and reports the fault itself
                slot.finalize_fault = Some(reason);
                return;
            };
            slot.state = SessionState::Stopped;
            self.publish_state(&slot);
            pipeline
        };

        // This task is the pump; detach its own handle
        pipeline.pump = None;
        if let Err(e) = self.close_pipeline(pipeline).await {
            warn!("Cleanup after encoder fault reported: {}", e);
        }

        let mut slot = self.slot.lock().await;
        slot.state = SessionState::Idle;
        slot.cancel_requested = false;
        self.publish_state(&slot);
        self.publish_notice(Some(RecorderError::EncoderFault(reason).notice()));
    }

    /// Finalize encoder, drain the pump, release the stream; each exactly once
    async fn close_pipeline(&self, pipeline: Pipeline) -> RecorderResult<()> {
        let Pipeline {
            mut stream,
            mut encoder,
            pump,
        } = pipeline;

        let encoder_result = encoder.stop().await;
        if let Err(e) = &encoder_result {
            error!("Failed to stop {}: {}", encoder.name(), e);
        }

        if let Some(pump) = pump {
            if encoder_result.is_err() {
                // The event channel may never close
                pump.abort();
            }
            if let Err(e) = pump.await {
                if !e.is_cancelled() {
                    error!("Fragment pump panicked: {}", e);
                }
            }
        }

        let release_result = stream.release().await;
        if let Err(e) = &release_result {
            error!("Failed to release stream {}: {}", stream.id(), e);
        }

        encoder_result.and(release_result)
    }

    fn publish_state(&self, slot: &SessionSlot) {
        self.snapshot.send_modify(|snapshot| {
            snapshot.state = slot.state;
            if let Some(session) = &slot.session {
                snapshot.session_id = Some(session.id.clone());
                snapshot.started_at = Some(session.started_at);
            }
        });
    }

    fn publish_chunks(&self, chunks: &ChunkSequence) {
        self.snapshot.send_modify(|snapshot| {
            snapshot.fragment_count = chunks.len();
            snapshot.total_bytes = chunks.total_bytes();
        });
    }

    fn publish_notice(&self, notice: Option<String>) {
        self.snapshot.send_modify(|snapshot| snapshot.notice = notice);
    }
}

async fn release_stream(stream: &mut dyn CaptureStream) {
    if let Err(e) = stream.release().await {
        error!("Failed to release stream {}: {}", stream.id(), e);
    }
}
