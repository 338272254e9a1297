// Scripted platform for driving the recorder deterministically
//
// The capture source grants or refuses according to a script and can hold
// every acquisition until the test opens the gate. The encoder hands its
// event sender to a shared witness so tests decide exactly which fragments
// arrive and when.

#![allow(dead_code)]

use anyhow::Result;
use screen_recorder::{
    CaptureRequest, CaptureSource, CaptureStream, Encoder, EncoderEvent, EncoderFactory, Platform,
    RecorderConfig, RecorderController, RecorderError, RecorderResult, RecorderSnapshot,
    SessionState,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

/// How the scripted source answers one acquisition
#[derive(Debug, Clone, Copy)]
pub enum Acquire {
    Grant,
    Deny,
    NoSource,
}

/// Shared counters and the live encoder's sender
#[derive(Default)]
pub struct Witness {
    pub acquisitions: AtomicUsize,
    pub releases: AtomicUsize,
    pub encoders_created: AtomicUsize,
    pub encoder_starts: AtomicUsize,
    pub encoder_stops: AtomicUsize,
    feeder: Mutex<Option<mpsc::Sender<EncoderEvent>>>,
    gate: Notify,
    stop_gate: Notify,
}

impl Witness {
    /// Push an event from the running encoder
    ///
    /// Returns false when no encoder is running.
    pub async fn emit(&self, event: EncoderEvent) -> bool {
        let tx = self.feeder.lock().unwrap().clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    pub async fn emit_bytes(&self, data: Vec<u8>) -> bool {
        self.emit(EncoderEvent::Fragment(data.into())).await
    }

    /// Let one held acquisition resolve
    pub fn open_gate(&self) {
        self.gate.notify_one();
    }

    /// Let one held encoder stop finish
    pub fn open_stop_gate(&self) {
        self.stop_gate.notify_one();
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        Self::count(&self.acquisitions)
    }

    pub fn releases(&self) -> usize {
        Self::count(&self.releases)
    }

    pub fn encoders_created(&self) -> usize {
        Self::count(&self.encoders_created)
    }

    pub fn encoder_stops(&self) -> usize {
        Self::count(&self.encoder_stops)
    }

    pub fn encoder_running(&self) -> bool {
        self.feeder.lock().unwrap().is_some()
    }
}

pub struct ScriptedSource {
    witness: Arc<Witness>,
    script: Mutex<VecDeque<Acquire>>,
    gated: bool,
}

#[async_trait::async_trait]
impl CaptureSource for ScriptedSource {
    async fn acquire(&self, request: CaptureRequest) -> RecorderResult<Box<dyn CaptureStream>> {
        assert!(request.video, "video must always be requested");
        assert!(request.audio, "audio must be requested");

        let n = self.witness.acquisitions.fetch_add(1, Ordering::SeqCst);

        if self.gated {
            self.witness.gate.notified().await;
        }

        let next = self.script.lock().unwrap().pop_front().unwrap_or(Acquire::Grant);
        match next {
            Acquire::Grant => Ok(Box::new(ScriptedStream {
                id: format!("scripted-{}", n),
                witness: Arc::clone(&self.witness),
                released: false,
            })),
            Acquire::Deny => Err(RecorderError::PermissionDenied("user dismissed picker".into())),
            Acquire::NoSource => Err(RecorderError::NoCaptureSource("no surface".into())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct ScriptedStream {
    id: String,
    witness: Arc<Witness>,
    released: bool,
}

#[async_trait::async_trait]
impl CaptureStream for ScriptedStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_audio(&self) -> bool {
        true
    }

    async fn release(&mut self) -> RecorderResult<()> {
        assert!(!self.released, "stream {} released twice", self.id);
        self.released = true;
        self.witness.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct ScriptedEncoderFactory {
    witness: Arc<Witness>,
    flush: Option<Vec<u8>>,
    finalize_fault: Option<String>,
    fail_start: bool,
    hold_stop: bool,
}

impl EncoderFactory for ScriptedEncoderFactory {
    fn create(&self, _stream: &dyn CaptureStream) -> RecorderResult<Box<dyn Encoder>> {
        self.witness.encoders_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedEncoder {
            witness: Arc::clone(&self.witness),
            flush: self.flush.clone(),
            finalize_fault: self.finalize_fault.clone(),
            fail_start: self.fail_start,
            hold_stop: self.hold_stop,
            running: false,
        }))
    }
}

pub struct ScriptedEncoder {
    witness: Arc<Witness>,
    flush: Option<Vec<u8>>,
    finalize_fault: Option<String>,
    fail_start: bool,
    hold_stop: bool,
    running: bool,
}

#[async_trait::async_trait]
impl Encoder for ScriptedEncoder {
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<EncoderEvent>> {
        if self.fail_start {
            return Err(RecorderError::EncoderFault("unsupported codec".into()));
        }

        let (tx, rx) = mpsc::channel(64);
        *self.witness.feeder.lock().unwrap() = Some(tx);
        self.witness.encoder_starts.fetch_add(1, Ordering::SeqCst);
        self.running = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;

        if self.hold_stop {
            self.witness.stop_gate.notified().await;
        }

        let tx = self.witness.feeder.lock().unwrap().take();
        if let Some(tx) = tx {
            if let Some(flush) = self.flush.clone() {
                let _ = tx.send(EncoderEvent::Fragment(flush.into())).await;
            }
            if let Some(reason) = self.finalize_fault.clone() {
                let _ = tx.send(EncoderEvent::Fault(reason)).await;
            }
        }

        self.witness.encoder_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_encoding(&self) -> bool {
        self.running
    }

    fn name(&self) -> &str {
        "scripted-encoder"
    }
}

/// Builder for a recorder wired to the scripted platform
#[derive(Default)]
pub struct Harness {
    pub config: RecorderConfig,
    pub script: Vec<Acquire>,
    pub gated: bool,
    pub flush: Option<Vec<u8>>,
    /// Fault the encoder reports while finalizing
    pub finalize_fault: Option<String>,
    pub fail_encoder_start: bool,
    /// Hold encoder stop until `open_stop_gate`
    pub hold_stop: bool,
}

impl Harness {
    pub fn build(self) -> (RecorderController, Arc<Witness>) {
        let witness = Arc::new(Witness::default());

        let source = ScriptedSource {
            witness: Arc::clone(&witness),
            script: Mutex::new(self.script.into_iter().collect()),
            gated: self.gated,
        };
        let encoders = ScriptedEncoderFactory {
            witness: Arc::clone(&witness),
            flush: self.flush,
            finalize_fault: self.finalize_fault,
            fail_start: self.fail_encoder_start,
            hold_stop: self.hold_stop,
        };

        let platform = Platform::new(Arc::new(source), Arc::new(encoders));
        (RecorderController::new(platform, self.config), witness)
    }
}

pub fn recorder() -> (RecorderController, Arc<Witness>) {
    Harness::default().build()
}

/// Wait until the published snapshot satisfies `pred`
pub async fn wait_until(
    recorder: &RecorderController,
    pred: impl FnMut(&RecorderSnapshot) -> bool,
) -> Result<()> {
    let mut rx = recorder.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred)).await??;
    Ok(())
}

pub async fn wait_for_state(recorder: &RecorderController, state: SessionState) -> Result<()> {
    wait_until(recorder, |snapshot| snapshot.state == state).await
}

/// Bytes of a given size, tagged so fragments are distinguishable
pub fn payload(tag: u8, len: usize) -> Vec<u8> {
    vec![tag; len]
}
