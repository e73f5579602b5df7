//! Tokio-backed implementations of the layout channel and animator.

use crate::animator::Animator;
use crate::error::ChoreoError;
use crate::sink::{LayoutEvent, LayoutSink, ParticipantTarget};
use crate::types::ParticipantId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Receiving half of the layout channel (animator side).
pub type LayoutReceiver = mpsc::UnboundedReceiver<LayoutEvent>;

/// Layout sink backed by an unbounded tokio channel.
///
/// `emit` never blocks, so it is safe to call from the synchronous engine.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LayoutEvent>,
}

impl LayoutSink for ChannelSink {
    fn emit(&self, event: LayoutEvent) {
        // Animator gone: nobody is rendering, drop the event.
        let _ = self.tx.send(event);
    }
}

/// Creates a layout channel.
pub fn layout_channel() -> (ChannelSink, LayoutReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, rx)
}

/// Animator side of the "removal complete" signal.
#[derive(Debug, Clone)]
pub struct CompletionSender {
    tx: mpsc::UnboundedSender<ParticipantId>,
}

impl CompletionSender {
    /// Reports that the fade-out of `id` has finished.
    pub fn send(&self, id: ParticipantId) -> Result<(), ChoreoError> {
        self.tx
            .send(id)
            .map_err(|e| ChoreoError::channel(format!("completion for {} dropped", e.0)))
    }
}

/// Engine side of the "removal complete" signal.
#[derive(Debug)]
pub struct CompletionReceiver {
    rx: mpsc::UnboundedReceiver<ParticipantId>,
}

impl CompletionReceiver {
    /// Returns the next queued completion without waiting.
    pub fn try_next(&mut self) -> Option<ParticipantId> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next completion. `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<ParticipantId> {
        self.rx.recv().await
    }
}

/// Creates a completion channel.
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CompletionSender { tx }, CompletionReceiver { rx })
}

/// Animator that models a fade as a fixed tokio sleep.
///
/// Used by the harness and in tests; it renders nothing.
#[derive(Debug)]
pub struct TokioAnimator {
    fade: Duration,
    retargets: AtomicU64,
    fades: AtomicU64,
}

impl TokioAnimator {
    /// Creates an animator whose fades take `fade` of wall time.
    pub fn new(fade: Duration) -> Self {
        Self {
            fade,
            retargets: AtomicU64::new(0),
            fades: AtomicU64::new(0),
        }
    }

    /// Number of layout passes received so far.
    pub fn retarget_count(&self) -> u64 {
        self.retargets.load(Ordering::Relaxed)
    }

    /// Number of fades completed so far.
    pub fn fade_count(&self) -> u64 {
        self.fades.load(Ordering::Relaxed)
    }
}

impl Default for TokioAnimator {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

#[async_trait]
impl Animator for TokioAnimator {
    async fn retarget(&self, _targets: &[ParticipantTarget]) {
        self.retargets.fetch_add(1, Ordering::Relaxed);
    }

    async fn fade_out(&self, _id: ParticipantId) {
        tokio::time::sleep(self.fade).await;
        self.fades.fetch_add(1, Ordering::Relaxed);
    }
}
