//! Layout notification channel out of the engine.

use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};

/// Target visual values for one participant.
///
/// The engine computes these; a renderer interpolates toward them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipantTarget {
    pub id: ParticipantId,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
}

/// Something the rendering side needs to act on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutEvent {
    /// A layout pass finished; one target per participant still on record
    Targets(Vec<ParticipantTarget>),

    /// The participant was marked for removal and should fade to opacity 0.
    /// The animator reports back once the fade has finished.
    FadeOut(ParticipantId),
}

/// Receiver of the engine's layout output.
///
/// # Flow
///
/// ```text
/// Engine                  LayoutSink                 Animator
///   |                         |                          |
///   |-- emit(Targets) ------->|------------------------->|-- tween toward targets
///   |-- emit(FadeOut(id)) --->|------------------------->|-- fade, then
///   |<------------------- completion(id) ----------------|
///   |-- complete_removal(id)  |                          |
/// ```
///
/// Implementations must not call back into the engine from `emit`.
pub trait LayoutSink: Send + Sync {
    /// Delivers one event. Must not block.
    fn emit(&self, event: LayoutEvent);
}

/// Sink that discards everything (engine used headless).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LayoutSink for NullSink {
    fn emit(&self, _event: LayoutEvent) {}
}
