//! Animation collaborator abstraction.

use async_trait::async_trait;
use crate::sink::ParticipantTarget;
use crate::types::ParticipantId;

/// The asynchronous side of the layout channel.
///
/// An animator owns the tweening of visual properties toward the engine's
/// targets. It runs on its own schedule, decoupled from the virtual clock.
///
/// # Implementations
///
/// - **Production**: a renderer-backed tween library
/// - **Harness**: `TokioAnimator`, which simply waits a fixed fade time
#[async_trait]
pub trait Animator: Send + Sync + 'static {
    /// Starts moving participants toward new targets.
    ///
    /// Returns immediately; tweening continues in the background.
    async fn retarget(&self, targets: &[ParticipantTarget]);

    /// Fades a participant out, resolving once the fade has finished.
    async fn fade_out(&self, id: ParticipantId);
}
