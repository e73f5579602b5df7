//! Async animation driver.
//!
//! Consumes the engine's layout channel on a tokio task and reports finished
//! fades back on the completion channel. The engine picks those up with
//! `drain_completions` on its own schedule, so the animator never calls into
//! the engine.

use choreo_env::{Animator, CompletionSender, LayoutEvent, LayoutReceiver};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// What the driver saw before the layout channel closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimatorStats {
    pub layout_passes: u64,
    pub fades: u64,
    pub undelivered: u64,
}

/// Runs until every `ChannelSink` clone is dropped.
///
/// Fades run concurrently; the driver waits for all of them before
/// returning.
pub async fn run_animator<A: Animator>(
    animator: Arc<A>,
    mut events: LayoutReceiver,
    completions: CompletionSender,
) -> AnimatorStats {
    let mut stats = AnimatorStats::default();
    let mut fades = JoinSet::new();

    while let Some(event) = events.recv().await {
        match event {
            LayoutEvent::Targets(targets) => {
                stats.layout_passes += 1;
                animator.retarget(&targets).await;
            }
            LayoutEvent::FadeOut(id) => {
                debug!("Fading out {}", id);
                let animator = Arc::clone(&animator);
                let completions = completions.clone();
                fades.spawn(async move {
                    animator.fade_out(id).await;
                    completions.send(id)
                });
            }
        }
    }

    while let Some(joined) = fades.join_next().await {
        stats.fades += 1;
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Fade finished but nobody is listening: {}", e);
                stats.undelivered += 1;
            }
            Err(e) => {
                warn!("Fade task failed: {}", e);
                stats.undelivered += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use choreo_core::{ChoreographyEngine, Shape};
    use choreo_env::{
        completion_channel, layout_channel, LayoutSink, ParticipantId, ParticipantTarget,
        TokioAnimator,
    };
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fade_completion_reaches_engine() {
        let (sink, events) = layout_channel();
        let (completions_tx, mut completions_rx) = completion_channel();
        let animator = Arc::new(TokioAnimator::new(Duration::from_millis(2)));
        let driver = tokio::spawn(run_animator(Arc::clone(&animator), events, completions_tx));

        let mut engine = ChoreographyEngine::default().with_sink(Box::new(sink));
        let a = engine.add_participant("A", Shape::Circle, "red");
        let b = engine.add_participant("B", Shape::Circle, "red");
        engine.add_message(a, b, "ping", 0.0, 500.0, None).unwrap();
        engine.seek_to(100.0);

        engine.remove_participant(a);
        assert_eq!(completions_rx.next().await, Some(a));
        assert!(engine.complete_removal(a));
        assert!(engine.participant(a).is_none());

        drop(engine);
        let stats = driver.await.unwrap();
        assert_eq!(stats.fades, 1);
        assert_eq!(stats.undelivered, 0);
        // two adds, one seek transition, one removal relayout
        assert_eq!(stats.layout_passes, 4);
        assert_eq!(animator.fade_count(), 1);
    }

    /// Records every retarget it receives.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Vec<ParticipantTarget>>>,
    }

    #[async_trait]
    impl Animator for Recorder {
        async fn retarget(&self, targets: &[ParticipantTarget]) {
            self.seen.lock().unwrap().push(targets.to_vec());
        }

        async fn fade_out(&self, _id: ParticipantId) {}
    }

    #[tokio::test]
    async fn test_retargets_follow_engine_order() {
        let (sink, events) = layout_channel();
        let (completions_tx, _completions_rx) = completion_channel();
        let recorder = Arc::new(Recorder::default());
        let driver = tokio::spawn(run_animator(Arc::clone(&recorder), events, completions_tx));

        let mut engine = ChoreographyEngine::default().with_sink(Box::new(sink));
        engine.add_participant("A", Shape::Circle, "red");
        engine.set_radius(10.0).unwrap();
        drop(engine);
        driver.await.unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1][0].opacity, 0.0);
        assert_eq!((seen[1][0].x, seen[1][0].y), (400.0, 300.0));
    }

    #[tokio::test]
    async fn test_completion_without_listener_is_counted() {
        let (sink, events) = layout_channel();
        let (completions_tx, completions_rx) = completion_channel();
        drop(completions_rx);
        let driver = tokio::spawn(run_animator(
            Arc::new(TokioAnimator::new(Duration::ZERO)),
            events,
            completions_tx,
        ));

        sink.emit(LayoutEvent::FadeOut(ParticipantId(9)));
        drop(sink);

        let stats = driver.await.unwrap();
        assert_eq!(stats.fades, 1);
        assert_eq!(stats.undelivered, 1);
    }
}
