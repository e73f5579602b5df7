//! The choreography engine: virtual clock, registries and derived state.
//!
//! # State machine
//!
//! ```text
//!            start()                      auto-stop | stop()
//! {stopped} ---------> {running} ----------------------------> {stopped}
//!     ^                                                            |
//!     +-------------------- reset() (clock = 0) -------------------+
//! ```
//!
//! Derived state (active messages, visibility, layout targets) is rebuilt by
//! `advance` and `seek_to`. Callers only read it through snapshots.

use crate::layout::CircleLayout;
use crate::message::{ActiveMessage, Message, MessageLog};
use crate::participant::{Participant, ParticipantRegistry, Shape};
use crate::visibility;
use choreo_env::{
    ChoreoError, CompletionReceiver, LayoutEvent, LayoutSink, MessageId, NullSink, ParticipantId,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Tunables for a new engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Circle radius for the layout
    pub radius: f64,

    /// Circle center (x, y)
    pub center: (f64, f64),

    /// Multiplier applied to every `advance` delta
    pub speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius: 200.0,
            center: (400.0, 300.0),
            speed: 1.0,
        }
    }
}

/// Read-only view of the engine for a rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,

    /// Sorted by message id
    pub active_messages: Vec<ActiveMessage>,

    pub current_time: f64,
    pub running: bool,
    pub speed: f64,
    pub total_messages: u64,
    pub radius: f64,
    pub center: (f64, f64),
}

impl EngineSnapshot {
    /// Ids of the participants currently visible, in registry order.
    pub fn visible_ids(&self) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .filter(|p| p.visible)
            .map(|p| p.id)
            .collect()
    }

    /// Ids of the messages currently in flight.
    pub fn active_ids(&self) -> Vec<MessageId> {
        self.active_messages.iter().map(|m| m.id).collect()
    }
}

/// Deterministic, seekable timeline engine.
///
/// Every instance owns its own clock and registries. Nothing here performs
/// I/O or blocks; all operations run to completion before returning.
pub struct ChoreographyEngine {
    pub(crate) participants: ParticipantRegistry,
    pub(crate) messages: MessageLog,

    /// Working set of in-flight messages
    pub(crate) active: BTreeMap<MessageId, ActiveMessage>,

    pub(crate) current_time: f64,
    pub(crate) running: bool,
    speed: f64,
    layout: CircleLayout,
    sink: Box<dyn LayoutSink>,
    layout_passes: u64,
}

impl ChoreographyEngine {
    /// Creates a stopped engine at time 0.
    pub fn new(config: EngineConfig) -> Self {
        let speed = if config.speed.is_finite() {
            config.speed
        } else {
            warn!("Ignoring non-finite speed {} in config", config.speed);
            1.0
        };

        Self {
            participants: ParticipantRegistry::new(),
            messages: MessageLog::new(),
            active: BTreeMap::new(),
            current_time: 0.0,
            running: false,
            speed,
            layout: CircleLayout::new(
                config.radius,
                Point2::new(config.center.0, config.center.1),
            ),
            sink: Box::new(NullSink),
            layout_passes: 0,
        }
    }

    /// Attaches the layout notification channel.
    pub fn with_sink(mut self, sink: Box<dyn LayoutSink>) -> Self {
        self.sink = sink;
        self
    }

    // =========================================================================
    // CLOCK
    // =========================================================================

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!("Choreography started at t={:.1}", self.current_time);
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("Choreography stopped at t={:.1}", self.current_time);
        }
    }

    /// Starts if stopped, stops if running.
    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Stops, rewinds to 0 and clears all derived state and visuals.
    ///
    /// Registries are kept.
    pub fn reset(&mut self) {
        self.running = false;
        self.current_time = 0.0;
        self.active.clear();

        let center = self.layout.center;
        for participant in self.participants.iter_mut() {
            participant.park(center);
        }
        self.emit_targets();
        info!("Choreography reset");
    }

    /// Sets the multiplier applied to `advance` deltas.
    ///
    /// Zero freezes the clock while running; negative values run it backward.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ChoreoError> {
        if !speed.is_finite() {
            warn!("Rejected speed {}", speed);
            return Err(ChoreoError::invalid("speed", speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Moves the clock by `delta_time * speed` and updates derived state.
    ///
    /// No-op while stopped. A message is activated the first time the clock
    /// is observed inside `[timestamp, timestamp + duration]`. A message
    /// whose whole window falls between two observations is skipped and
    /// never activates.
    pub fn advance(&mut self, delta_time: f64) {
        if !self.running {
            return;
        }
        if !delta_time.is_finite() {
            warn!("Ignoring non-finite advance delta {}", delta_time);
            return;
        }

        self.current_time += delta_time * self.speed;
        let now = self.current_time;

        for message in self.messages.iter() {
            if self.active.contains_key(&message.id) {
                continue;
            }
            if now >= message.timestamp && now <= message.end_time() {
                debug!("Activated {} '{}' at t={:.1}", message.id, message.text, now);
                self.active.insert(message.id, ActiveMessage::start(message));
            }
        }

        let messages = &self.messages;
        self.active.retain(|id, active| match messages.get(*id) {
            Some(message) if message.covers(now) => {
                active.progress = message.progress_at(now);
                true
            }
            Some(message) => {
                debug!("Completed {} '{}' at t={:.1}", message.id, message.text, now);
                false
            }
            None => false,
        });

        self.refresh_visibility();

        if self.finished() {
            self.running = false;
            info!("Choreography finished at t={:.1}", now);
        }
    }

    /// Jumps the clock to `time` and rebuilds derived state from scratch.
    ///
    /// The result depends only on the messages and `time`, never on the
    /// previous active set, so repeated seeks are idempotent.
    pub fn seek_to(&mut self, time: f64) {
        if !time.is_finite() {
            warn!("Ignoring seek to non-finite time {}", time);
            return;
        }

        self.current_time = time;
        self.active = self
            .messages
            .iter()
            .filter(|m| m.covers(time))
            .map(|m| (m.id, ActiveMessage::at(m, time)))
            .collect();

        self.refresh_visibility();
    }

    /// True once the clock is past the last message end with nothing in flight.
    fn finished(&self) -> bool {
        self.active.is_empty()
            && self
                .messages
                .end_time()
                .is_some_and(|end| self.current_time > end)
    }

    // =========================================================================
    // REGISTRIES
    // =========================================================================

    /// Registers a participant and returns its id.
    ///
    /// While stopped the layout is refreshed immediately; while running it
    /// only changes in response to the clock.
    pub fn add_participant(&mut self, name: &str, shape: Shape, color: &str) -> ParticipantId {
        let id = self
            .participants
            .add(name, shape, color, self.layout.center);
        debug!("Added participant {} '{}'", id, name);

        if !self.running {
            self.relayout();
        }
        id
    }

    /// Marks a participant for fade-out.
    ///
    /// The participant stays on record until `complete_removal` is called
    /// for it. Returns false for unknown ids or repeated calls.
    pub fn remove_participant(&mut self, id: ParticipantId) -> bool {
        let Some(participant) = self.participants.get_mut(id) else {
            return false;
        };
        if participant.pending_removal {
            return false;
        }

        participant.pending_removal = true;
        participant.visible = false;
        participant.opacity = 0.0;
        debug!("Participant {} fading out", id);
        self.sink.emit(LayoutEvent::FadeOut(id));
        true
    }

    /// Deletes a participant whose fade-out has finished and re-lays-out
    /// the remainder. No-op unless the participant was marked for removal.
    pub fn complete_removal(&mut self, id: ParticipantId) -> bool {
        let pending = self
            .participants
            .get(id)
            .is_some_and(|p| p.pending_removal);
        if !pending {
            return false;
        }

        self.participants.remove(id);
        debug!("Participant {} removed", id);
        self.relayout();
        true
    }

    /// Applies every completion signal queued by the animator.
    pub fn drain_completions(&mut self, completions: &mut CompletionReceiver) -> usize {
        let mut removed = 0;
        while let Some(id) = completions.try_next() {
            if self.complete_removal(id) {
                removed += 1;
            }
        }
        removed
    }

    /// Schedules a message and returns its id.
    ///
    /// `from`/`to` are not validated. Rejects non-finite timestamps and
    /// negative or non-finite durations.
    pub fn add_message(
        &mut self,
        from: ParticipantId,
        to: ParticipantId,
        text: &str,
        timestamp: f64,
        duration: f64,
        color: Option<String>,
    ) -> Result<MessageId, ChoreoError> {
        if !timestamp.is_finite() {
            return Err(ChoreoError::invalid("timestamp", timestamp));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(ChoreoError::invalid("duration", duration));
        }

        let id = self
            .messages
            .insert(from, to, text, timestamp, duration, color);
        debug!("Scheduled {} '{}' {}->{} at t={:.1}", id, text, from, to, timestamp);
        Ok(id)
    }

    /// Removes a message (and its in-flight projection). Unknown ids are ignored.
    pub fn remove_message(&mut self, id: MessageId) -> bool {
        self.active.remove(&id);
        self.messages.remove(id).is_some()
    }

    // =========================================================================
    // LAYOUT
    // =========================================================================

    pub fn set_radius(&mut self, radius: f64) -> Result<(), ChoreoError> {
        if !radius.is_finite() || radius < 0.0 {
            warn!("Rejected radius {}", radius);
            return Err(ChoreoError::invalid("radius", radius));
        }
        self.layout.radius = radius;
        self.relayout();
        Ok(())
    }

    pub fn set_center(&mut self, x: f64, y: f64) -> Result<(), ChoreoError> {
        if !x.is_finite() {
            return Err(ChoreoError::invalid("center.x", x));
        }
        if !y.is_finite() {
            return Err(ChoreoError::invalid("center.y", y));
        }
        self.layout.center = Point2::new(x, y);
        self.relayout();
        Ok(())
    }

    pub fn radius(&self) -> f64 {
        self.layout.radius
    }

    pub fn center(&self) -> (f64, f64) {
        (self.layout.center.x, self.layout.center.y)
    }

    fn refresh_visibility(&mut self) {
        let changed = visibility::recompute(
            &mut self.participants,
            self.messages.iter(),
            self.current_time,
        );
        if changed {
            self.relayout();
        }
    }

    pub(crate) fn relayout(&mut self) {
        self.layout.apply(&mut self.participants);
        self.emit_targets();
    }

    fn emit_targets(&mut self) {
        self.layout_passes += 1;
        let targets = self.participants.iter().map(|p| p.target()).collect();
        self.sink.emit(LayoutEvent::Targets(targets));
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Messages ever added, including removed ones.
    pub fn total_messages(&self) -> u64 {
        self.messages.total()
    }

    /// Number of layout passes emitted so far.
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes
    }

    /// End of the latest-ending message.
    pub fn end_time(&self) -> Option<f64> {
        self.messages.end_time()
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn participants(&self) -> &[Participant] {
        self.participants.as_slice()
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(id)
    }

    /// Messages in timestamp order.
    pub fn messages(&self) -> &[Message] {
        self.messages.as_slice()
    }

    pub fn messages_involving(&self, id: ParticipantId) -> impl Iterator<Item = &Message> {
        self.messages.involving(id)
    }

    /// In-flight messages, sorted by id.
    pub fn active_messages(&self) -> impl Iterator<Item = &ActiveMessage> {
        self.active.values()
    }

    pub fn is_visible(&self, id: ParticipantId) -> bool {
        self.participants.get(id).is_some_and(|p| p.visible)
    }

    /// Clones the full state for a rendering collaborator.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            participants: self.participants.as_slice().to_vec(),
            messages: self.messages.as_slice().to_vec(),
            active_messages: self.active.values().cloned().collect(),
            current_time: self.current_time,
            running: self.running,
            speed: self.speed,
            total_messages: self.messages.total(),
            radius: self.layout.radius,
            center: self.center(),
        }
    }
}

impl Default for ChoreographyEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for ChoreographyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoreographyEngine")
            .field("participants", &self.participants.len())
            .field("messages", &self.messages.len())
            .field("active", &self.active.len())
            .field("current_time", &self.current_time)
            .field("running", &self.running)
            .field("speed", &self.speed)
            .finish()
    }
}
