//! Scheduled messages and the timestamp-ordered message log.

use choreo_env::{MessageId, ParticipantId};
use serde::{Deserialize, Serialize};

/// A message scheduled on the virtual clock.
///
/// `from`/`to` are not checked against the participant registry. A dangling
/// reference is legal and never makes anyone visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub text: String,

    /// Start on the virtual clock
    pub timestamp: f64,

    /// Length of the flight window, >= 0
    pub duration: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Message {
    /// End of the flight window (exclusive).
    pub fn end_time(&self) -> f64 {
        self.timestamp + self.duration
    }

    /// True if `participant` sends or receives this message.
    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.from == participant || self.to == participant
    }

    /// True if `time` lies in `[timestamp, timestamp + duration)`.
    ///
    /// Always false for zero-duration messages.
    pub fn covers(&self, time: f64) -> bool {
        self.timestamp <= time && time < self.end_time()
    }

    /// Flight progress at `time`, clamped to [0, 1].
    ///
    /// A zero-duration message jumps straight from 0 to 1 at its timestamp.
    pub fn progress_at(&self, time: f64) -> f64 {
        if time >= self.end_time() {
            1.0
        } else if time <= self.timestamp {
            0.0
        } else {
            ((time - self.timestamp) / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Derived projection of a message that is currently in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveMessage {
    pub id: MessageId,
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub progress: f64,
    pub start_time: f64,
    pub end_time: f64,
}

impl ActiveMessage {
    /// Starts tracking `message` with zero progress.
    pub fn start(message: &Message) -> Self {
        Self {
            id: message.id,
            from: message.from,
            to: message.to,
            progress: 0.0,
            start_time: message.timestamp,
            end_time: message.end_time(),
        }
    }

    /// Projects `message` at `time`.
    pub fn at(message: &Message, time: f64) -> Self {
        Self {
            progress: message.progress_at(time),
            ..Self::start(message)
        }
    }
}

/// Message registry, always sorted by ascending timestamp.
///
/// Messages with equal timestamps keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,

    /// Messages ever added; never decremented
    total: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a message after every message with timestamp <= its own.
    pub fn insert(
        &mut self,
        from: ParticipantId,
        to: ParticipantId,
        text: &str,
        timestamp: f64,
        duration: f64,
        color: Option<String>,
    ) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.total += 1;

        let index = self.messages.partition_point(|m| m.timestamp <= timestamp);
        self.messages.insert(
            index,
            Message {
                id,
                from,
                to,
                text: text.to_string(),
                timestamp,
                duration,
                color,
            },
        );
        id
    }

    pub fn remove(&mut self, id: MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(index))
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Drops every message. Counters keep counting.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Latest `timestamp + duration` in the log.
    pub fn end_time(&self) -> Option<f64> {
        self.messages.iter().map(Message::end_time).reduce(f64::max)
    }

    /// Messages sent or received by `participant`, in timestamp order.
    pub fn involving(&self, participant: ParticipantId) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.involves(participant))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
