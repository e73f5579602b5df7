//! Visibility rule: who is on stage at a given virtual time.
//!
//! A participant is visible from `APPEAR_BEFORE` units before its first
//! message starts until `DISAPPEAR_AFTER` units after its last message ends.
//! Participants with no messages are never visible.

use crate::message::Message;
use crate::participant::ParticipantRegistry;
use choreo_env::ParticipantId;
use std::collections::HashMap;

/// Lead time before a participant's first message.
pub const APPEAR_BEFORE: f64 = 500.0;

/// Linger time after a participant's last message.
pub const DISAPPEAR_AFTER: f64 = 500.0;

/// Span of a participant's involvement on the virtual clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvolvementWindow {
    /// Earliest timestamp
    pub first: f64,
    /// Latest timestamp + duration
    pub last: f64,
}

impl InvolvementWindow {
    fn include(&mut self, message: &Message) {
        self.first = self.first.min(message.timestamp);
        self.last = self.last.max(message.end_time());
    }

    /// Applies the margins. Both ends inclusive.
    pub fn contains(&self, time: f64) -> bool {
        self.first - APPEAR_BEFORE <= time && time <= self.last + DISAPPEAR_AFTER
    }
}

/// Builds every participant's window in one pass over the messages.
pub fn involvement_windows<'a>(
    messages: impl IntoIterator<Item = &'a Message>,
) -> HashMap<ParticipantId, InvolvementWindow> {
    let mut windows: HashMap<ParticipantId, InvolvementWindow> = HashMap::new();
    for message in messages {
        for id in [message.from, message.to] {
            windows
                .entry(id)
                .and_modify(|w| w.include(message))
                .or_insert(InvolvementWindow {
                    first: message.timestamp,
                    last: message.end_time(),
                });
        }
    }
    windows
}

/// Recomputes every participant's `visible` flag at `time`.
///
/// Participants pending removal are forced invisible. Returns true if any
/// participant changed state, which calls for a layout pass.
pub fn recompute<'a>(
    participants: &mut ParticipantRegistry,
    messages: impl IntoIterator<Item = &'a Message>,
    time: f64,
) -> bool {
    let windows = involvement_windows(messages);
    let mut changed = false;

    for participant in participants.iter_mut() {
        let visible = !participant.pending_removal
            && windows
                .get(&participant.id)
                .is_some_and(|w| w.contains(time));

        if visible != participant.visible {
            participant.visible = visible;
            changed = true;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageLog;
    use crate::participant::Shape;
    use nalgebra::Point2;

    fn single_message_world() -> (ParticipantRegistry, MessageLog, ParticipantId) {
        let mut participants = ParticipantRegistry::new();
        let a = participants.add("A", Shape::Circle, "red", Point2::origin());
        let b = participants.add("B", Shape::Circle, "red", Point2::origin());
        let mut log = MessageLog::new();
        log.insert(a, b, "hello", 1000.0, 200.0, None);
        (participants, log, a)
    }

    #[test]
    fn test_window_margins_are_inclusive() {
        let (mut participants, log, a) = single_message_world();

        for (time, expected) in [
            (499.0, false),
            (500.0, true),
            (1100.0, true),
            (1700.0, true),
            (1701.0, false),
        ] {
            recompute(&mut participants, log.iter(), time);
            assert_eq!(participants.get(a).unwrap().visible, expected, "t={}", time);
        }
    }

    #[test]
    fn test_no_messages_never_visible() {
        let mut participants = ParticipantRegistry::new();
        let lonely = participants.add("L", Shape::Circle, "red", Point2::origin());
        let log = MessageLog::new();

        assert!(!recompute(&mut participants, log.iter(), 0.0));
        assert!(!participants.get(lonely).unwrap().visible);
    }

    #[test]
    fn test_recompute_reports_transitions_only() {
        let (mut participants, log, _) = single_message_world();

        assert!(recompute(&mut participants, log.iter(), 1000.0));
        assert!(!recompute(&mut participants, log.iter(), 1050.0));
        assert!(recompute(&mut participants, log.iter(), 5000.0));
    }

    #[test]
    fn test_pending_removal_forces_invisible() {
        let (mut participants, log, a) = single_message_world();
        recompute(&mut participants, log.iter(), 1000.0);
        participants.get_mut(a).unwrap().pending_removal = true;

        assert!(recompute(&mut participants, log.iter(), 1000.0));
        assert!(!participants.get(a).unwrap().visible);
    }

    #[test]
    fn test_window_spans_all_messages() {
        let mut log = MessageLog::new();
        let a = ParticipantId(0);
        log.insert(a, ParticipantId(1), "one", 100.0, 50.0, None);
        log.insert(ParticipantId(2), a, "two", 900.0, 300.0, None);

        let windows = involvement_windows(log.iter());
        assert_eq!(windows[&a], InvolvementWindow { first: 100.0, last: 1200.0 });
        assert_eq!(windows.len(), 3);
    }
}
