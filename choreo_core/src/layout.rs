//! Circular layout of the participants that are on stage.

use crate::participant::ParticipantRegistry;
use choreo_env::ParticipantTarget;
use nalgebra::{Point2, Vector2};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Places on-stage participants evenly around a circle, first one at
/// 12 o'clock, in registry order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleLayout {
    pub radius: f64,
    pub center: Point2<f64>,
}

impl CircleLayout {
    pub fn new(radius: f64, center: Point2<f64>) -> Self {
        Self { radius, center }
    }

    /// Position of slot `index` out of `count`.
    pub fn slot(&self, index: usize, count: usize) -> Point2<f64> {
        let step = TAU / count as f64;
        let angle = -FRAC_PI_2 + step * index as f64;
        self.center + Vector2::new(angle.cos(), angle.sin()) * self.radius
    }

    /// Writes new targets into the registry and returns them.
    ///
    /// - on stage: next slot, opacity 1
    /// - pending removal: position kept, opacity 0
    /// - otherwise: center, opacity 0
    pub fn apply(&self, participants: &mut ParticipantRegistry) -> Vec<ParticipantTarget> {
        let count = participants.iter().filter(|p| p.on_stage()).count();
        let mut index = 0;

        for participant in participants.iter_mut() {
            if participant.on_stage() {
                let position = self.slot(index, count);
                participant.x = position.x;
                participant.y = position.y;
                participant.opacity = 1.0;
                index += 1;
            } else if participant.pending_removal {
                participant.opacity = 0.0;
            } else {
                participant.x = self.center.x;
                participant.y = self.center.y;
                participant.opacity = 0.0;
            }
        }

        participants.iter().map(|p| p.target()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Shape;
    use approx::assert_relative_eq;

    fn layout() -> CircleLayout {
        CircleLayout::new(100.0, Point2::new(400.0, 300.0))
    }

    #[test]
    fn test_first_slot_is_twelve_o_clock() {
        let top = layout().slot(0, 4);
        assert_relative_eq!(top.x, 400.0, epsilon = 1e-9);
        assert_relative_eq!(top.y, 200.0, epsilon = 1e-9);

        let right = layout().slot(1, 4);
        assert_relative_eq!(right.x, 500.0, epsilon = 1e-9);
        assert_relative_eq!(right.y, 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_apply_spaces_visible_and_parks_rest() {
        let mut participants = ParticipantRegistry::new();
        let a = participants.add("A", Shape::Circle, "red", Point2::origin());
        let hidden = participants.add("H", Shape::Circle, "red", Point2::origin());
        let b = participants.add("B", Shape::Circle, "red", Point2::origin());
        participants.get_mut(a).unwrap().visible = true;
        participants.get_mut(b).unwrap().visible = true;

        let targets = layout().apply(&mut participants);
        assert_eq!(targets.len(), 3);

        let a = participants.get(a).unwrap();
        assert_relative_eq!(a.y, 200.0, epsilon = 1e-9);
        assert_eq!(a.opacity, 1.0);

        // Two visible: B sits opposite A
        let b = participants.get(b).unwrap();
        assert_relative_eq!(b.x, 400.0, epsilon = 1e-9);
        assert_relative_eq!(b.y, 400.0, epsilon = 1e-9);

        let hidden = participants.get(hidden).unwrap();
        assert_eq!((hidden.x, hidden.y, hidden.opacity), (400.0, 300.0, 0.0));
    }

    #[test]
    fn test_pending_removal_keeps_position() {
        let mut participants = ParticipantRegistry::new();
        let a = participants.add("A", Shape::Circle, "red", Point2::origin());
        {
            let p = participants.get_mut(a).unwrap();
            p.x = 12.0;
            p.y = 34.0;
            p.opacity = 1.0;
            p.pending_removal = true;
        }

        layout().apply(&mut participants);
        let p = participants.get(a).unwrap();
        assert_eq!((p.x, p.y, p.opacity), (12.0, 34.0, 0.0));
    }
}
