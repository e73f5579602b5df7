//! Participants: the named actors that send and receive messages.

use choreo_env::{ParticipantId, ParticipantTarget};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Glyph a renderer draws for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Circle,
    Square,
    Triangle,
    Diamond,
    Hexagon,
}

impl Shape {
    /// Returns every shape in declaration order.
    pub fn all() -> [Shape; 5] {
        [
            Shape::Circle,
            Shape::Square,
            Shape::Triangle,
            Shape::Diamond,
            Shape::Hexagon,
        ]
    }

    /// Returns the lowercase name used in scenario files.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::Diamond => "diamond",
            Shape::Hexagon => "hexagon",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::all()
            .into_iter()
            .find(|shape| shape.name() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown shape: {}", s))
    }
}

/// A participant and its derived visual targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Engine-assigned id, immutable
    pub id: ParticipantId,

    pub name: String,
    pub shape: Shape,
    pub color: String,

    /// Target position (a renderer interpolates toward it)
    pub x: f64,
    pub y: f64,

    /// Target opacity in [0, 1]
    pub opacity: f64,

    /// Derived from the visibility rule; never set by callers
    pub visible: bool,

    /// Marked for removal, waiting for the fade-out to complete
    pub pending_removal: bool,
}

impl Participant {
    /// Creates a participant parked at `center`, invisible.
    pub fn new(
        id: ParticipantId,
        name: &str,
        shape: Shape,
        color: &str,
        center: Point2<f64>,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            shape,
            color: color.to_string(),
            x: center.x,
            y: center.y,
            opacity: 0.0,
            visible: false,
            pending_removal: false,
        }
    }

    /// True if this participant takes a slot in the circle.
    pub fn on_stage(&self) -> bool {
        self.visible && !self.pending_removal
    }

    /// Returns the current target values.
    pub fn target(&self) -> ParticipantTarget {
        ParticipantTarget {
            id: self.id,
            x: self.x,
            y: self.y,
            opacity: self.opacity,
        }
    }

    /// Sends the participant back to `center`, invisible.
    pub(crate) fn park(&mut self, center: Point2<f64>) {
        self.x = center.x;
        self.y = center.y;
        self.opacity = 0.0;
        self.visible = false;
    }
}

/// Insertion-ordered participant registry.
///
/// Registry order decides the slot each visible participant gets.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
    next_id: u64,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a participant and returns its fresh id.
    pub fn add(&mut self, name: &str, shape: Shape, color: &str, center: Point2<f64>) -> ParticipantId {
        let id = self.reserve_id();
        self.participants
            .push(Participant::new(id, name, shape, color, center));
        id
    }

    /// Consumes an id without creating a participant.
    ///
    /// Used for dangling message references so they can never collide with a
    /// participant created later.
    pub fn reserve_id(&mut self) -> ParticipantId {
        let id = ParticipantId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Deletes a participant, returning it.
    pub fn remove(&mut self, id: ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id == id)?;
        Some(self.participants.remove(index))
    }

    /// Drops every participant. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.participants.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.iter_mut()
    }

    pub fn as_slice(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
