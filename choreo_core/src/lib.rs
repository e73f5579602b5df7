//! Choreo Core - Timeline Choreography Engine
//!
//! A deterministic, seekable simulation that drives an animated exchange of
//! messages between named participants:
//! 1. **Clock**: a virtual clock moved by `advance` (per frame) or `seek_to`
//!    (scrubbing), with a stopped/running state machine and auto-stop
//! 2. **Derived state**: which messages are in flight and which participants
//!    are on stage, rebuilt from the registries after every clock move
//! 3. **Layout**: target positions on a circle for whoever is on stage
//!
//! The engine never draws anything. Renderers read snapshots and receive
//! target values through a `choreo_env::LayoutSink`.

pub mod engine;
pub mod layout;
pub mod message;
pub mod participant;
pub mod scenario;
pub mod visibility;

// Re-export key types for convenience
pub use engine::{ChoreographyEngine, EngineConfig, EngineSnapshot};
pub use layout::CircleLayout;
pub use message::{ActiveMessage, Message, MessageLog};
pub use participant::{Participant, ParticipantRegistry, Shape};
pub use scenario::{MessageSpec, ParticipantSpec, Scenario};
pub use visibility::{APPEAR_BEFORE, DISAPPEAR_AFTER};
