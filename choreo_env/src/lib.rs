//! Choreo Environment Boundary
//!
//! This crate defines everything that crosses the line between the
//! choreography engine and the outside world:
//! - **Identity**: participant and message id newtypes
//! - **Errors**: the shared `ChoreoError`
//! - **Layout channel**: target values flowing out of the engine
//! - **Animation**: the asynchronous collaborator that tweens toward targets
//!   and reports when a fade-out has finished
//!
//! The engine itself never awaits anything. It pushes `LayoutEvent`s into a
//! `LayoutSink` and later drains completion signals that an `Animator` task
//! produced on its own schedule.
//!
//! # Example
//!
//! ```ignore
//! use choreo_env::{layout_channel, completion_channel};
//!
//! let (sink, mut events) = layout_channel();
//! let (completions_tx, mut completions_rx) = completion_channel();
//!
//! // engine.with_sink(Box::new(sink));
//! // tokio::spawn(run_animator(animator, events, completions_tx));
//! // engine.drain_completions(&mut completions_rx);
//! ```

mod animator;
mod error;
mod sink;
mod tokio_impl;
mod types;

pub use animator::Animator;
pub use error::ChoreoError;
pub use sink::{LayoutEvent, LayoutSink, NullSink, ParticipantTarget};
pub use tokio_impl::{
    completion_channel, layout_channel, ChannelSink, CompletionReceiver, CompletionSender,
    LayoutReceiver, TokioAnimator,
};
pub use types::{MessageId, ParticipantId};
