//! Choreo Deterministic Scenario Harness
//!
//! Runs choreographies frame by frame against the engine and checks, at
//! every frame, that the state reached by advancing the clock matches the
//! state reached by seeking straight to the same time.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                        │
//! │                                                           │
//! │   ScenarioId / Scenario file / ScenarioGenerator(seed)    │
//! │                        │                                  │
//! │          ┌─────────────┴─────────────┐                    │
//! │     ┌────▼─────┐                ┌────▼─────┐              │
//! │     │  engine  │  advance(dt)   │  shadow  │  seek_to(t)  │
//! │     └────┬─────┘                └────┬─────┘              │
//! │          └──────── compare ──────────┘                    │
//! │                        │                                  │
//! │              SimExport frames (JSON)                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use choreo_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42).with_tick_rate(60);
//! let result = runner.run(ScenarioId::TlsHandshake);
//! assert!(result.passed);
//! ```

pub mod animation;
pub mod exporter;
pub mod generator;
pub mod runner;
pub mod scenarios;

pub use animation::{run_animator, AnimatorStats};
pub use exporter::{MessageFrame, ParticipantFrame, SimExport, SimFrame};
pub use generator::{GeneratorConfig, ScenarioGenerator};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
