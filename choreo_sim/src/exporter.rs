//! JSON frame exporter for external renderers.
//!
//! Exports sampled engine snapshots so a player can replay a run without
//! linking the engine.

use choreo_core::EngineSnapshot;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single sampled frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Virtual clock at the sample
    pub time: f64,

    /// Participant targets (pending removals included, at opacity 0)
    pub participants: Vec<ParticipantFrame>,

    /// Messages in flight
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub messages: Vec<MessageFrame>,
}

/// Target values of one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantFrame {
    pub id: u64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    pub visible: bool,
}

/// One in-flight message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFrame {
    pub id: u64,
    pub from: u64,
    pub to: u64,
    pub text: String,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SimFrame {
    /// Samples an engine snapshot.
    pub fn capture(snapshot: &EngineSnapshot) -> Self {
        let participants = snapshot
            .participants
            .iter()
            .map(|p| ParticipantFrame {
                id: p.id.get(),
                name: p.name.clone(),
                x: p.x,
                y: p.y,
                opacity: p.opacity,
                visible: p.visible,
            })
            .collect();

        let messages = snapshot
            .active_messages
            .iter()
            .filter_map(|active| {
                let message = snapshot.messages.iter().find(|m| m.id == active.id)?;
                Some(MessageFrame {
                    id: active.id.get(),
                    from: active.from.get(),
                    to: active.to.get(),
                    text: message.text.clone(),
                    progress: active.progress,
                    color: message.color.clone(),
                })
            })
            .collect();

        Self {
            time: snapshot.current_time,
            participants,
            messages,
        }
    }
}

/// Complete run export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Virtual time covered
    pub duration: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration: 0.0,
            frames: Vec::new(),
            passed: false,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration = frame.time;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool) {
        self.passed = passed;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
