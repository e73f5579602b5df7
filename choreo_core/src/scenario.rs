//! Scenario exchange format.
//!
//! A scenario is a definition, not a live snapshot: participant identity and
//! the message schedule only. Ids are not stored; message endpoints refer to
//! participants by their index in `participants`. An index past the end names
//! a participant that does not exist.

use crate::engine::ChoreographyEngine;
use crate::participant::{Participant, Shape};
use choreo_env::{ChoreoError, ParticipantId};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// A participant as stored in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSpec {
    pub name: String,
    pub shape: Shape,
    pub color: String,
}

/// A message as stored in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSpec {
    /// Index into `participants`, `None` for a dangling sender
    pub from: Option<usize>,

    /// Index into `participants`, `None` for a dangling receiver
    pub to: Option<usize>,

    pub text: String,
    pub timestamp: f64,
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Self-contained scenario definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub participants: Vec<ParticipantSpec>,
    pub messages: Vec<MessageSpec>,
}

impl Scenario {
    /// Parses a scenario from JSON.
    pub fn from_json(payload: &str) -> Result<Self, ChoreoError> {
        let scenario: Scenario = serde_json::from_str(payload)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Renders the scenario as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ChoreoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the values the engine would reject on `add_message`.
    pub fn validate(&self) -> Result<(), ChoreoError> {
        for message in &self.messages {
            if !message.timestamp.is_finite() {
                return Err(ChoreoError::invalid("timestamp", message.timestamp));
            }
            if !message.duration.is_finite() || message.duration < 0.0 {
                return Err(ChoreoError::invalid("duration", message.duration));
            }
        }
        Ok(())
    }
}

impl ChoreographyEngine {
    /// Captures the current scenario definition.
    ///
    /// Participants waiting on a fade-out are left out; messages that still
    /// reference them export them as dangling endpoints. Each distinct
    /// dangling id gets its own index past the end of `participants`.
    pub fn export_scenario(&self) -> Scenario {
        let live: Vec<&Participant> = self
            .participants
            .iter()
            .filter(|p| !p.pending_removal)
            .collect();
        let mut index: HashMap<ParticipantId, usize> =
            live.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        let mut slot = |id: ParticipantId| {
            let next = index.len();
            *index.entry(id).or_insert(next)
        };

        Scenario {
            participants: live
                .iter()
                .map(|p| ParticipantSpec {
                    name: p.name.clone(),
                    shape: p.shape,
                    color: p.color.clone(),
                })
                .collect(),
            messages: self
                .messages
                .iter()
                .map(|m| MessageSpec {
                    from: Some(slot(m.from)),
                    to: Some(slot(m.to)),
                    text: m.text.clone(),
                    timestamp: m.timestamp,
                    duration: m.duration,
                    color: m.color.clone(),
                })
                .collect(),
        }
    }

    /// Serializes the current scenario definition as JSON.
    pub fn export_data(&self) -> Result<String, ChoreoError> {
        self.export_scenario().to_json()
    }

    /// Replaces the registries with `scenario`.
    ///
    /// The clock is stopped and rewound to 0. Every participant and message
    /// gets a fresh id. Dangling endpoints get reserved ids no participant
    /// will ever hold: one per distinct out-of-range index, and a new one for
    /// every `null`.
    pub fn load_scenario(&mut self, scenario: &Scenario) -> Result<(), ChoreoError> {
        scenario.validate()?;

        self.running = false;
        self.current_time = 0.0;
        self.active.clear();
        self.participants.clear();
        self.messages.clear();

        let (x, y) = self.center();
        let center = Point2::new(x, y);
        let ids: Vec<ParticipantId> = scenario
            .participants
            .iter()
            .map(|p| self.participants.add(&p.name, p.shape, &p.color, center))
            .collect();

        let mut ghosts: HashMap<usize, ParticipantId> = HashMap::new();
        for message in &scenario.messages {
            let mut resolve = |index: Option<usize>| match index {
                Some(i) if i < ids.len() => ids[i],
                Some(i) => *ghosts
                    .entry(i)
                    .or_insert_with(|| self.participants.reserve_id()),
                None => self.participants.reserve_id(),
            };
            let from = resolve(message.from);
            let to = resolve(message.to);
            self.messages.insert(
                from,
                to,
                &message.text,
                message.timestamp,
                message.duration,
                message.color.clone(),
            );
        }

        self.relayout();
        info!(
            "Loaded scenario: {} participants, {} messages",
            scenario.participants.len(),
            scenario.messages.len()
        );
        Ok(())
    }

    /// Replaces the registries with a JSON scenario.
    ///
    /// The payload is fully parsed before anything is touched, so a
    /// malformed payload leaves the current scenario intact.
    pub fn import_data(&mut self, payload: &str) -> Result<(), ChoreoError> {
        let scenario = Scenario::from_json(payload).map_err(|e| {
            warn!("Scenario import failed: {}", e);
            e
        })?;
        self.load_scenario(&scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChoreographyEngine;

    fn sample() -> ChoreographyEngine {
        let mut engine = ChoreographyEngine::default();
        let a = engine.add_participant("A", Shape::Circle, "#4caf50");
        let b = engine.add_participant("B", Shape::Hexagon, "#2196f3");
        engine
            .add_message(a, b, "ping", 0.0, 500.0, Some("#ff9800".into()))
            .unwrap();
        engine.add_message(b, a, "pong", 600.0, 400.0, None).unwrap();
        engine
    }

    fn definition(engine: &ChoreographyEngine) -> (Vec<(String, Shape, String)>, Vec<(String, String, String, f64, f64, Option<String>)>) {
        let name_of = |id| {
            engine
                .participant(id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "?".to_string())
        };
        (
            engine
                .participants()
                .iter()
                .map(|p| (p.name.clone(), p.shape, p.color.clone()))
                .collect(),
            engine
                .messages()
                .iter()
                .map(|m| (name_of(m.from), name_of(m.to), m.text.clone(), m.timestamp, m.duration, m.color.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_round_trip_reproduces_definition() {
        let original = sample();
        let payload = original.export_data().unwrap();

        let mut copy = ChoreographyEngine::default();
        copy.add_participant("stale", Shape::Square, "black");
        copy.import_data(&payload).unwrap();

        assert_eq!(definition(&copy), definition(&original));
    }

    #[test]
    fn test_import_assigns_fresh_ids() {
        let payload = sample().export_data().unwrap();
        let mut engine = sample();
        engine.import_data(&payload).unwrap();

        assert_eq!(engine.participants()[0].id, ParticipantId(2));
        assert_eq!(engine.total_messages(), 4);
    }

    #[test]
    fn test_export_omits_derived_state() {
        let mut engine = sample();
        engine.seek_to(250.0);
        let value: serde_json::Value = serde_json::from_str(&engine.export_data().unwrap()).unwrap();

        let participant = &value["participants"][0];
        assert_eq!(participant["name"], "A");
        assert_eq!(participant["shape"], "circle");
        assert!(participant.get("x").is_none());
        assert!(participant.get("visible").is_none());
        assert!(participant.get("id").is_none());
        assert!(value.get("active_messages").is_none());

        let pong = &value["messages"][1];
        assert_eq!(pong["from"], 1);
        assert_eq!(pong["to"], 0);
        assert!(pong.get("color").is_none());
    }

    #[test]
    fn test_malformed_import_keeps_previous_scenario() {
        let mut engine = sample();
        let before = engine.export_scenario();

        let err = engine.import_data("{ \"participants\": [ ").unwrap_err();
        assert!(err.is_parse());
        assert_eq!(engine.export_scenario(), before);

        let err = engine.import_data("{\"participants\": [{\"name\": \"A\", \"shape\": \"blob\", \"color\": \"red\"}], \"messages\": []}").unwrap_err();
        assert!(err.is_parse());
        assert_eq!(engine.participants().len(), 2);
    }

    #[test]
    fn test_invalid_duration_rejected_before_clearing() {
        let mut engine = sample();
        let payload = r#"{"participants": [], "messages": [
            {"from": null, "to": null, "text": "bad", "timestamp": 0.0, "duration": -5.0}
        ]}"#;

        assert!(matches!(
            engine.import_data(payload),
            Err(ChoreoError::InvalidParameter { name: "duration", .. })
        ));
        assert_eq!(engine.messages().len(), 2);
    }

    #[test]
    fn test_import_rewinds_clock() {
        let mut engine = sample();
        engine.start();
        engine.advance(300.0);

        let payload = sample().export_data().unwrap();
        engine.import_data(&payload).unwrap();

        assert!(!engine.is_running());
        assert_eq!(engine.current_time(), 0.0);
        assert_eq!(engine.active_messages().count(), 0);
    }

    #[test]
    fn test_dangling_references_survive_round_trip() {
        let mut engine = ChoreographyEngine::default();
        let a = engine.add_participant("A", Shape::Circle, "red");
        engine
            .add_message(a, ParticipantId(77), "into the void", 0.0, 100.0, None)
            .unwrap();

        let scenario = engine.export_scenario();
        assert_eq!(scenario.messages[0].from, Some(0));
        assert_eq!(scenario.messages[0].to, Some(1));

        let mut copy = ChoreographyEngine::default();
        copy.load_scenario(&scenario).unwrap();
        let to = copy.messages()[0].to;
        assert!(copy.participant(to).is_none());

        // The reserved id is never handed to a new participant
        let late = copy.add_participant("late", Shape::Circle, "red");
        assert_ne!(late, to);
    }

    #[test]
    fn test_out_of_range_index_is_dangling() {
        let payload = r#"{"participants": [{"name": "A", "shape": "circle", "color": "red"}],
            "messages": [{"from": 0, "to": 5, "text": "x", "timestamp": 0, "duration": 10}]}"#;
        let mut engine = ChoreographyEngine::default();
        engine.import_data(payload).unwrap();

        let message = &engine.messages()[0];
        assert!(engine.participant(message.from).is_some());
        assert!(engine.participant(message.to).is_none());
    }

    #[test]
    fn test_distinct_ghosts_stay_distinct() {
        let mut engine = ChoreographyEngine::default();
        let a = engine.add_participant("A", Shape::Circle, "red");
        engine
            .add_message(a, ParticipantId(77), "lost", 0.0, 100.0, None)
            .unwrap();
        engine
            .add_message(ParticipantId(78), ParticipantId(79), "elsewhere", 50.0, 100.0, None)
            .unwrap();
        engine
            .add_message(ParticipantId(77), a, "back", 200.0, 100.0, None)
            .unwrap();

        let mut copy = ChoreographyEngine::default();
        copy.import_data(&engine.export_data().unwrap()).unwrap();

        let m = copy.messages();
        let (lost, elsewhere, back) = (&m[0], &m[1], &m[2]);
        assert_ne!(elsewhere.from, elsewhere.to);
        assert_ne!(lost.to, elsewhere.from);
        assert_ne!(lost.to, elsewhere.to);
        assert_eq!(lost.to, back.from);
        assert_eq!(copy.participants().len(), 1);
    }

    #[test]
    fn test_null_endpoints_never_merge() {
        let payload = r#"{"participants": [], "messages": [
            {"from": null, "to": null, "text": "x", "timestamp": 0, "duration": 10}
        ]}"#;
        let mut engine = ChoreographyEngine::default();
        engine.import_data(payload).unwrap();

        let message = &engine.messages()[0];
        assert_ne!(message.from, message.to);
    }

    #[test]
    fn test_pending_removal_is_not_exported() {
        let mut engine = sample();
        let a = engine.participants()[0].id;
        assert!(engine.remove_participant(a));

        let scenario = engine.export_scenario();
        assert_eq!(scenario.participants.len(), 1);
        assert_eq!(scenario.participants[0].name, "B");

        let mut copy = ChoreographyEngine::default();
        copy.import_data(&engine.export_data().unwrap()).unwrap();

        assert_eq!(copy.participants().len(), 1);
        assert!(copy.participants().iter().all(|p| p.name != "A"));
        assert!(copy.participants().iter().all(|p| !p.pending_removal));

        // ping and pong still point at B, with A now a ghost
        let b = copy.participants()[0].id;
        let ping = &copy.messages()[0];
        assert_eq!(ping.to, b);
        assert!(copy.participant(ping.from).is_none());
        assert_eq!(copy.messages()[1].to, ping.from);
    }
}
