//! Built-in protocol choreographies.

use crate::generator::{GeneratorConfig, ScenarioGenerator};
use choreo_core::{MessageSpec, ParticipantSpec, Scenario, Shape};
use choreo_env::ChoreoError;
use std::path::Path;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Two participants, one round trip
    PingPong,

    /// TCP three-way handshake, one request, teardown
    TcpHandshake,

    /// TLS 1.2 full handshake with an OCSP check against a CA
    TlsHandshake,

    /// Rumor spreading through six peers
    Gossip,

    /// Seeded random exchange (see `ScenarioGenerator`)
    Random,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::PingPong,
            ScenarioId::TcpHandshake,
            ScenarioId::TlsHandshake,
            ScenarioId::Gossip,
            ScenarioId::Random,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::PingPong => "ping_pong",
            ScenarioId::TcpHandshake => "tcp_handshake",
            ScenarioId::TlsHandshake => "tls_handshake",
            ScenarioId::Gossip => "gossip",
            ScenarioId::Random => "random",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::PingPong => "A pings B, B pongs back",
            ScenarioId::TcpHandshake => "SYN / SYN-ACK / ACK, one HTTP exchange, FIN teardown",
            ScenarioId::TlsHandshake => "Full TLS handshake with certificate status check",
            ScenarioId::Gossip => "One rumor fanned out through six peers",
            ScenarioId::Random => "Random exchange derived from the seed",
        }
    }

    /// Builds the scenario definition. Only `Random` depends on the seed.
    pub fn build(&self, seed: u64) -> Result<Scenario, ChoreoError> {
        let scenario = match self {
            ScenarioId::PingPong => script(
                &[("A", Shape::Circle, "#4caf50"), ("B", Shape::Square, "#2196f3")],
                &[(0, 1, "ping", 0.0, 500.0), (1, 0, "pong", 600.0, 400.0)],
            ),
            ScenarioId::TcpHandshake => script(
                &[
                    ("client", Shape::Circle, "#4caf50"),
                    ("server", Shape::Square, "#2196f3"),
                ],
                &[
                    (0, 1, "SYN", 0.0, 400.0),
                    (1, 0, "SYN-ACK", 450.0, 400.0),
                    (0, 1, "ACK", 900.0, 400.0),
                    (0, 1, "GET /", 1350.0, 500.0),
                    (1, 0, "200 OK", 1950.0, 600.0),
                    (0, 1, "FIN", 2700.0, 400.0),
                    (1, 0, "FIN-ACK", 3150.0, 400.0),
                ],
            ),
            ScenarioId::TlsHandshake => script(
                &[
                    ("client", Shape::Circle, "#4caf50"),
                    ("server", Shape::Square, "#2196f3"),
                    ("ca", Shape::Diamond, "#ff9800"),
                ],
                &[
                    (0, 1, "ClientHello", 0.0, 500.0),
                    (1, 0, "ServerHello", 600.0, 500.0),
                    (1, 0, "Certificate", 700.0, 600.0),
                    (1, 0, "ServerHelloDone", 800.0, 500.0),
                    (0, 2, "OCSP request", 1400.0, 400.0),
                    (2, 0, "OCSP response", 1850.0, 400.0),
                    (0, 1, "ClientKeyExchange", 2350.0, 500.0),
                    (0, 1, "ChangeCipherSpec", 2450.0, 400.0),
                    (0, 1, "Finished", 2550.0, 400.0),
                    (1, 0, "ChangeCipherSpec", 3050.0, 400.0),
                    (1, 0, "Finished", 3150.0, 400.0),
                ],
            ),
            ScenarioId::Gossip => gossip(6),
            ScenarioId::Random => ScenarioGenerator::new(seed, GeneratorConfig::default())?.generate(),
        };
        Ok(scenario)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ping_pong" | "pingpong" => Ok(ScenarioId::PingPong),
            "tcp_handshake" | "tcp" => Ok(ScenarioId::TcpHandshake),
            "tls_handshake" | "tls" => Ok(ScenarioId::TlsHandshake),
            "gossip" => Ok(ScenarioId::Gossip),
            "random" => Ok(ScenarioId::Random),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

fn script(
    participants: &[(&str, Shape, &str)],
    messages: &[(usize, usize, &str, f64, f64)],
) -> Scenario {
    Scenario {
        participants: participants
            .iter()
            .map(|&(name, shape, color)| ParticipantSpec {
                name: name.to_string(),
                shape,
                color: color.to_string(),
            })
            .collect(),
        messages: messages
            .iter()
            .map(|&(from, to, text, timestamp, duration)| MessageSpec {
                from: Some(from),
                to: Some(to),
                text: text.to_string(),
                timestamp,
                duration,
                color: None,
            })
            .collect(),
    }
}

/// Peer 0 tells everyone in round 1; every peer then relays to its
/// clockwise neighbour in round 2.
fn gossip(peers: usize) -> Scenario {
    let shapes = Shape::all();
    let participants = (0..peers)
        .map(|i| ParticipantSpec {
            name: format!("peer-{}", i),
            shape: shapes[i % shapes.len()],
            color: (if i == 0 { "#e91e63" } else { "#9c27b0" }).to_string(),
        })
        .collect();

    let mut messages = Vec::new();
    for to in 1..peers {
        messages.push(MessageSpec {
            from: Some(0),
            to: Some(to),
            text: "rumor".to_string(),
            timestamp: (to as f64 - 1.0) * 150.0,
            duration: 600.0,
            color: Some("#e91e63".to_string()),
        });
    }
    let relay_start = peers as f64 * 150.0 + 600.0;
    for from in 1..peers {
        messages.push(MessageSpec {
            from: Some(from),
            to: Some((from + 1) % peers),
            text: "relay".to_string(),
            timestamp: relay_start + from as f64 * 200.0,
            duration: 500.0,
            color: None,
        });
    }

    Scenario {
        participants,
        messages,
    }
}

/// Reads a JSON scenario file.
pub fn read_scenario(path: impl AsRef<Path>) -> Result<Scenario, ChoreoError> {
    let payload = std::fs::read_to_string(path)?;
    Scenario::from_json(&payload)
}

/// Writes a scenario as pretty JSON.
pub fn write_scenario(path: impl AsRef<Path>, scenario: &Scenario) -> Result<(), ChoreoError> {
    std::fs::write(path, scenario.to_json()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>(), Ok(id));
            assert_eq!(id.to_string(), id.name());
        }
        assert_eq!("TLS".parse::<ScenarioId>(), Ok(ScenarioId::TlsHandshake));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_builtins_are_valid() {
        for id in ScenarioId::all() {
            let scenario = id.build(42).unwrap();
            assert!(scenario.validate().is_ok(), "{}", id);
            assert!(!scenario.messages.is_empty(), "{}", id);
            for m in &scenario.messages {
                if let Some(from) = m.from {
                    assert!(from < scenario.participants.len());
                }
            }
        }
    }

    #[test]
    fn test_only_random_depends_on_seed() {
        assert_eq!(
            ScenarioId::Gossip.build(1).unwrap(),
            ScenarioId::Gossip.build(2).unwrap()
        );
        assert_ne!(
            ScenarioId::Random.build(1).unwrap(),
            ScenarioId::Random.build(2).unwrap()
        );
    }

    #[test]
    fn test_gossip_reaches_everyone() {
        let scenario = gossip(6);
        assert_eq!(scenario.messages.len(), 10);
        for peer in 1..6 {
            assert!(scenario.messages.iter().any(|m| m.to == Some(peer)));
        }
    }

    #[test]
    fn test_scenario_file_round_trip() {
        let path = std::env::temp_dir().join(format!("choreo-scenario-{}.json", std::process::id()));
        let scenario = ScenarioId::TcpHandshake.build(0).unwrap();

        write_scenario(&path, &scenario).unwrap();
        let loaded = read_scenario(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_scenario("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ChoreoError::Io(_)));
    }
}
