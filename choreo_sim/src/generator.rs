//! Seeded random scenario generator.
//!
//! The same seed and config always produce the same scenario, so any
//! failing random run can be replayed from its seed.

use choreo_core::{MessageSpec, ParticipantSpec, Scenario, Shape};
use choreo_env::ChoreoError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};

const PALETTE: [&str; 6] = [
    "#4caf50", "#2196f3", "#ff9800", "#e91e63", "#9c27b0", "#00bcd4",
];

/// Shape of a generated scenario.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub participants: usize,
    pub messages: usize,

    /// Mean gap between consecutive message starts
    pub mean_gap: f64,

    pub mean_duration: f64,
    pub duration_std: f64,

    /// Probability that a message targets a participant that does not exist
    pub dangling_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            participants: 5,
            messages: 24,
            mean_gap: 250.0,
            mean_duration: 400.0,
            duration_std: 150.0,
            dangling_rate: 0.05,
        }
    }
}

/// Builds random scenarios from a seed.
pub struct ScenarioGenerator {
    rng: ChaCha8Rng,
    config: GeneratorConfig,
    gaps: Exp<f64>,
    durations: Normal<f64>,
}

impl ScenarioGenerator {
    /// Creates a generator, rejecting configs the distributions cannot take.
    pub fn new(seed: u64, config: GeneratorConfig) -> Result<Self, ChoreoError> {
        if config.mean_gap <= 0.0 || !config.mean_gap.is_finite() {
            return Err(ChoreoError::invalid("mean_gap", config.mean_gap));
        }
        if !(0.0..=1.0).contains(&config.dangling_rate) {
            return Err(ChoreoError::invalid("dangling_rate", config.dangling_rate));
        }

        let gaps = Exp::new(1.0 / config.mean_gap)
            .map_err(|_| ChoreoError::invalid("mean_gap", config.mean_gap))?;
        let durations = Normal::new(config.mean_duration, config.duration_std)
            .map_err(|_| ChoreoError::invalid("duration_std", config.duration_std))?;

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            gaps,
            durations,
        })
    }

    /// Generates the next scenario.
    pub fn generate(&mut self) -> Scenario {
        let n = self.config.participants;
        let shapes = Shape::all();

        let participants = (0..n)
            .map(|i| ParticipantSpec {
                name: format!("node-{}", i),
                shape: shapes[i % shapes.len()],
                color: PALETTE[i % PALETTE.len()].to_string(),
            })
            .collect();

        let mut messages = Vec::with_capacity(self.config.messages);
        let mut clock = 0.0_f64;
        for seq in 0..self.config.messages {
            clock += self.gaps.sample(&mut self.rng).round();
            let duration = self.durations.sample(&mut self.rng).round().max(1.0);

            let from = (n > 0).then(|| self.rng.gen_range(0..n));
            let to = if n > 1 && !self.rng.gen_bool(self.config.dangling_rate) {
                // Anyone but the sender
                from.map(|f| (f + self.rng.gen_range(1..n)) % n)
            } else {
                None
            };

            messages.push(MessageSpec {
                from,
                to,
                text: format!("msg-{}", seq),
                timestamp: clock,
                duration,
                color: None,
            });
        }

        Scenario {
            participants,
            messages,
        }
    }
}
