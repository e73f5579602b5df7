//! Scenario runner - drives choreographies and checks engine invariants.

use crate::exporter::{SimExport, SimFrame};
use crate::scenarios::ScenarioId;

use choreo_core::{ChoreographyEngine, EngineConfig, Scenario};
use choreo_env::MessageId;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Whether the run finished and every check held
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Virtual clock at the end of the run
    pub final_time: f64,

    pub participants: usize,
    pub messages: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Messages that entered the active set
    pub activations: u64,

    /// Messages that left the active set
    pub completions: u64,

    /// Messages never observed in flight (window fell between two ticks)
    pub skipped: u64,

    /// Layout passes emitted by the engine
    pub layout_passes: u64,

    pub peak_active: usize,
    pub peak_visible: usize,
}

/// Runs scenarios frame by frame.
pub struct ScenarioRunner {
    /// Seed for generated scenarios
    seed: u64,

    /// Frames per second of wall time
    tick_rate_hz: u32,

    /// Engine speed multiplier
    speed: f64,

    /// Virtual time budget before the run counts as hung
    max_duration: f64,

    /// Engine tunables
    config: EngineConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tick_rate_hz: 60,
            speed: 1.0,
            max_duration: 600_000.0,
            config: EngineConfig::default(),
        }
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the engine speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the virtual time budget.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.max_duration = duration;
        self
    }

    /// Sets the engine config.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Virtual time units per tick before the speed multiplier.
    pub fn frame_delta(&self) -> f64 {
        1000.0 / self.tick_rate_hz as f64
    }

    /// Runs a built-in scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        match scenario.build(self.seed) {
            Ok(definition) => self.run_scenario(scenario.name(), &definition),
            Err(e) => self.failed(scenario.name(), format!("could not build scenario: {}", e)),
        }
    }

    /// Runs an arbitrary scenario definition.
    pub fn run_scenario(&self, name: &str, scenario: &Scenario) -> ScenarioResult {
        self.execute(name, scenario, None)
    }

    /// Runs a scenario, sampling a frame every `interval` ticks.
    pub fn run_with_export(
        &self,
        name: &str,
        scenario: &Scenario,
        interval: u64,
    ) -> (ScenarioResult, SimExport) {
        let mut export = SimExport::new(name, self.seed);
        let result = self.execute(name, scenario, Some((interval.max(1), &mut export)));
        export.finalize(result.passed);
        (result, export)
    }

    fn execute(
        &self,
        name: &str,
        scenario: &Scenario,
        mut export: Option<(u64, &mut SimExport)>,
    ) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", name, self.seed);

        let mut engine = ChoreographyEngine::new(self.config.clone());
        let mut shadow = ChoreographyEngine::new(self.config.clone());
        for target in [&mut engine, &mut shadow] {
            if let Err(e) = target.load_scenario(scenario) {
                return self.failed(name, format!("could not load scenario: {}", e));
            }
        }
        if let Err(e) = engine.set_speed(self.speed) {
            return self.failed(name, e.to_string());
        }

        let step = self.frame_delta();
        let per_tick = (step * self.speed).abs();
        let budget = if per_tick > 0.0 {
            (self.max_duration / per_tick).ceil() as u64
        } else {
            0
        };

        let mut metrics = ScenarioMetrics::default();
        let mut seen: BTreeSet<MessageId> = BTreeSet::new();
        let mut previous: BTreeSet<MessageId> = BTreeSet::new();
        let mut failure_reason = None;
        let mut ticks = 0;

        engine.start();
        while ticks < budget && engine.is_running() {
            engine.advance(step);
            ticks += 1;

            let snapshot = engine.snapshot();
            let active: BTreeSet<MessageId> = snapshot.active_ids().into_iter().collect();
            metrics.activations += active.difference(&previous).count() as u64;
            metrics.completions += previous.difference(&active).count() as u64;
            metrics.peak_active = metrics.peak_active.max(active.len());
            metrics.peak_visible = metrics.peak_visible.max(snapshot.visible_ids().len());
            seen.extend(active.iter().copied());

            shadow.seek_to(snapshot.current_time);
            let seeked = shadow.snapshot();
            if seeked.active_ids() != snapshot.active_ids() {
                failure_reason = Some(format!(
                    "active set diverged from seek at t={:.1}: advance={:?} seek={:?}",
                    snapshot.current_time,
                    snapshot.active_ids(),
                    seeked.active_ids()
                ));
                break;
            }
            if seeked.visible_ids() != snapshot.visible_ids() {
                failure_reason = Some(format!(
                    "visibility diverged from seek at t={:.1}",
                    snapshot.current_time
                ));
                break;
            }

            shadow.seek_to(snapshot.current_time);
            if shadow.snapshot() != seeked {
                failure_reason = Some(format!(
                    "repeated seek to t={:.1} changed state",
                    snapshot.current_time
                ));
                break;
            }

            if let Some((interval, export)) = export.as_mut() {
                if ticks % *interval == 0 || !engine.is_running() {
                    export.add_frame(SimFrame::capture(&snapshot));
                }
            }

            if ticks % 60 == 0 {
                debug!(
                    "  t={:.0} | active={} | visible={}",
                    snapshot.current_time,
                    active.len(),
                    snapshot.visible_ids().len()
                );
            }
            previous = active;
        }

        if failure_reason.is_none() && engine.is_running() {
            failure_reason = Some(format!(
                "did not finish within {:.0} time units",
                self.max_duration
            ));
        }
        if let Some(reason) = &failure_reason {
            warn!("{} failed: {}", name, reason);
        }

        metrics.skipped = (engine.messages().len() - seen.len()) as u64;
        metrics.layout_passes = engine.layout_passes();

        ScenarioResult {
            scenario: name.to_string(),
            seed: self.seed,
            passed: failure_reason.is_none(),
            total_ticks: ticks,
            final_time: engine.current_time(),
            participants: engine.participants().len(),
            messages: engine.messages().len(),
            failure_reason,
            metrics,
        }
    }

    fn failed(&self, name: &str, reason: String) -> ScenarioResult {
        warn!("{} failed: {}", name, reason);
        ScenarioResult {
            scenario: name.to_string(),
            seed: self.seed,
            passed: false,
            total_ticks: 0,
            final_time: 0.0,
            participants: 0,
            messages: 0,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
        }
    }
}
