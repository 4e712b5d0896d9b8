//! Batch experiment runner for systematic strategy evaluation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use log::{info, warn};

use crate::error::Result;
use crate::metrics::MetricsCalculator;
use crate::scenario::{Scenario, ScenarioOutcome};
use crate::types::Disposition;

/// Configuration for a batch of experiments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentBatch {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parallel: Option<usize>,
    pub experiments: Vec<ExperimentConfig>,
}

/// A scenario file path or an inline scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioSource {
    Path(PathBuf),
    Inline(Box<Scenario>),
}

/// Configuration for a single experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    pub scenario: ScenarioSource,
    /// Overrides the scenario's seed. Repetition `n` uses `seed + n`.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub repeat: usize,
    /// Where to write each run's report; `{run}` is replaced by the repetition index.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// Result of running an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub name: String,
    pub run: usize,
    pub success: bool,
    pub error: Option<String>,
    pub summary: Option<ExperimentSummary>,
    pub duration_ms: u64,
}

/// Headline numbers from one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub kind: String,
    pub leader: Option<String>,
    pub mean_cooperation_rate: f64,
    pub dominant_disposition: Option<Disposition>,
    pub dominant_percentage: Option<f64>,
}

impl ExperimentSummary {
    pub fn from_outcome(outcome: &ScenarioOutcome) -> Self {
        match outcome {
            ScenarioOutcome::Match(report) => {
                let leader = report
                    .results
                    .iter()
                    .max_by_key(|r| r.score)
                    .map(|r| r.strategy.clone());
                let mean_cooperation_rate = if report.results.is_empty() {
                    0.0
                } else {
                    report.results.iter().map(|r| r.cooperation_rate).sum::<f64>()
                        / report.results.len() as f64
                };
                Self {
                    kind: "match".to_string(),
                    leader,
                    mean_cooperation_rate,
                    dominant_disposition: None,
                    dominant_percentage: None,
                }
            }
            ScenarioOutcome::Tournament(report) => {
                let metrics = MetricsCalculator::calculate_tournament_metrics(&report.results);
                Self {
                    kind: "tournament".to_string(),
                    leader: metrics.leader,
                    mean_cooperation_rate: metrics.mean_cooperation_rate,
                    dominant_disposition: None,
                    dominant_percentage: None,
                }
            }
            ScenarioOutcome::World(report) => {
                let last = report
                    .yearly_stats
                    .last()
                    .map(|g| MetricsCalculator::calculate_tournament_metrics(&g.standings));
                Self {
                    kind: "world".to_string(),
                    leader: last.as_ref().and_then(|m| m.leader.clone()),
                    mean_cooperation_rate: last.map_or(0.0, |m| m.mean_cooperation_rate),
                    dominant_disposition: Some(report.final_stats.dominant_disposition),
                    dominant_percentage: Some(report.final_stats.dominant_percentage),
                }
            }
        }
    }
}

struct Job<'a> {
    config: &'a ExperimentConfig,
    run: usize,
}

impl ExperimentBatch {
    /// Load experiment configuration from YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    fn jobs(&self) -> Vec<Job<'_>> {
        self.experiments
            .iter()
            .flat_map(|config| (0..config.repeat.max(1)).map(move |run| Job { config, run }))
            .collect()
    }

    /// Run all experiments in the batch, results in declaration order.
    pub fn run(&self) -> Vec<ExperimentResult> {
        self.run_with(run_job)
    }

    fn run_with<F>(&self, runner: F) -> Vec<ExperimentResult>
    where
        F: Fn(&Job<'_>) -> ExperimentResult + Sync,
    {
        let jobs = self.jobs();
        let parallel = self.parallel.unwrap_or(1).max(1).min(jobs.len().max(1));
        info!(
            "batch {}: {} runs on {} thread(s)",
            self.name,
            jobs.len(),
            parallel
        );

        if parallel == 1 {
            return jobs.iter().map(&runner).collect();
        }

        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<ExperimentResult>>> = Mutex::new(vec![None; jobs.len()]);

        thread::scope(|scope| {
            let workers: Vec<_> = (0..parallel)
                .map(|_| {
                    scope.spawn(|| {
                        loop {
                            let index = next.fetch_add(1, Ordering::SeqCst);
                            let Some(job) = jobs.get(index) else {
                                break;
                            };
                            let result = runner(job);
                            let mut slots = slots.lock().unwrap_or_else(|p| p.into_inner());
                            slots[index] = Some(result);
                        }
                    })
                })
                .collect();

            // Joined here so a panicking worker fails its run instead of the batch.
            for worker in workers {
                if worker.join().is_err() {
                    warn!("batch {}: a worker thread panicked", self.name);
                }
            }
        });

        slots
            .into_inner()
            .unwrap_or_else(|p| p.into_inner())
            .into_iter()
            .zip(&jobs)
            .map(|(slot, job)| {
                slot.unwrap_or_else(|| failed(job, "worker thread panicked".to_string(), 0))
            })
            .collect()
    }
}

fn failed(job: &Job<'_>, error: String, duration_ms: u64) -> ExperimentResult {
    ExperimentResult {
        name: job.config.name.clone(),
        run: job.run,
        success: false,
        error: Some(error),
        summary: None,
        duration_ms,
    }
}

fn run_job(job: &Job<'_>) -> ExperimentResult {
    let start = std::time::Instant::now();
    info!("Running experiment: {} (run {})", job.config.name, job.run);

    match run_scenario(job) {
        Ok(summary) => ExperimentResult {
            name: job.config.name.clone(),
            run: job.run,
            success: true,
            error: None,
            summary: Some(summary),
            duration_ms: start.elapsed().as_millis() as u64,
        },
        Err(e) => {
            warn!("experiment {} run {} failed: {}", job.config.name, job.run, e);
            failed(job, e.to_string(), start.elapsed().as_millis() as u64)
        }
    }
}

fn run_scenario(job: &Job<'_>) -> Result<ExperimentSummary> {
    let mut scenario = match &job.config.scenario {
        ScenarioSource::Path(path) => Scenario::load_from_file(path)?,
        ScenarioSource::Inline(scenario) => (**scenario).clone(),
    };
    if let Some(seed) = job.config.seed {
        scenario.random_seed = Some(seed.wrapping_add(job.run as u64));
    }

    let outcome = scenario.run()?;
    if let Some(output) = &job.config.output {
        let path = output
            .to_string_lossy()
            .replace("{run}", &job.run.to_string());
        std::fs::write(path, serde_json::to_string_pretty(&outcome)?)?;
    }
    Ok(ExperimentSummary::from_outcome(&outcome))
}
