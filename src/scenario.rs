use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::environment::EnvironmentCatalog;
use crate::error::{Result, SimError};
use crate::game::PayoffMatrix;
use crate::simulation::{MatchReport, Simulator, TournamentReport, WorldReport};
use crate::strategies::{StrategyCatalog, StrategyDefinition};
use crate::world::{Seeding, WorldSize};

fn default_environment() -> String {
    "balanced".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub payoff: Option<PayoffMatrix>,
    #[serde(default)]
    pub seeding: Seeding,
    /// Extra strategies added to the built-in catalog for this run.
    #[serde(default)]
    pub strategies: Vec<StrategyDefinition>,
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunConfig {
    Match {
        strategies: Vec<String>,
        rounds: usize,
    },
    Tournament {
        /// Empty means the whole catalog.
        #[serde(default)]
        strategies: Vec<String>,
        games_per_match: usize,
        rounds_per_game: usize,
    },
    World {
        width: usize,
        height: usize,
        population_size: usize,
        years: usize,
        games_per_match: usize,
        rounds_per_game: usize,
    },
}

impl RunConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            RunConfig::Match { .. } => "match",
            RunConfig::Tournament { .. } => "tournament",
            RunConfig::World { .. } => "world",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Match(MatchReport),
    Tournament(TournamentReport),
    World(WorldReport),
}

impl Scenario {
    pub fn new(name: impl Into<String>, run: RunConfig) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            environment: default_environment(),
            random_seed: None,
            payoff: None,
            seeding: Seeding::default(),
            strategies: Vec::new(),
            run,
        }
    }

    pub fn add_strategy(&mut self, definition: StrategyDefinition) {
        self.strategies.push(definition);
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// JSON, or YAML for `.yaml` / `.yml` files.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let scenario = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SimError::invalid("scenario must have a name"));
        }

        match &self.run {
            RunConfig::Match { strategies, rounds } => {
                if strategies.len() != 2 {
                    return Err(SimError::invalid(format!(
                        "Scenario {}: a match needs exactly 2 strategies, got {}",
                        self.name,
                        strategies.len()
                    )));
                }
                if *rounds == 0 {
                    return Err(SimError::invalid(format!(
                        "Scenario {}: rounds must be at least 1",
                        self.name
                    )));
                }
            }
            RunConfig::Tournament {
                games_per_match,
                rounds_per_game,
                ..
            } => {
                if *games_per_match == 0 || *rounds_per_game == 0 {
                    return Err(SimError::invalid(format!(
                        "Scenario {}: games per match and rounds per game must be at least 1",
                        self.name
                    )));
                }
            }
            RunConfig::World {
                width,
                height,
                population_size,
                games_per_match,
                rounds_per_game,
                ..
            } => {
                if *population_size == 0 {
                    return Err(SimError::invalid(format!(
                        "Scenario {}: population size must be at least 1",
                        self.name
                    )));
                }
                let Ok(capacity) = WorldSize::new(*width, *height).capacity() else {
                    return Err(SimError::invalid(format!(
                        "Scenario {}: a {}x{} world is too large",
                        self.name, width, height
                    )));
                };
                if *population_size > capacity {
                    return Err(SimError::invalid(format!(
                        "Scenario {}: population of {} does not fit a {}x{} world",
                        self.name, population_size, width, height
                    )));
                }
                if *games_per_match == 0 || *rounds_per_game == 0 {
                    return Err(SimError::invalid(format!(
                        "Scenario {}: games per match and rounds per game must be at least 1",
                        self.name
                    )));
                }
            }
        }

        for definition in &self.strategies {
            definition.clone().into_strategy()?;
        }

        Ok(())
    }

    /// Simulator over the built-in catalogs plus this scenario's strategies.
    pub fn build_simulator(&self) -> Result<Simulator> {
        let mut catalog = StrategyCatalog::with_defaults();
        for definition in &self.strategies {
            catalog.add(definition.clone())?;
        }

        Ok(Simulator::new(EnvironmentCatalog::with_defaults(), catalog)
            .with_payoff(self.payoff.unwrap_or_default())
            .with_seeding(self.seeding)
            .with_seed(self.random_seed))
    }

    pub fn run(&self) -> Result<ScenarioOutcome> {
        self.validate()?;
        let simulator = self.build_simulator()?;

        let outcome = match &self.run {
            RunConfig::Match { strategies, rounds } => ScenarioOutcome::Match(
                simulator.run_single_match(&self.environment, strategies, *rounds)?,
            ),
            RunConfig::Tournament {
                strategies,
                games_per_match,
                rounds_per_game,
            } => ScenarioOutcome::Tournament(simulator.run_tournament(
                &self.environment,
                strategies,
                *games_per_match,
                *rounds_per_game,
            )?),
            RunConfig::World {
                width,
                height,
                population_size,
                years,
                games_per_match,
                rounds_per_game,
            } => ScenarioOutcome::World(simulator.run_world_simulation(
                &self.environment,
                WorldSize::new(*width, *height),
                *population_size,
                *years,
                *games_per_match,
                *rounds_per_game,
            )?),
        };
        Ok(outcome)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario: {}", self.name)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Environment: {}", self.environment)?;
        if let Some(seed) = self.random_seed {
            writeln!(f, "Seed: {}", seed)?;
        }
        let payoff = self.payoff.unwrap_or_default();
        writeln!(
            f,
            "Payoffs: R={} P={} T={} S={}",
            payoff.reward, payoff.punishment, payoff.temptation, payoff.sucker
        )?;

        writeln!(f, "\nRun: {}", self.run.kind())?;
        match &self.run {
            RunConfig::Match { strategies, rounds } => {
                writeln!(f, "  Strategies: {}", strategies.join(" vs "))?;
                writeln!(f, "  Rounds: {}", rounds)?;
            }
            RunConfig::Tournament {
                strategies,
                games_per_match,
                rounds_per_game,
            } => {
                if strategies.is_empty() {
                    writeln!(f, "  Strategies: whole catalog")?;
                } else {
                    writeln!(f, "  Strategies: {}", strategies.join(", "))?;
                }
                writeln!(
                    f,
                    "  {} games per match, {} rounds per game",
                    games_per_match, rounds_per_game
                )?;
            }
            RunConfig::World {
                width,
                height,
                population_size,
                years,
                games_per_match,
                rounds_per_game,
            } => {
                writeln!(
                    f,
                    "  Grid: {}x{} with {} agents ({:?} seeding)",
                    width, height, population_size, self.seeding
                )?;
                writeln!(f, "  Years: {}", years)?;
                writeln!(
                    f,
                    "  {} games per match, {} rounds per game",
                    games_per_match, rounds_per_game
                )?;
            }
        }

        if !self.strategies.is_empty() {
            writeln!(f, "\nCustom strategies:")?;
            for definition in &self.strategies {
                writeln!(f, "  {} ({} rules)", definition.name, definition.rules.len())?;
            }
        }

        Ok(())
    }
}

pub fn create_standard_scenarios() -> HashMap<String, Scenario> {
    let mut scenarios = HashMap::new();

    let mut duel = Scenario::new(
        "tit_for_tat_duel",
        RunConfig::Match {
            strategies: vec!["Tit-for-Tat".to_string(), "Always Defect".to_string()],
            rounds: 10,
        },
    );
    duel.description = "Tit-for-Tat against an unconditional defector".to_string();
    scenarios.insert("duel".to_string(), duel);

    let mut round_robin = Scenario::new(
        "round_robin",
        RunConfig::Tournament {
            strategies: Vec::new(),
            games_per_match: 5,
            rounds_per_game: 20,
        },
    );
    round_robin.description = "Every built-in strategy against every other".to_string();
    round_robin.random_seed = Some(42);
    scenarios.insert("tournament".to_string(), round_robin);

    let mut balanced = Scenario::new(
        "balanced_world",
        RunConfig::World {
            width: 10,
            height: 10,
            population_size: 50,
            years: 20,
            games_per_match: 1,
            rounds_per_game: 10,
        },
    );
    balanced.description = "Half-filled grid evolving in a balanced environment".to_string();
    scenarios.insert("world".to_string(), balanced);

    let mut hostile = Scenario::new(
        "hostile_world",
        RunConfig::World {
            width: 8,
            height: 8,
            population_size: 64,
            years: 30,
            games_per_match: 1,
            rounds_per_game: 10,
        },
    );
    hostile.description = "Full grid seeded from a hostile environment".to_string();
    hostile.environment = "hostile".to_string();
    hostile.seeding = Seeding::Environment;
    scenarios.insert("hostile".to_string(), hostile);

    scenarios
}
