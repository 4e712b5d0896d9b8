//! Service facade over the engine.
//!
//! [`Simulator`] resolves environment and strategy ids through injected lookups,
//! validates the request and then runs one of the three simulation kinds. Lookup and
//! validation failures abort before any round is played.

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;

use crate::environment::{Environment, EnvironmentCatalog, EnvironmentLookup};
use crate::error::{Result, SimError};
use crate::events::Event;
use crate::game::{AgentResult, MatchSimulator, PayoffMatrix};
use crate::strategies::{Agent, Strategy, StrategyCatalog, StrategyLookup};
use crate::tournament::{AggregatedResult, TournamentAggregator};
use crate::world::{
    EvolvingWorld, FinalStats, GenerationConfig, GenerationStats, Population, Seeding, World,
    WorldSize,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub environment: String,
    pub rounds: usize,
    pub results: Vec<AgentResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentReport {
    pub environment: String,
    pub games_per_match: usize,
    pub rounds_per_game: usize,
    /// Ranked by average score.
    pub results: Vec<AggregatedResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldReport {
    pub environment: String,
    pub world_size: WorldSize,
    pub population_size: usize,
    pub initial_stats: FinalStats,
    pub final_stats: FinalStats,
    pub yearly_stats: Vec<GenerationStats>,
    /// Timestamped, so left out of serialized reports.
    #[serde(skip)]
    pub events: Vec<Event>,
}

pub struct Simulator {
    environments: Box<dyn EnvironmentLookup>,
    strategies: Box<dyn StrategyLookup>,
    payoff: PayoffMatrix,
    seeding: Seeding,
    seed: Option<u64>,
}

impl Simulator {
    pub fn new(
        environments: impl EnvironmentLookup + 'static,
        strategies: impl StrategyLookup + 'static,
    ) -> Self {
        Self {
            environments: Box::new(environments),
            strategies: Box::new(strategies),
            payoff: PayoffMatrix::STANDARD,
            seeding: Seeding::default(),
            seed: None,
        }
    }

    /// Built-in environments and strategies.
    pub fn with_defaults() -> Self {
        Self::new(
            EnvironmentCatalog::with_defaults(),
            StrategyCatalog::with_defaults(),
        )
    }

    pub fn with_payoff(mut self, payoff: PayoffMatrix) -> Self {
        self.payoff = payoff;
        self
    }

    pub fn with_seeding(mut self, seeding: Seeding) -> Self {
        self.seeding = seeding;
        self
    }

    /// Fixed seed for reproducible runs; `None` seeds from the OS.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn environments(&self) -> &dyn EnvironmentLookup {
        self.environments.as_ref()
    }

    pub fn strategies(&self) -> &dyn StrategyLookup {
        self.strategies.as_ref()
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn environment(&self, id: &str) -> Result<Environment> {
        let environment = self.environments.environment(id)?;
        environment.validate()?;
        Ok(environment)
    }

    fn resolve(&self, ids: &[String]) -> Result<Vec<Arc<Strategy>>> {
        ids.iter().map(|id| self.strategies.strategy(id)).collect()
    }

    /// Play one match between exactly two strategies.
    pub fn run_single_match(
        &self,
        environment_id: &str,
        strategy_ids: &[String],
        rounds: usize,
    ) -> Result<MatchReport> {
        let environment = self.environment(environment_id)?;
        let strategies = self.resolve(strategy_ids)?;
        let [first, second] = strategies.as_slice() else {
            return Err(SimError::invalid(format!(
                "a match needs exactly 2 strategies, got {}",
                strategies.len()
            )));
        };
        if rounds == 0 {
            return Err(SimError::invalid("rounds must be at least 1"));
        }

        // Distinct ids even when a strategy plays itself.
        let a = Agent::spawn(first, 0);
        let b = Agent::spawn(second, 1);
        let outcome = MatchSimulator::new(self.payoff).run(&a, &b, rounds, &mut self.rng());
        info!(
            "{} vs {} in {} over {} rounds: {}-{}",
            first.name, second.name, environment.name, rounds, outcome.first.score, outcome.second.score
        );

        Ok(MatchReport {
            environment: environment.name,
            rounds,
            results: outcome.into_results(),
        })
    }

    /// Round-robin among `strategy_ids`, or the whole catalog when the list is empty.
    pub fn run_tournament(
        &self,
        environment_id: &str,
        strategy_ids: &[String],
        games_per_match: usize,
        rounds_per_game: usize,
    ) -> Result<TournamentReport> {
        let environment = self.environment(environment_id)?;
        let strategies = if strategy_ids.is_empty() {
            self.strategies.catalog()
        } else {
            self.resolve(strategy_ids)?
        };
        if strategies.is_empty() {
            return Err(SimError::invalid("a tournament needs at least 1 strategy"));
        }

        let agents: Vec<Agent> = strategies
            .iter()
            .enumerate()
            .map(|(i, s)| Agent::spawn(s, i))
            .collect();
        let standings = TournamentAggregator::new(MatchSimulator::new(self.payoff)).run(
            &agents,
            games_per_match,
            rounds_per_game,
            &mut self.rng(),
        )?;

        Ok(TournamentReport {
            environment: environment.name,
            games_per_match,
            rounds_per_game,
            results: standings.ranked(),
        })
    }

    pub fn run_world_simulation(
        &self,
        environment_id: &str,
        world_size: WorldSize,
        population_size: usize,
        years: usize,
        games_per_match: usize,
        rounds_per_game: usize,
    ) -> Result<WorldReport> {
        let config = GenerationConfig {
            games_per_match,
            rounds_per_game,
            mutation_rate: 0.0,
        };
        self.run_world_simulation_while(environment_id, world_size, population_size, years, config, |_| {
            ControlFlow::Continue(())
        })
    }

    /// World run whose `control` callback may stop it between generations.
    ///
    /// `config.mutation_rate` is replaced by the environment's mutation rate.
    pub fn run_world_simulation_while<F>(
        &self,
        environment_id: &str,
        world_size: WorldSize,
        population_size: usize,
        years: usize,
        config: GenerationConfig,
        control: F,
    ) -> Result<WorldReport>
    where
        F: FnMut(&GenerationStats) -> ControlFlow<()>,
    {
        let environment = self.environment(environment_id)?;
        if population_size == 0 {
            return Err(SimError::invalid("population size must be at least 1"));
        }
        let config = GenerationConfig {
            mutation_rate: environment.mutation_rate,
            ..config
        };
        config.validate()?;

        let mut rng = self.rng();
        let population = Population::seeded(
            self.seeding,
            &self.strategies.catalog(),
            population_size,
            environment.cooperation_probability,
            &mut rng,
        )?;
        let world = World::new(world_size, population)?;
        let initial_stats = world.final_stats();

        let mut evolving = EvolvingWorld::new(world, config, MatchSimulator::new(self.payoff))?;
        let yearly_stats = evolving.advance_while(years, &mut rng, control)?;
        let final_stats = evolving.final_stats();
        info!(
            "world {} finished after {} years: {} at {:.1}%",
            environment.name,
            yearly_stats.len(),
            final_stats.dominant_disposition,
            final_stats.dominant_percentage
        );

        Ok(WorldReport {
            environment: environment.name,
            world_size,
            population_size,
            initial_stats,
            final_stats,
            yearly_stats,
            events: evolving.events().get_events().to_vec(),
        })
    }
}
