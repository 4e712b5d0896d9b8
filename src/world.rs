//! Spatial population evolving over generations.
//!
//! A [`World`] is a `width x height` grid of optional agent slots filled row-major from
//! a [`Population`]. [`EvolvingWorld`] repeats two steps per generation:
//!
//! 1. a full round-robin tournament among the occupants;
//! 2. a mutation pass. The majority disposition wins (cooperative on a tie) and
//!    `floor(population * mutation_rate)` cells are drawn uniformly from the whole
//!    grid. Every drawn cell holding a minority-disposition agent flips it.
//!
//! Mutation targets ignore tournament performance; no fitness weighting is applied.
//! Because only minority agents flip, the pass pushes the population towards its
//! current majority. Empty cells and majority agents absorb draws without flipping,
//! so attempts and flips differ in general.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;

use crate::error::{Result, SimError};
use crate::events::{EventLogger, EventType};
use crate::game::MatchSimulator;
use crate::strategies::{Agent, Strategy};
use crate::tournament::{AggregatedResult, TournamentAggregator};
use crate::types::{AgentId, Disposition};

/// How templates are assigned to population slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeding {
    /// Slot `i` gets template `i mod templates`.
    #[default]
    RoundRobin,
    /// Slot draws a cooperative-leaning template with the environment's cooperation
    /// probability, a defecting-leaning one otherwise.
    Environment,
}

/// Agents cloned from templates, in slot order.
#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    pub fn round_robin(templates: &[Arc<Strategy>], size: usize) -> Result<Self> {
        if templates.is_empty() && size > 0 {
            return Err(SimError::invalid("cannot build a population from an empty catalog"));
        }
        let agents = (0..size)
            .map(|i| Agent::spawn(&templates[i % templates.len()], i))
            .collect();
        Ok(Self { agents })
    }

    /// Falls back to [`Population::round_robin`] when either disposition pool is empty.
    pub fn from_environment<R: Rng + ?Sized>(
        templates: &[Arc<Strategy>],
        size: usize,
        cooperation_probability: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let (cooperative, defecting): (Vec<_>, Vec<_>) =
            templates.iter().cloned().partition(|s| s.is_cooperative());
        if cooperative.is_empty() || defecting.is_empty() {
            return Self::round_robin(templates, size);
        }

        let (mut next_coop, mut next_defect) = (0, 0);
        let mut agents = Vec::with_capacity(size);
        for i in 0..size {
            let template = if rng.random::<f64>() < cooperation_probability {
                next_coop += 1;
                &cooperative[(next_coop - 1) % cooperative.len()]
            } else {
                next_defect += 1;
                &defecting[(next_defect - 1) % defecting.len()]
            };
            agents.push(Agent::spawn(template, i));
        }
        Ok(Self { agents })
    }

    pub fn seeded<R: Rng + ?Sized>(
        seeding: Seeding,
        templates: &[Arc<Strategy>],
        size: usize,
        cooperation_probability: f64,
        rng: &mut R,
    ) -> Result<Self> {
        match seeding {
            Seeding::RoundRobin => Self::round_robin(templates, size),
            Seeding::Environment => {
                Self::from_environment(templates, size, cooperation_probability, rng)
            }
        }
    }

    pub fn from_agents(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSize {
    pub width: usize,
    pub height: usize,
}

impl WorldSize {
    pub const MAX_CELLS: usize = 1_000_000;

    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of cells, rejecting grids larger than [`WorldSize::MAX_CELLS`].
    pub fn capacity(&self) -> Result<usize> {
        match self.width.checked_mul(self.height) {
            Some(cells) if cells <= Self::MAX_CELLS => Ok(cells),
            _ => Err(SimError::invalid(format!(
                "a {}x{} world exceeds the limit of {} cells",
                self.width,
                self.height,
                Self::MAX_CELLS
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionCounts {
    pub cooperative: usize,
    pub defecting: usize,
}

impl DispositionCounts {
    pub fn total(&self) -> usize {
        self.cooperative + self.defecting
    }

    /// Majority disposition; cooperative wins ties.
    pub fn winner(&self) -> Disposition {
        if self.cooperative >= self.defecting {
            Disposition::Cooperative
        } else {
            Disposition::Defecting
        }
    }

    pub fn cooperative_percentage(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.cooperative as f64 / self.total() as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flip {
    pub agent_id: AgentId,
    pub strategy: String,
    pub x: usize,
    pub y: usize,
    pub from: Disposition,
    pub to: Disposition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationReport {
    pub winner: Disposition,
    pub attempts: usize,
    pub flips: Vec<Flip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalStats {
    pub dominant_disposition: Disposition,
    pub dominant_percentage: f64,
    pub cooperative_percentage: f64,
    pub cooperative: usize,
    pub defecting: usize,
}

impl From<DispositionCounts> for FinalStats {
    fn from(counts: DispositionCounts) -> Self {
        let dominant_disposition = counts.winner();
        let cooperative_percentage = counts.cooperative_percentage();
        let dominant_percentage = match (dominant_disposition, counts.total()) {
            (_, 0) => 0.0,
            (Disposition::Cooperative, _) => cooperative_percentage,
            (Disposition::Defecting, _) => 100.0 - cooperative_percentage,
        };
        Self {
            dominant_disposition,
            dominant_percentage,
            cooperative_percentage,
            cooperative: counts.cooperative,
            defecting: counts.defecting,
        }
    }
}

/// Grid of agent slots.
#[derive(Debug, Clone)]
pub struct World {
    size: WorldSize,
    cells: Vec<Option<Agent>>,
}

impl World {
    pub fn new(size: WorldSize, population: Population) -> Result<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(SimError::invalid(format!(
                "world must be at least 1x1, got {}x{}",
                size.width, size.height
            )));
        }
        let capacity = size.capacity()?;
        if population.len() > capacity {
            return Err(SimError::invalid(format!(
                "population of {} does not fit a {}x{} world",
                population.len(),
                size.width,
                size.height
            )));
        }

        let mut cells: Vec<Option<Agent>> = population.agents.into_iter().map(Some).collect();
        cells.resize(capacity, None);
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> WorldSize {
        self.size
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Agent> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.cells[y * self.size.width + x].as_ref()
    }

    /// Occupants in row-major order.
    pub fn agents(&self) -> Vec<Agent> {
        self.cells.iter().flatten().cloned().collect()
    }

    pub fn population_size(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn stats(&self) -> DispositionCounts {
        let mut counts = DispositionCounts::default();
        for agent in self.cells.iter().flatten() {
            match agent.disposition {
                Disposition::Cooperative => counts.cooperative += 1,
                Disposition::Defecting => counts.defecting += 1,
            }
        }
        counts
    }

    pub fn final_stats(&self) -> FinalStats {
        self.stats().into()
    }

    /// `floor(population * rate)` attempts, taken on the plain `f64` product.
    pub fn mutation_attempts(population: usize, rate: f64) -> usize {
        if rate <= 0.0 || !rate.is_finite() {
            return 0;
        }
        (population as f64 * rate).floor() as usize
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, mutation_rate: f64, rng: &mut R) -> MutationReport {
        let winner = self.stats().winner();
        let loser = winner.flipped();
        let attempts = Self::mutation_attempts(self.population_size(), mutation_rate);

        let mut flips = Vec::new();
        for _ in 0..attempts {
            let x = rng.random_range(0..self.size.width);
            let y = rng.random_range(0..self.size.height);
            if let Some(agent) = self.cells[y * self.size.width + x].as_mut() {
                if agent.disposition == loser {
                    agent.flip_disposition();
                    flips.push(Flip {
                        agent_id: agent.id.clone(),
                        strategy: agent.strategy_name().to_string(),
                        x,
                        y,
                        from: loser,
                        to: winner,
                    });
                }
            }
        }

        MutationReport {
            winner,
            attempts,
            flips,
        }
    }
}

/// Per-generation tournament and mutation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub games_per_match: usize,
    pub rounds_per_game: usize,
    pub mutation_rate: f64,
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.games_per_match == 0 {
            return Err(SimError::invalid("games per match must be at least 1"));
        }
        if self.rounds_per_game == 0 {
            return Err(SimError::invalid("rounds per game must be at least 1"));
        }
        if !(self.mutation_rate.is_finite() && (0.0..=1.0).contains(&self.mutation_rate)) {
            return Err(SimError::invalid(format!(
                "mutation rate must be within [0, 1], got {}",
                self.mutation_rate
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    /// Counts after this generation's mutation pass.
    pub cooperative: usize,
    pub defecting: usize,
    pub winner: Disposition,
    pub mutation_attempts: usize,
    pub flips: usize,
    pub standings: Vec<AggregatedResult>,
}

impl GenerationStats {
    pub fn population(&self) -> usize {
        self.cooperative + self.defecting
    }
}

/// A world plus the machinery to evolve it.
#[derive(Debug)]
pub struct EvolvingWorld {
    world: World,
    tournament: TournamentAggregator,
    config: GenerationConfig,
    generation: usize,
    events: EventLogger,
}

impl EvolvingWorld {
    pub fn new(world: World, config: GenerationConfig, simulator: MatchSimulator) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            world,
            tournament: TournamentAggregator::new(simulator),
            config,
            generation: 0,
            events: EventLogger::new(),
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn events(&self) -> &EventLogger {
        &self.events
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn final_stats(&self) -> FinalStats {
        self.world.final_stats()
    }

    /// Run one tournament and one mutation pass.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<GenerationStats> {
        let generation = self.generation;
        let agents = self.world.agents();
        let standings = self.tournament.run(
            &agents,
            self.config.games_per_match,
            self.config.rounds_per_game,
            rng,
        )?;
        let ranked = standings.ranked();
        self.events.log(
            generation,
            EventType::TournamentCompleted {
                matches: TournamentAggregator::match_count(agents.len(), self.config.games_per_match),
                leader: ranked.first().map(|r| r.name.clone()),
                leader_average_score: ranked.first().map_or(0.0, |r| r.average_score),
            },
        );

        let report = self.world.mutate(self.config.mutation_rate, rng);
        for flip in &report.flips {
            self.events.log(
                generation,
                EventType::DispositionFlipped {
                    agent_id: flip.agent_id.clone(),
                    strategy: flip.strategy.clone(),
                    x: flip.x,
                    y: flip.y,
                    from: flip.from,
                    to: flip.to,
                },
            );
        }

        let counts = self.world.stats();
        self.events.log(
            generation,
            EventType::GenerationCompleted {
                cooperative: counts.cooperative,
                defecting: counts.defecting,
                mutation_attempts: report.attempts,
                flips: report.flips.len(),
            },
        );
        info!(
            "generation {}: {} cooperative / {} defecting, {} of {} mutation draws flipped towards {}",
            generation,
            counts.cooperative,
            counts.defecting,
            report.flips.len(),
            report.attempts,
            report.winner
        );

        self.generation += 1;
        Ok(GenerationStats {
            generation,
            cooperative: counts.cooperative,
            defecting: counts.defecting,
            winner: report.winner,
            mutation_attempts: report.attempts,
            flips: report.flips.len(),
            standings: ranked,
        })
    }

    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        generations: usize,
        rng: &mut R,
    ) -> Result<Vec<GenerationStats>> {
        self.advance_while(generations, rng, |_| ControlFlow::Continue(()))
    }

    /// Like [`EvolvingWorld::advance`], but `control` is consulted after every
    /// generation and may stop the run early.
    pub fn advance_while<R, F>(
        &mut self,
        generations: usize,
        rng: &mut R,
        mut control: F,
    ) -> Result<Vec<GenerationStats>>
    where
        R: Rng + ?Sized,
        F: FnMut(&GenerationStats) -> ControlFlow<()>,
    {
        let mut history = Vec::with_capacity(generations);
        for _ in 0..generations {
            let stats = self.step(rng)?;
            let flow = control(&stats);
            history.push(stats);
            if flow.is_break() {
                info!("world run stopped after generation {}", self.generation - 1);
                break;
            }
        }
        Ok(history)
    }
}
