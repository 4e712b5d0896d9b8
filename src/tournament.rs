//! Round-robin tournament and per-strategy aggregation.
//!
//! Every unordered pair of agents `(i, j)` with `i <= j` plays `games_per_match`
//! independent matches, so each agent also meets itself. Results are folded into one
//! [`AggregatedResult`] per strategy name; several agents cloned from the same template
//! share an accumulator.

use log::{debug, error, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SimError};
use crate::game::{MatchOutcome, MatchSimulator};
use crate::strategies::Agent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    /// Strictly higher score wins, equal scores draw.
    pub fn from_scores(own: u64, other: u64) -> Self {
        match own.cmp(&other) {
            std::cmp::Ordering::Greater => GameResult::Win,
            std::cmp::Ordering::Less => GameResult::Loss,
            std::cmp::Ordering::Equal => GameResult::Draw,
        }
    }
}

/// Running totals for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub name: String,
    pub total_score: u64,
    pub total_games: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub average_score: f64,
    pub average_cooperation_rate: f64,
}

impl AggregatedResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_score: 0,
            total_games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            average_score: 0.0,
            average_cooperation_rate: 0.0,
        }
    }

    /// Fold in one game. The cooperation mean is updated incrementally.
    pub fn record(&mut self, score: u64, cooperation_rate: f64, result: GameResult) {
        self.total_score += score;
        self.total_games += 1;
        match result {
            GameResult::Win => self.wins += 1,
            GameResult::Loss => self.losses += 1,
            GameResult::Draw => self.draws += 1,
        }

        let n = self.total_games as f64;
        self.average_cooperation_rate += (cooperation_rate - self.average_cooperation_rate) / n;
        self.average_score = self.total_score as f64 / n;
    }

    pub fn is_consistent(&self) -> bool {
        self.wins + self.losses + self.draws == self.total_games
    }
}

/// Per-strategy accumulators keyed by strategy name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Standings {
    results: BTreeMap<String, AggregatedResult>,
}

impl Standings {
    /// One empty accumulator per distinct strategy among `agents`.
    pub fn for_agents(agents: &[Agent]) -> Self {
        let mut standings = Self::default();
        for agent in agents {
            standings.register(agent.strategy_name());
        }
        standings
    }

    pub fn register(&mut self, name: &str) {
        self.results
            .entry(name.to_string())
            .or_insert_with(|| AggregatedResult::new(name));
    }

    /// Fold a match into both sides' accumulators.
    ///
    /// Fails without touching anything when either strategy has no accumulator.
    pub fn record(&mut self, outcome: &MatchOutcome) -> Result<()> {
        let [first, second] = outcome.results();
        for side in [first, second] {
            if !self.results.contains_key(&side.strategy) {
                return Err(SimError::DataIntegrity(format!(
                    "no accumulator for strategy {} (agent {})",
                    side.strategy, side.agent_id
                )));
            }
        }

        for (own, other) in [(first, second), (second, first)] {
            if let Some(entry) = self.results.get_mut(&own.strategy) {
                entry.record(
                    own.score,
                    own.cooperation_rate,
                    GameResult::from_scores(own.score, other.score),
                );
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AggregatedResult> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregatedResult> {
        self.results.values()
    }

    pub fn into_map(self) -> BTreeMap<String, AggregatedResult> {
        self.results
    }

    /// Sorted by average score, best first, then by name.
    pub fn ranked(&self) -> Vec<AggregatedResult> {
        let mut ranked: Vec<AggregatedResult> = self.results.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.average_score
                .total_cmp(&a.average_score)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked
    }
}

/// Runs a full round-robin and aggregates the results.
#[derive(Debug, Clone, Copy, Default)]
pub struct TournamentAggregator {
    simulator: MatchSimulator,
}

impl TournamentAggregator {
    pub fn new(simulator: MatchSimulator) -> Self {
        Self { simulator }
    }

    /// Number of matches a run over `agents` agents will play.
    pub fn match_count(agents: usize, games_per_match: usize) -> usize {
        agents * (agents + 1) / 2 * games_per_match
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        agents: &[Agent],
        games_per_match: usize,
        rounds_per_game: usize,
        rng: &mut R,
    ) -> Result<Standings> {
        if games_per_match == 0 {
            return Err(SimError::invalid("games per match must be at least 1"));
        }
        if rounds_per_game == 0 {
            return Err(SimError::invalid("rounds per game must be at least 1"));
        }

        let mut standings = Standings::for_agents(agents);
        let mut skipped = 0usize;

        for i in 0..agents.len() {
            for j in i..agents.len() {
                let (a, b) = (&agents[i], &agents[j]);
                for game in 0..games_per_match {
                    let outcome = self.simulator.run(a, b, rounds_per_game, rng);
                    debug!(
                        "match {} vs {} game {}: {}-{}",
                        a.id, b.id, game, outcome.first.score, outcome.second.score
                    );
                    if let Err(e) = standings.record(&outcome) {
                        error!("skipping match update: {}", e);
                        skipped += 1;
                    }
                }
            }
        }

        info!(
            "tournament finished: {} agents, {} strategies, {} matches, {} skipped",
            agents.len(),
            standings.len(),
            Self::match_count(agents.len(), games_per_match),
            skipped
        );
        Ok(standings)
    }
}
