//! Pairwise repeated game between two agents.

use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{MatchState, RuleEngine};
use crate::strategies::Agent;
use crate::types::{AgentId, Move, history_string};

/// Scores for the four outcomes of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    /// Both cooperate.
    pub reward: u32,
    /// Both defect.
    pub punishment: u32,
    /// Lone defector.
    pub temptation: u32,
    /// Lone cooperator.
    pub sucker: u32,
}

impl PayoffMatrix {
    pub const STANDARD: PayoffMatrix = PayoffMatrix {
        reward: 3,
        punishment: 1,
        temptation: 5,
        sucker: 0,
    };

    /// Payoffs for (a, b).
    pub fn score(&self, a: Move, b: Move) -> (u32, u32) {
        match (a, b) {
            (Move::Cooperate, Move::Cooperate) => (self.reward, self.reward),
            (Move::Defect, Move::Defect) => (self.punishment, self.punishment),
            (Move::Defect, Move::Cooperate) => (self.temptation, self.sucker),
            (Move::Cooperate, Move::Defect) => (self.sucker, self.temptation),
        }
    }

    /// T > R > P > S, the ordering that makes the game a dilemma.
    pub fn is_dilemma(&self) -> bool {
        self.temptation > self.reward && self.reward > self.punishment && self.punishment > self.sucker
    }
}

impl Default for PayoffMatrix {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Final tally for one side of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_id: AgentId,
    pub strategy: String,
    pub score: u64,
    pub cooperation_rate: f64,
    pub history: Vec<Move>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub rounds: usize,
    pub first: AgentResult,
    pub second: AgentResult,
}

impl MatchOutcome {
    pub fn results(&self) -> [&AgentResult; 2] {
        [&self.first, &self.second]
    }

    pub fn into_results(self) -> Vec<AgentResult> {
        vec![self.first, self.second]
    }
}

/// Runs repeated games under one payoff matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchSimulator {
    payoff: PayoffMatrix,
}

impl MatchSimulator {
    pub fn new(payoff: PayoffMatrix) -> Self {
        Self { payoff }
    }

    pub fn payoff(&self) -> &PayoffMatrix {
        &self.payoff
    }

    /// Play `rounds` rounds between `a` and `b`.
    ///
    /// Both sides decide from the state of earlier rounds only; payoffs for a round are
    /// applied after both moves are chosen. `a` always draws from `rng` before `b`.
    pub fn run<R: Rng + ?Sized>(
        &self,
        a: &Agent,
        b: &Agent,
        rounds: usize,
        rng: &mut R,
    ) -> MatchOutcome {
        let mut state_a = MatchState::new();
        let mut state_b = MatchState::new();

        for round in 0..rounds {
            let move_a = RuleEngine::decide(&a.strategy, &state_a, &state_b, round, rng);
            let move_b = RuleEngine::decide(&b.strategy, &state_b, &state_a, round, rng);
            let (payoff_a, payoff_b) = self.payoff.score(move_a, move_b);

            state_a.record(move_a, payoff_a);
            state_b.record(move_b, payoff_b);

            trace!(
                "round {}: {} {} / {} {} -> {}:{}",
                round, a.id, move_a, b.id, move_b, state_a.score(), state_b.score()
            );
        }

        MatchOutcome {
            rounds,
            first: finish(a, state_a),
            second: finish(b, state_b),
        }
    }
}

fn finish(agent: &Agent, state: MatchState) -> AgentResult {
    let score = state.score();
    let cooperation_rate = state.cooperation_rate();
    AgentResult {
        agent_id: agent.id.clone(),
        strategy: agent.strategy_name().to_string(),
        score,
        cooperation_rate,
        history: state.into_history(),
    }
}

impl std::fmt::Display for AgentResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): score {}, cooperation {:.1}%, history {}",
            self.strategy,
            self.agent_id,
            self.score,
            self.cooperation_rate * 100.0,
            history_string(&self.history)
        )
    }
}
