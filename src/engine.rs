//! Per-round decision resolution.
//!
//! [`RuleEngine::decide`] walks a strategy's rules in declaration order and plays the
//! action of the first rule whose conditions all hold. Conditions only read the two
//! [`MatchState`]s, the round index and the injected random source.
//!
//! When no rule matches, the engine falls back to cooperating on the opening round and
//! defecting afterwards. This fallback is intentional, not an error path: every
//! built-in strategy ends with an unconditional rule, so it only applies to custom rule
//! sets that leave gaps.

use rand::Rng;

use crate::rules::{Action, Condition, Rule};
use crate::strategies::Strategy;
use crate::types::{Move, Subject};

/// One agent's side of a running match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchState {
    history: Vec<Move>,
    score: u64,
    cooperations: u64,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn cooperations(&self) -> u64 {
        self.cooperations
    }

    pub fn rounds_played(&self) -> usize {
        self.history.len()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().copied()
    }

    pub fn count(&self, mv: Move) -> usize {
        self.history.iter().filter(|m| **m == mv).count()
    }

    /// Length of the run of `mv` at the end of the history.
    pub fn trailing_run(&self, mv: Move) -> usize {
        self.history.iter().rev().take_while(|m| **m == mv).count()
    }

    /// Share of `mv` among the last `window` moves, `None` before the first move.
    pub fn recent_rate(&self, mv: Move, window: usize) -> Option<f64> {
        let start = self.history.len().saturating_sub(window);
        let recent = &self.history[start..];
        if recent.is_empty() {
            return None;
        }
        let hits = recent.iter().filter(|m| **m == mv).count();
        Some(hits as f64 / recent.len() as f64)
    }

    /// Append this round's move and payoff.
    pub fn record(&mut self, mv: Move, payoff: u32) {
        self.history.push(mv);
        self.score += u64::from(payoff);
        if mv.is_cooperate() {
            self.cooperations += 1;
        }
    }

    /// Cooperations over rounds played, 0 for an empty match.
    pub fn cooperation_rate(&self) -> f64 {
        if self.history.is_empty() {
            0.0
        } else {
            self.cooperations as f64 / self.history.len() as f64
        }
    }

    pub fn into_history(self) -> Vec<Move> {
        self.history
    }
}

/// Stateless evaluator for strategy rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    /// Decide `strategy`'s move for `round` (0-based) given both sides' prior rounds.
    pub fn decide<R: Rng + ?Sized>(
        strategy: &Strategy,
        own: &MatchState,
        opponent: &MatchState,
        round: usize,
        rng: &mut R,
    ) -> Move {
        Self::decide_rules(&strategy.rules, own, opponent, round, rng)
    }

    pub fn decide_rules<R: Rng + ?Sized>(
        rules: &[Rule],
        own: &MatchState,
        opponent: &MatchState,
        round: usize,
        rng: &mut R,
    ) -> Move {
        for rule in rules {
            // `all` short-circuits, so later random_chance conditions only draw when reached.
            if rule
                .conditions
                .iter()
                .all(|c| Self::evaluate(c, own, opponent, round, rng))
            {
                return Self::execute(&rule.action, rng);
            }
        }
        Self::fallback(round)
    }

    /// Move played when no rule matches.
    pub fn fallback(round: usize) -> Move {
        if round == 0 {
            Move::Cooperate
        } else {
            Move::Defect
        }
    }

    pub fn evaluate<R: Rng + ?Sized>(
        condition: &Condition,
        own: &MatchState,
        opponent: &MatchState,
        round: usize,
        rng: &mut R,
    ) -> bool {
        let pick = |who: Subject| match who {
            Subject::Own => own,
            Subject::Opponent => opponent,
        };

        match condition {
            Condition::IsFirstMove => round == 0,
            Condition::OpponentLastAction { value } => {
                round > 0 && opponent.last_move() == Some(*value)
            }
            Condition::OwnLastAction { value } => round > 0 && own.last_move() == Some(*value),
            Condition::OpponentActionCount { value, count } => opponent.count(*value) >= *count,
            Condition::OwnActionCount { value, count } => own.count(*value) >= *count,
            Condition::ConsecutiveActions { who, value, count } => {
                pick(*who).trailing_run(*value) >= *count
            }
            Condition::TurnNumber { operator, count } => {
                operator.apply(round as i64 + 1, *count)
            }
            Condition::ScoreDifference { operator, count } => {
                let difference = own.score() as i64 - opponent.score() as i64;
                operator.apply(difference, *count)
            }
            Condition::RecentActionRate {
                who,
                value,
                window,
                threshold,
            } => pick(*who)
                .recent_rate(*value, *window)
                .is_some_and(|rate| rate > *threshold),
            Condition::RandomChance { probability } => chance(rng, *probability),
            Condition::IsNthMove { interval } => *interval > 0 && (round + 1) % interval == 0,
            Condition::IsWithinFirstNRounds { duration } => round < *duration,
            Condition::IsSpecificRound { round_number } => round + 1 == *round_number,
            Condition::IsLosingAfterNRounds { count } => {
                round >= *count && own.score() < opponent.score()
            }
            // Scores here already include the previous round's payoff.
            Condition::WonPreviousRound => round > 0 && own.score() > opponent.score(),
            Condition::Unknown => false,
        }
    }

    pub fn execute<R: Rng + ?Sized>(action: &Action, rng: &mut R) -> Move {
        match action {
            Action::Cooperate => Move::Cooperate,
            Action::Defect => Move::Defect,
            Action::Random { probability } => {
                if chance(rng, *probability) {
                    Move::Cooperate
                } else {
                    Move::Defect
                }
            }
            Action::Unknown => Move::Cooperate,
        }
    }
}

/// Bernoulli draw that tolerates out-of-range or NaN probabilities.
fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.random::<f64>() < probability
}
