use serde::{Deserialize, Serialize};

use crate::tournament::AggregatedResult;
use crate::world::{FinalStats, GenerationStats};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentMetrics {
    pub strategies: usize,
    pub leader: Option<String>,
    pub mean_average_score: f64,
    pub score_inequality: f64,
    pub mean_cooperation_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldMetrics {
    pub generations: usize,
    pub initial_cooperative_percentage: f64,
    pub final_cooperative_percentage: f64,
    pub total_mutation_attempts: usize,
    pub total_flips: usize,
}

pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Summary of a tournament. `results` is expected in ranked order.
    pub fn calculate_tournament_metrics(results: &[AggregatedResult]) -> TournamentMetrics {
        let played: Vec<&AggregatedResult> = results.iter().filter(|r| r.total_games > 0).collect();

        let (mean_average_score, mean_cooperation_rate) = if played.is_empty() {
            (0.0, 0.0)
        } else {
            let n = played.len() as f64;
            (
                played.iter().map(|r| r.average_score).sum::<f64>() / n,
                played.iter().map(|r| r.average_cooperation_rate).sum::<f64>() / n,
            )
        };

        let scores: Vec<f64> = played.iter().map(|r| r.average_score).collect();

        TournamentMetrics {
            strategies: results.len(),
            leader: played.first().map(|r| r.name.clone()),
            mean_average_score,
            score_inequality: Self::calculate_gini_coefficient(&scores),
            mean_cooperation_rate,
        }
    }

    /// `initial` is the population before the first generation.
    pub fn calculate_world_metrics(
        initial: &FinalStats,
        history: &[GenerationStats],
        final_stats: &FinalStats,
    ) -> WorldMetrics {
        WorldMetrics {
            generations: history.len(),
            initial_cooperative_percentage: initial.cooperative_percentage,
            final_cooperative_percentage: final_stats.cooperative_percentage,
            total_mutation_attempts: history.iter().map(|g| g.mutation_attempts).sum(),
            total_flips: history.iter().map(|g| g.flips).sum(),
        }
    }

    pub fn calculate_gini_coefficient(values: &[f64]) -> f64 {
        if values.is_empty() || values.iter().all(|&v| v == 0.0) {
            return 0.0;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let total: f64 = sorted.iter().sum();

        if total == 0.0 {
            return 0.0;
        }

        let mut sum = 0.0;

        for (i, &value) in sorted.iter().enumerate() {
            sum += (i as f64 + 1.0) * value;
        }

        2.0 * sum / (n * total) - (n + 1.0) / n
    }
}

impl std::fmt::Display for TournamentMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tournament Metrics ({} strategies):", self.strategies)?;
        if let Some(leader) = &self.leader {
            writeln!(f, "  Leader: {}", leader)?;
        }
        writeln!(f, "  Mean Average Score: {:.2}", self.mean_average_score)?;
        writeln!(f, "  Score Inequality (Gini): {:.3}", self.score_inequality)?;
        writeln!(
            f,
            "  Mean Cooperation Rate: {:.1}%",
            self.mean_cooperation_rate * 100.0
        )?;
        Ok(())
    }
}

impl std::fmt::Display for WorldMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "World Metrics ({} generations):", self.generations)?;
        writeln!(
            f,
            "  Cooperative Share: {:.1}% -> {:.1}%",
            self.initial_cooperative_percentage, self.final_cooperative_percentage
        )?;
        writeln!(
            f,
            "  Mutations: {} flips from {} draws",
            self.total_flips, self.total_mutation_attempts
        )?;
        Ok(())
    }
}
