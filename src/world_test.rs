#[cfg(test)]
mod tests {
    use super::super::error::SimError;
    use super::super::events::EventType;
    use super::super::game::MatchSimulator;
    use super::super::strategies::*;
    use super::super::types::Disposition;
    use super::super::world::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::ops::ControlFlow;
    use std::sync::Arc;

    fn template(name: &str) -> Arc<Strategy> {
        StrategyCatalog::with_defaults().strategy(name).unwrap()
    }

    /// `cooperative` Tit-for-Tat agents followed by `defecting` Always Defect agents.
    fn population(cooperative: usize, defecting: usize) -> Population {
        let tft = template("Tit-for-Tat");
        let alld = template("Always Defect");
        let agents = (0..cooperative)
            .map(|i| Agent::spawn(&tft, i))
            .chain((0..defecting).map(|i| Agent::spawn(&alld, cooperative + i)))
            .collect();
        Population::from_agents(agents)
    }

    fn config(mutation_rate: f64) -> GenerationConfig {
        GenerationConfig {
            games_per_match: 1,
            rounds_per_game: 5,
            mutation_rate,
        }
    }

    #[test]
    fn test_mutation_attempts_floor() {
        // 100 * 0.29 is 28.999999999999996 in f64.
        assert_eq!(World::mutation_attempts(100, 0.29), 28);
        assert_eq!(World::mutation_attempts(100, 0.3), 30);
        assert_eq!(World::mutation_attempts(10, 0.15), 1);
        assert_eq!(World::mutation_attempts(9, 0.1), 0);
        assert_eq!(World::mutation_attempts(50, 0.0), 0);
        assert_eq!(World::mutation_attempts(50, 1.0), 50);
    }

    #[test]
    fn test_world_places_agents_row_major() {
        let world = World::new(WorldSize::new(3, 2), population(2, 2)).unwrap();
        assert_eq!(world.population_size(), 4);
        assert_eq!(world.cell(0, 0).unwrap().strategy_name(), "Tit-for-Tat");
        assert_eq!(world.cell(2, 0).unwrap().strategy_name(), "Always Defect");
        assert_eq!(world.cell(0, 1).unwrap().strategy_name(), "Always Defect");
        assert!(world.cell(1, 1).is_none());
        assert!(world.cell(3, 0).is_none());
    }

    #[test]
    fn test_world_rejects_bad_sizes() {
        assert!(World::new(WorldSize::new(0, 4), population(1, 0)).is_err());
        assert!(World::new(WorldSize::new(2, 2), population(3, 2)).is_err());
        assert!(World::new(WorldSize::new(2, 2), population(2, 2)).is_ok());
    }

    #[test]
    fn test_world_size_capacity_is_checked() {
        assert_eq!(WorldSize::new(3, 4).capacity().unwrap(), 12);
        assert!(matches!(
            WorldSize::new(usize::MAX, 2).capacity(),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(WorldSize::new(WorldSize::MAX_CELLS + 1, 1).capacity().is_err());
        assert!(WorldSize::new(WorldSize::MAX_CELLS, 1).capacity().is_ok());
        assert!(matches!(
            World::new(WorldSize::new(usize::MAX, usize::MAX), population(1, 1)),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_counts_and_tie_break() {
        let world = World::new(WorldSize::new(2, 2), population(2, 2)).unwrap();
        let counts = world.stats();
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.winner(), Disposition::Cooperative);

        let stats = world.final_stats();
        assert_eq!(stats.dominant_disposition, Disposition::Cooperative);
        assert!((stats.dominant_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_stats() {
        let stats: FinalStats = DispositionCounts::default().into();
        assert_eq!(stats.dominant_percentage, 0.0);
        assert_eq!(stats.cooperative_percentage, 0.0);
    }

    #[test]
    fn test_full_mutation_converts_minority() {
        // Draws repeat, so not every minority agent is reached.
        let mut world = World::new(WorldSize::new(4, 4), population(4, 12)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let report = world.mutate(1.0, &mut rng);

        assert_eq!(report.winner, Disposition::Defecting);
        assert_eq!(report.attempts, 16);
        for flip in &report.flips {
            assert_eq!(flip.from, Disposition::Cooperative);
            assert_eq!(flip.to, Disposition::Defecting);
        }
        let counts = world.stats();
        assert_eq!(counts.cooperative, 4 - report.flips.len());
        assert_eq!(counts.total(), 16);
    }

    #[test]
    fn test_zero_rate_changes_nothing() {
        let mut world = World::new(WorldSize::new(3, 3), population(3, 4)).unwrap();
        let before = world.stats();
        let report = world.mutate(0.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(report.attempts, 0);
        assert!(report.flips.is_empty());
        assert_eq!(world.stats(), before);
    }

    #[test]
    fn test_unanimous_world_is_stable() {
        let mut world = World::new(WorldSize::new(3, 3), population(9, 0)).unwrap();
        let report = world.mutate(1.0, &mut StdRng::seed_from_u64(2));
        assert!(report.flips.is_empty());
        assert_eq!(world.stats().cooperative, 9);
    }

    #[test]
    fn test_round_robin_population() {
        let templates = vec![template("Pavlov"), template("Grudger")];
        let population = Population::round_robin(&templates, 5).unwrap();
        let names: Vec<&str> = population.agents().iter().map(|a| a.strategy_name()).collect();
        assert_eq!(names, vec!["Pavlov", "Grudger", "Pavlov", "Grudger", "Pavlov"]);
        assert_eq!(population.agents()[4].id.as_str(), "pavlov_4");

        assert!(Population::round_robin(&[], 3).is_err());
        assert!(Population::round_robin(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_environment_seeding_respects_probability() {
        let templates: Vec<Arc<Strategy>> = StrategyCatalog::with_defaults().catalog();
        let mut rng = StdRng::seed_from_u64(4);

        let all_coop = Population::from_environment(&templates, 20, 1.0, &mut rng).unwrap();
        assert!(all_coop.agents().iter().all(|a| a.disposition.is_cooperative()));

        let all_defect = Population::from_environment(&templates, 20, 0.0, &mut rng).unwrap();
        assert!(all_defect.agents().iter().all(|a| !a.disposition.is_cooperative()));
    }

    #[test]
    fn test_generation_step_records_events() {
        let world = World::new(WorldSize::new(3, 3), population(3, 5)).unwrap();
        let mut evolving = EvolvingWorld::new(world, config(0.5), MatchSimulator::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let stats = evolving.step(&mut rng).unwrap();
        assert_eq!(stats.generation, 0);
        assert_eq!(stats.population(), 8);
        assert_eq!(stats.mutation_attempts, 4);
        assert_eq!(stats.winner, Disposition::Defecting);
        assert_eq!(stats.standings.len(), 2);
        assert_eq!(evolving.generation(), 1);

        let events = evolving.events().get_events();
        assert!(matches!(
            events.first().unwrap().event_type,
            EventType::TournamentCompleted { matches: 36, .. }
        ));
        assert!(matches!(
            events.last().unwrap().event_type,
            EventType::GenerationCompleted { .. }
        ));
        let flips = events
            .iter()
            .filter(|e| matches!(e.event_type, EventType::DispositionFlipped { .. }))
            .count();
        assert_eq!(flips, stats.flips);
    }

    #[test]
    fn test_advance_runs_every_generation() {
        let world = World::new(WorldSize::new(4, 4), population(6, 6)).unwrap();
        let mut evolving = EvolvingWorld::new(world, config(0.25), MatchSimulator::default()).unwrap();
        let history = evolving.advance(6, &mut StdRng::seed_from_u64(9)).unwrap();

        assert_eq!(history.len(), 6);
        for (i, stats) in history.iter().enumerate() {
            assert_eq!(stats.generation, i);
            assert_eq!(stats.population(), 12);
        }
        // Cooperative wins the opening tie, so defectors can only shrink at first.
        assert!(history[0].cooperative >= 6);
    }

    #[test]
    fn test_advance_while_stops_early() {
        let world = World::new(WorldSize::new(2, 2), population(2, 2)).unwrap();
        let mut evolving = EvolvingWorld::new(world, config(0.5), MatchSimulator::default()).unwrap();
        let history = evolving
            .advance_while(10, &mut StdRng::seed_from_u64(1), |stats| {
                if stats.generation == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(evolving.generation(), 3);
    }

    #[test]
    fn test_invalid_generation_config() {
        let world = World::new(WorldSize::new(2, 2), population(1, 1)).unwrap();
        assert!(EvolvingWorld::new(world.clone(), config(1.5), MatchSimulator::default()).is_err());
        let zero_games = GenerationConfig {
            games_per_match: 0,
            ..config(0.1)
        };
        assert!(EvolvingWorld::new(world, zero_games, MatchSimulator::default()).is_err());
    }

    #[test]
    fn test_seeded_worlds_repeat() {
        let run = || {
            let world = World::new(WorldSize::new(5, 5), population(10, 10)).unwrap();
            let mut evolving =
                EvolvingWorld::new(world, config(0.2), MatchSimulator::default()).unwrap();
            evolving.advance(5, &mut StdRng::seed_from_u64(77)).unwrap()
        };
        assert_eq!(run(), run());
    }
}
