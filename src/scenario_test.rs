#[cfg(test)]
mod tests {
    use super::super::error::SimError;
    use super::super::rules::{Action, Condition, Rule};
    use super::super::scenario::*;
    use super::super::strategies::StrategyDefinition;
    use super::super::types::Move;
    use super::super::world::Seeding;

    fn duel(rounds: usize) -> Scenario {
        Scenario::new(
            "test_duel",
            RunConfig::Match {
                strategies: vec!["Tit-for-Tat".to_string(), "Always Defect".to_string()],
                rounds,
            },
        )
    }

    #[test]
    fn test_scenario_creation() {
        let mut scenario = duel(10);
        scenario.description = "A test scenario".to_string();
        scenario.add_strategy(StrategyDefinition::new(
            "Mirror",
            vec![
                Rule::when(Condition::OpponentLastAction { value: Move::Defect }, Action::Defect),
                Rule::always(Action::Cooperate),
            ],
        ));

        assert_eq!(scenario.strategies.len(), 1);
        assert_eq!(scenario.name, "test_duel");
        assert_eq!(scenario.environment, "balanced");
        assert_eq!(scenario.run.kind(), "match");
    }

    #[test]
    fn test_scenario_validation() {
        assert!(duel(10).validate().is_ok());
        assert!(duel(0).validate().is_err());

        let mut three = duel(5);
        three.run = RunConfig::Match {
            strategies: vec!["a".into(), "b".into(), "c".into()],
            rounds: 5,
        };
        assert!(three.validate().is_err());

        let crowded = Scenario::new(
            "crowded",
            RunConfig::World {
                width: 2,
                height: 2,
                population_size: 5,
                years: 1,
                games_per_match: 1,
                rounds_per_game: 1,
            },
        );
        assert!(matches!(
            crowded.validate(),
            Err(SimError::InvalidConfiguration(_))
        ));

        let huge = Scenario::new(
            "huge",
            RunConfig::World {
                width: usize::MAX,
                height: 2,
                population_size: 4,
                years: 1,
                games_per_match: 1,
                rounds_per_game: 1,
            },
        );
        assert!(matches!(
            huge.validate(),
            Err(SimError::InvalidConfiguration(msg)) if msg.contains("too large")
        ));

        let mut bad_rule = duel(5);
        bad_rule.add_strategy(StrategyDefinition::new(
            "Broken",
            vec![Rule::always(Action::Random { probability: 2.0 })],
        ));
        assert!(bad_rule.validate().is_err());
    }

    #[test]
    fn test_scenario_serialization() {
        let scenario = create_standard_scenarios().get("hostile").unwrap().clone();

        let json = serde_json::to_string_pretty(&scenario).unwrap();
        let deserialized: Scenario = serde_json::from_str(&json).unwrap();

        assert_eq!(scenario.name, deserialized.name);
        assert_eq!(scenario.run, deserialized.run);
        assert_eq!(deserialized.seeding, Seeding::Environment);
    }

    #[test]
    fn test_yaml_scenario_with_custom_strategy() {
        let yaml = r#"
name: yaml_duel
environment: friendly
random_seed: 3
strategies:
  - name: Always Cooperate
    rules:
      - action: { type: cooperate }
run:
  type: match
  strategies: [always-cooperate, always-defect]
  rounds: 3
"#;
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        let ScenarioOutcome::Match(report) = scenario.run().unwrap() else {
            panic!("expected a match report");
        };
        assert_eq!(report.environment, "Friendly World");
        assert_eq!(report.results[0].score, 0);
        assert_eq!(report.results[1].score, 15);
    }

    #[test]
    fn test_unknown_strategy_is_reported() {
        let mut scenario = duel(3);
        scenario.run = RunConfig::Match {
            strategies: vec!["Tit-for-Tat".to_string(), "Nobody".to_string()],
            rounds: 3,
        };
        assert!(matches!(
            scenario.run(),
            Err(SimError::StrategyNotFound(name)) if name == "Nobody"
        ));
    }

    #[test]
    fn test_standard_scenarios_run() {
        for (key, mut scenario) in create_standard_scenarios() {
            scenario.random_seed = Some(1);
            if let RunConfig::World { years, .. } = &mut scenario.run {
                *years = 2;
            }
            let outcome = scenario.run().unwrap_or_else(|e| panic!("{} failed: {}", key, e));
            if let ScenarioOutcome::World(report) = outcome {
                assert_eq!(report.yearly_stats.len(), 2);
                assert!(report.final_stats.dominant_percentage >= 50.0);
                assert_eq!(
                    report.final_stats.cooperative + report.final_stats.defecting,
                    report.population_size
                );
            }
        }
    }

    #[test]
    fn test_scenario_display() {
        let scenarios = create_standard_scenarios();
        let scenario = scenarios.get("duel").unwrap();
        let display = format!("{}", scenario);

        assert!(display.contains("Scenario: tit_for_tat_duel"));
        assert!(display.contains("Tit-for-Tat vs Always Defect"));
        assert!(display.contains("Payoffs: R=3 P=1 T=5 S=0"));
    }
}
