#[cfg(test)]
mod tests {
    use super::super::engine::*;
    use super::super::rules::*;
    use super::super::types::{Move, Subject};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use Move::{Cooperate as C, Defect as D};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    /// States for two players who have played `own` and `opponent`, scored 1 point a round.
    fn states(own: &[Move], opponent: &[Move]) -> (MatchState, MatchState) {
        let mut a = MatchState::new();
        let mut b = MatchState::new();
        for mv in own {
            a.record(*mv, 1);
        }
        for mv in opponent {
            b.record(*mv, 1);
        }
        (a, b)
    }

    fn holds(condition: Condition, own: &MatchState, opponent: &MatchState, round: usize) -> bool {
        RuleEngine::evaluate(&condition, own, opponent, round, &mut rng())
    }

    #[test]
    fn test_match_state_tracks_history() {
        let mut state = MatchState::new();
        assert_eq!(state.cooperation_rate(), 0.0);
        assert_eq!(state.last_move(), None);

        state.record(C, 3);
        state.record(D, 5);
        state.record(D, 1);

        assert_eq!(state.score(), 9);
        assert_eq!(state.cooperations(), 1);
        assert_eq!(state.rounds_played(), 3);
        assert_eq!(state.last_move(), Some(D));
        assert_eq!(state.count(D), 2);
        assert_eq!(state.trailing_run(D), 2);
        assert_eq!(state.trailing_run(C), 0);
        assert!((state.cooperation_rate() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(state.recent_rate(D, 2), Some(1.0));
        assert_eq!(MatchState::new().recent_rate(D, 5), None);
    }

    #[test]
    fn test_no_matching_rule_falls_back() {
        let (own, opp) = states(&[], &[]);
        assert_eq!(RuleEngine::decide_rules(&[], &own, &opp, 0, &mut rng()), C);

        let (own, opp) = states(&[C], &[C]);
        assert_eq!(RuleEngine::decide_rules(&[], &own, &opp, 1, &mut rng()), D);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            Rule::when(Condition::IsFirstMove, Action::Defect),
            Rule::always(Action::Cooperate),
            Rule::always(Action::Defect),
        ];
        let (own, opp) = states(&[], &[]);
        assert_eq!(RuleEngine::decide_rules(&rules, &own, &opp, 0, &mut rng()), D);

        let (own, opp) = states(&[D], &[C]);
        assert_eq!(RuleEngine::decide_rules(&rules, &own, &opp, 1, &mut rng()), C);
    }

    #[test]
    fn test_conditions_are_a_conjunction() {
        let rule = Rule::new(
            vec![
                Condition::OwnLastAction { value: D },
                Condition::OpponentLastAction { value: D },
            ],
            Action::Cooperate,
        );
        let rules = vec![rule, Rule::always(Action::Defect)];

        let (own, opp) = states(&[D], &[D]);
        assert_eq!(RuleEngine::decide_rules(&rules, &own, &opp, 1, &mut rng()), C);

        let (own, opp) = states(&[D], &[C]);
        assert_eq!(RuleEngine::decide_rules(&rules, &own, &opp, 1, &mut rng()), D);
    }

    #[test]
    fn test_last_action_is_false_on_first_round() {
        let (own, opp) = states(&[], &[]);
        assert!(!holds(Condition::OpponentLastAction { value: C }, &own, &opp, 0));
        assert!(!holds(Condition::OwnLastAction { value: D }, &own, &opp, 0));
        assert!(holds(Condition::IsFirstMove, &own, &opp, 0));
    }

    #[test]
    fn test_action_counts() {
        let (own, opp) = states(&[C, C, D], &[D, C, D]);
        assert!(holds(
            Condition::OpponentActionCount { value: D, count: 2 },
            &own,
            &opp,
            3
        ));
        assert!(!holds(
            Condition::OpponentActionCount { value: D, count: 3 },
            &own,
            &opp,
            3
        ));
        assert!(holds(
            Condition::OwnActionCount { value: C, count: 2 },
            &own,
            &opp,
            3
        ));
    }

    #[test]
    fn test_consecutive_actions_uses_trailing_run() {
        let (own, opp) = states(&[D, D, C], &[C, D, D]);
        let opponent_run = Condition::ConsecutiveActions {
            who: Subject::Opponent,
            value: D,
            count: 2,
        };
        let own_run = Condition::ConsecutiveActions {
            who: Subject::Own,
            value: D,
            count: 2,
        };
        assert!(holds(opponent_run, &own, &opp, 3));
        assert!(!holds(own_run, &own, &opp, 3));
    }

    #[test]
    fn test_turn_number_is_one_based() {
        let (own, opp) = states(&[C, C], &[C, C]);
        let third = Condition::TurnNumber {
            operator: Comparison::Eq,
            count: 3,
        };
        assert!(holds(third.clone(), &own, &opp, 2));
        assert!(!holds(third, &own, &opp, 1));

        let even = Condition::TurnNumber {
            operator: Comparison::Divisible,
            count: 2,
        };
        assert!(holds(even, &own, &opp, 1));
    }

    #[test]
    fn test_score_difference() {
        let mut own = MatchState::new();
        let mut opp = MatchState::new();
        own.record(D, 5);
        opp.record(C, 0);

        let ahead = Condition::ScoreDifference {
            operator: Comparison::Ge,
            count: 5,
        };
        assert!(holds(ahead.clone(), &own, &opp, 1));
        assert!(!holds(ahead, &opp, &own, 1));
    }

    #[test]
    fn test_recent_action_rate_is_strict() {
        let condition = |threshold| Condition::RecentActionRate {
            who: Subject::Opponent,
            value: D,
            window: 4,
            threshold,
        };

        let (own, opp) = states(&[C, C, C, C, C], &[D, D, D, C, C]);
        // Last four opponent moves are D D C C.
        assert!(!holds(condition(0.5), &own, &opp, 5));
        assert!(holds(condition(0.4), &own, &opp, 5));

        let (own, opp) = states(&[], &[]);
        assert!(!holds(condition(0.0), &own, &opp, 0));
    }

    #[test]
    fn test_round_position_conditions() {
        let (own, opp) = states(&[], &[]);

        assert!(holds(Condition::IsNthMove { interval: 3 }, &own, &opp, 2));
        assert!(!holds(Condition::IsNthMove { interval: 3 }, &own, &opp, 3));
        assert!(!holds(Condition::IsNthMove { interval: 0 }, &own, &opp, 0));

        assert!(holds(Condition::IsWithinFirstNRounds { duration: 2 }, &own, &opp, 1));
        assert!(!holds(Condition::IsWithinFirstNRounds { duration: 2 }, &own, &opp, 2));

        assert!(holds(Condition::IsSpecificRound { round_number: 4 }, &own, &opp, 3));
        assert!(!holds(Condition::IsSpecificRound { round_number: 4 }, &own, &opp, 4));
    }

    #[test]
    fn test_losing_and_winning_conditions() {
        let mut own = MatchState::new();
        let mut opp = MatchState::new();
        own.record(C, 0);
        opp.record(D, 5);

        assert!(holds(Condition::IsLosingAfterNRounds { count: 1 }, &own, &opp, 1));
        assert!(!holds(Condition::IsLosingAfterNRounds { count: 2 }, &own, &opp, 1));
        assert!(holds(Condition::WonPreviousRound, &opp, &own, 1));
        assert!(!holds(Condition::WonPreviousRound, &own, &opp, 1));
        assert!(!holds(Condition::WonPreviousRound, &opp, &own, 0));
    }

    #[test]
    fn test_random_chance_extremes() {
        let (own, opp) = states(&[], &[]);
        let mut rng = rng();
        for round in 0..50 {
            assert!(RuleEngine::evaluate(
                &Condition::RandomChance { probability: 1.0 },
                &own,
                &opp,
                round,
                &mut rng
            ));
            assert!(!RuleEngine::evaluate(
                &Condition::RandomChance { probability: 0.0 },
                &own,
                &opp,
                round,
                &mut rng
            ));
        }
    }

    #[test]
    fn test_unknown_condition_and_action() {
        let (own, opp) = states(&[], &[]);
        assert!(!holds(Condition::Unknown, &own, &opp, 0));
        assert_eq!(RuleEngine::execute(&Action::Unknown, &mut rng()), C);

        let rules = vec![
            Rule::when(Condition::Unknown, Action::Defect),
            Rule::always(Action::Unknown),
        ];
        assert_eq!(RuleEngine::decide_rules(&rules, &own, &opp, 3, &mut rng()), C);
    }

    #[test]
    fn test_random_action_extremes() {
        let mut rng = rng();
        for _ in 0..50 {
            assert_eq!(RuleEngine::execute(&Action::Random { probability: 1.0 }, &mut rng), C);
            assert_eq!(RuleEngine::execute(&Action::Random { probability: 0.0 }, &mut rng), D);
        }
    }
}
