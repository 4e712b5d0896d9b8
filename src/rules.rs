//! Declarative rule language for strategies.
//!
//! A strategy is an ordered list of [`Rule`]s. Each rule pairs a conjunction of
//! [`Condition`]s with an [`Action`]. Rule data is usually loaded from JSON or YAML,
//! so every condition and action kind carries a serde `type` tag:
//!
//! ```json
//! { "conditions": [{ "type": "opponent_last_action", "value": "defect" }],
//!   "action": { "type": "defect" } }
//! ```
//!
//! Tags this version does not know deserialize to `Unknown` instead of failing.
//! An unknown condition never holds and an unknown action cooperates, so rule sets
//! written for a newer engine still load and play. The punishment-phase kinds of
//! older rule sets (`in_punishment_phase`, `punishment_turn`, `start_punishment`,
//! `end_punishment`) are not supported and load as `Unknown` the same way.
//!
//! Older rule sets also name a few opponent-only conditions with their own tags.
//! Those load as the general kind they specialise:
//!
//! | legacy tag | loads as |
//! |---|---|
//! | `opponent_recent_defection_rate` (`count`, `value`) | `recent_action_rate` over the opponent's defections |
//! | `opponent_consecutive_defections` (`count`) | `consecutive_actions` of opponent defections |
//! | `opponent_consecutive_cooperations` (`count`) | `consecutive_actions` of opponent cooperations |

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::{Result, SimError};
use crate::types::{Move, Subject};

/// Comparison operator used by the numeric conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    /// Left side is a multiple of the right side.
    Divisible,
    Unknown,
}

impl Comparison {
    pub fn apply(self, value: i64, against: i64) -> bool {
        match self {
            Comparison::Lt => value < against,
            Comparison::Le => value <= against,
            Comparison::Gt => value > against,
            Comparison::Ge => value >= against,
            Comparison::Eq => value == against,
            Comparison::Divisible => against != 0 && value % against == 0,
            Comparison::Unknown => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Divisible => "%",
            Comparison::Unknown => "?",
        }
    }

    fn equal() -> Self {
        Comparison::Eq
    }

    fn at_least() -> Self {
        Comparison::Ge
    }
}

impl From<String> for Comparison {
    fn from(s: String) -> Self {
        match s.trim() {
            "<" => Comparison::Lt,
            "<=" => Comparison::Le,
            ">" => Comparison::Gt,
            ">=" => Comparison::Ge,
            "==" | "=" => Comparison::Eq,
            "%" => Comparison::Divisible,
            _ => Comparison::Unknown,
        }
    }
}

impl From<Comparison> for String {
    fn from(op: Comparison) -> Self {
        op.as_str().to_string()
    }
}

impl Serialize for Comparison {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Comparison {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Comparison::from)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn half() -> f64 {
    0.5
}

fn default_window() -> usize {
    10
}

/// A predicate over both agents' match state and the round index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "snake_case")]
pub enum Condition {
    IsFirstMove,
    OpponentLastAction {
        value: Move,
    },
    OwnLastAction {
        value: Move,
    },
    OpponentActionCount {
        value: Move,
        #[serde(default)]
        count: usize,
    },
    OwnActionCount {
        value: Move,
        #[serde(default)]
        count: usize,
    },
    /// Trailing run of `value` in `who`'s history is at least `count` long.
    #[serde(alias = "opponent_consecutive_actions")]
    ConsecutiveActions {
        #[serde(default)]
        who: Subject,
        value: Move,
        #[serde(default)]
        count: usize,
    },
    TurnNumber {
        #[serde(default = "Comparison::equal")]
        operator: Comparison,
        #[serde(default)]
        count: i64,
    },
    ScoreDifference {
        #[serde(default = "Comparison::at_least")]
        operator: Comparison,
        #[serde(default)]
        count: i64,
    },
    /// Share of `value` among the last `window` moves is strictly above `threshold`.
    RecentActionRate {
        #[serde(default)]
        who: Subject,
        value: Move,
        #[serde(default = "default_window")]
        window: usize,
        #[serde(default = "half")]
        threshold: f64,
    },
    RandomChance {
        #[serde(default = "half")]
        probability: f64,
    },
    IsNthMove {
        interval: usize,
    },
    IsWithinFirstNRounds {
        #[serde(default)]
        duration: usize,
    },
    IsSpecificRound {
        #[serde(alias = "roundNumber")]
        round_number: usize,
    },
    IsLosingAfterNRounds {
        #[serde(default)]
        count: usize,
    },
    WonPreviousRound,
    #[serde(other)]
    Unknown,
}

/// Opponent-only condition tags from older rule sets.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LegacyCondition {
    OpponentRecentDefectionRate {
        #[serde(default = "default_window")]
        count: usize,
        #[serde(default = "half")]
        value: f64,
    },
    OpponentConsecutiveDefections {
        #[serde(default)]
        count: usize,
    },
    OpponentConsecutiveCooperations {
        #[serde(default)]
        count: usize,
    },
}

impl LegacyCondition {
    const TAGS: [&'static str; 3] = [
        "opponent_recent_defection_rate",
        "opponent_consecutive_defections",
        "opponent_consecutive_cooperations",
    ];
}

impl From<LegacyCondition> for Condition {
    fn from(legacy: LegacyCondition) -> Self {
        match legacy {
            LegacyCondition::OpponentRecentDefectionRate { count, value } => {
                Condition::RecentActionRate {
                    who: Subject::Opponent,
                    value: Move::Defect,
                    window: count,
                    threshold: value,
                }
            }
            LegacyCondition::OpponentConsecutiveDefections { count } => {
                Condition::ConsecutiveActions {
                    who: Subject::Opponent,
                    value: Move::Defect,
                    count,
                }
            }
            LegacyCondition::OpponentConsecutiveCooperations { count } => {
                Condition::ConsecutiveActions {
                    who: Subject::Opponent,
                    value: Move::Cooperate,
                    count,
                }
            }
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Condition::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let legacy = raw
            .get("type")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|tag| LegacyCondition::TAGS.contains(&tag));

        if legacy {
            LegacyCondition::deserialize(raw)
                .map(Condition::from)
                .map_err(de::Error::custom)
        } else {
            Condition::deserialize(raw).map_err(de::Error::custom)
        }
    }
}

impl Condition {
    pub fn validate(&self) -> Result<()> {
        match self {
            Condition::RecentActionRate {
                window, threshold, ..
            } => {
                if *window == 0 {
                    return Err(SimError::invalid("recent_action_rate window must be at least 1"));
                }
                check_unit_interval("recent_action_rate threshold", *threshold)
            }
            Condition::RandomChance { probability } => {
                check_unit_interval("random_chance probability", *probability)
            }
            Condition::IsNthMove { interval } if *interval == 0 => {
                Err(SimError::invalid("is_nth_move interval must be at least 1"))
            }
            _ => Ok(()),
        }
    }
}

/// What an agent plays once a rule matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Cooperate,
    Defect,
    /// Cooperate with `probability`, defect otherwise.
    Random {
        #[serde(default = "half")]
        probability: f64,
    },
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn validate(&self) -> Result<()> {
        match self {
            Action::Random { probability } => check_unit_interval("random probability", *probability),
            _ => Ok(()),
        }
    }

    /// Whether this action, taken as a strategy's opening rule, marks it as cooperative-leaning.
    pub fn leans_cooperative(&self) -> bool {
        match self {
            Action::Cooperate => true,
            Action::Random { probability } => *probability > 0.5,
            Action::Defect | Action::Unknown => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// All must hold. An empty list always holds.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub action: Action,
}

impl Rule {
    pub fn new(conditions: Vec<Condition>, action: Action) -> Self {
        Self { conditions, action }
    }

    /// Unconditional rule.
    pub fn always(action: Action) -> Self {
        Self::new(Vec::new(), action)
    }

    pub fn when(condition: Condition, action: Action) -> Self {
        Self::new(vec![condition], action)
    }

    pub fn validate(&self) -> Result<()> {
        for condition in &self.conditions {
            condition.validate()?;
        }
        self.action.validate()
    }
}

fn check_unit_interval(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::invalid(format!(
            "{} must be within [0, 1], got {}",
            what, value
        )))
    }
}
