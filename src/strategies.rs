//! Strategy templates and the catalog that serves them.
//!
//! A [`Strategy`] is a named, validated rule list. Agents taking part in a match are
//! [`Agent`]s cloned from a template: they share its rules through an `Arc` and carry
//! their own identity and disposition.
//!
//! # Built-in strategies
//!
//! - **Tit-for-Tat**: copies the opponent's last move, opens with cooperation
//! - **Generous Tit-for-Tat**: like Tit-for-Tat, but forgives a defection 70% of the time
//! - **Pavlov**: cooperates after mutual cooperation or mutual defection
//! - **Gradual**: cooperates until the opponent defects once, then defects
//! - **Forgiver**: returns to cooperation after two cooperative opponent moves
//! - **Always Defect**, **Suspicious Tit-for-Tat**, **Random**, **Grudger**, **Alternate**
//!
//! Disposition only looks at the first rule's action, so it does not always match
//! intuition: Suspicious Tit-for-Tat and Alternate open with a cooperate rule and are
//! cooperative-leaning, while Gradual and Grudger open with a defect rule.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Result, SimError};
use crate::rules::{Action, Condition, Rule};
use crate::types::{AgentId, Disposition, Move, Subject};

/// Agent template: identity, ordered rules and the disposition derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub rules: Arc<Vec<Rule>>,
    pub disposition: Disposition,
}

impl Strategy {
    /// Validate the rules and derive the disposition from the first rule's action.
    pub fn new(id: impl Into<String>, name: impl Into<String>, rules: Vec<Rule>) -> Result<Self> {
        let id = id.into();
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SimError::invalid("strategy name must not be empty"));
        }
        if id.trim().is_empty() {
            return Err(SimError::invalid(format!("strategy {} has an empty id", name)));
        }
        for (index, rule) in rules.iter().enumerate() {
            rule.validate().map_err(|e| {
                SimError::invalid(format!("strategy {} rule {}: {}", name, index, e))
            })?;
        }

        let disposition = derive_disposition(&rules);
        Ok(Self {
            id,
            name,
            rules: Arc::new(rules),
            disposition,
        })
    }

    pub fn is_cooperative(&self) -> bool {
        self.disposition.is_cooperative()
    }
}

fn derive_disposition(rules: &[Rule]) -> Disposition {
    match rules.first() {
        Some(rule) if rule.action.leans_cooperative() => Disposition::Cooperative,
        _ => Disposition::Defecting,
    }
}

/// One player instance: a clone of a template with its own id and disposition.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub strategy: Arc<Strategy>,
    pub disposition: Disposition,
}

impl Agent {
    pub fn new(id: AgentId, strategy: Arc<Strategy>) -> Self {
        let disposition = strategy.disposition;
        Self {
            id,
            strategy,
            disposition,
        }
    }

    /// The `index`-th clone of `strategy`, id `<template id>_<index>`.
    pub fn spawn(strategy: &Arc<Strategy>, index: usize) -> Self {
        Self::new(AgentId::clone_of(&strategy.id, index), Arc::clone(strategy))
    }

    /// An agent that uses the template's own id.
    pub fn from_template(strategy: &Arc<Strategy>) -> Self {
        Self::new(AgentId::new(strategy.id.clone()), Arc::clone(strategy))
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy.name
    }

    pub fn flip_disposition(&mut self) {
        self.disposition = self.disposition.flipped();
    }
}

/// User-supplied strategy data, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyDefinition {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub rules: Vec<Rule>,
}

impl StrategyDefinition {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            id: None,
            name: name.into(),
            rules,
        }
    }

    pub fn into_strategy(self) -> Result<Strategy> {
        let id = match self.id {
            Some(id) => id,
            None => slugify(&self.name),
        };
        Strategy::new(id, self.name, self.rules)
    }
}

/// "Generous Tit-for-Tat" -> "generous-tit-for-tat"
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Source of strategy templates.
pub trait StrategyLookup: Send + Sync {
    /// Find a strategy by id or by name.
    fn strategy(&self, id_or_name: &str) -> Result<Arc<Strategy>>;

    /// All strategies in catalog order.
    fn catalog(&self) -> Vec<Arc<Strategy>>;
}

/// In-memory strategy repository. Adding a strategy whose name already exists replaces it.
#[derive(Debug, Clone, Default)]
pub struct StrategyCatalog {
    strategies: Vec<Arc<Strategy>>,
}

impl StrategyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with [`default_strategies`].
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for strategy in default_strategies() {
            catalog.insert(strategy);
        }
        catalog
    }

    pub fn add(&mut self, definition: StrategyDefinition) -> Result<Arc<Strategy>> {
        let strategy = definition.into_strategy()?;
        Ok(self.insert(strategy))
    }

    pub fn insert(&mut self, strategy: Strategy) -> Arc<Strategy> {
        let strategy = Arc::new(strategy);
        match self.strategies.iter_mut().find(|s| s.name == strategy.name) {
            Some(existing) => *existing = Arc::clone(&strategy),
            None => self.strategies.push(Arc::clone(&strategy)),
        }
        strategy
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl StrategyLookup for StrategyCatalog {
    fn strategy(&self, id_or_name: &str) -> Result<Arc<Strategy>> {
        self.strategies
            .iter()
            .find(|s| s.id == id_or_name)
            .or_else(|| self.strategies.iter().find(|s| s.name == id_or_name))
            .or_else(|| {
                self.strategies
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(id_or_name))
            })
            .cloned()
            .ok_or_else(|| SimError::StrategyNotFound(id_or_name.to_string()))
    }

    fn catalog(&self) -> Vec<Arc<Strategy>> {
        self.strategies.clone()
    }
}

fn opponent_last(value: Move) -> Condition {
    Condition::OpponentLastAction { value }
}

fn own_last(value: Move) -> Condition {
    Condition::OwnLastAction { value }
}

fn builtin(name: &str, rules: Vec<Rule>) -> Strategy {
    Strategy {
        id: slugify(name),
        name: name.to_string(),
        disposition: derive_disposition(&rules),
        rules: Arc::new(rules),
    }
}

/// The built-in strategy set.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        builtin(
            "Tit-for-Tat",
            vec![
                Rule::when(opponent_last(Move::Cooperate), Action::Cooperate),
                Rule::when(opponent_last(Move::Defect), Action::Defect),
                Rule::always(Action::Cooperate),
            ],
        ),
        builtin(
            "Generous Tit-for-Tat",
            vec![
                Rule::when(opponent_last(Move::Cooperate), Action::Cooperate),
                Rule::when(
                    opponent_last(Move::Defect),
                    Action::Random { probability: 0.7 },
                ),
                Rule::always(Action::Cooperate),
            ],
        ),
        builtin(
            "Pavlov",
            vec![
                Rule::new(
                    vec![own_last(Move::Cooperate), opponent_last(Move::Cooperate)],
                    Action::Cooperate,
                ),
                Rule::new(
                    vec![own_last(Move::Defect), opponent_last(Move::Defect)],
                    Action::Cooperate,
                ),
                Rule::always(Action::Defect),
            ],
        ),
        builtin(
            "Gradual",
            vec![
                Rule::when(
                    Condition::OpponentActionCount {
                        value: Move::Defect,
                        count: 1,
                    },
                    Action::Defect,
                ),
                Rule::when(Condition::IsNthMove { interval: 2 }, Action::Cooperate),
                Rule::always(Action::Cooperate),
            ],
        ),
        builtin(
            "Forgiver",
            vec![
                Rule::when(
                    Condition::ConsecutiveActions {
                        who: Subject::Opponent,
                        value: Move::Cooperate,
                        count: 2,
                    },
                    Action::Cooperate,
                ),
                Rule::when(opponent_last(Move::Defect), Action::Defect),
                Rule::always(Action::Cooperate),
            ],
        ),
        builtin("Always Defect", vec![Rule::always(Action::Defect)]),
        builtin(
            "Suspicious Tit-for-Tat",
            vec![
                Rule::when(opponent_last(Move::Cooperate), Action::Cooperate),
                Rule::when(opponent_last(Move::Defect), Action::Defect),
                Rule::always(Action::Defect),
            ],
        ),
        builtin(
            "Random",
            vec![Rule::always(Action::Random { probability: 0.5 })],
        ),
        builtin(
            "Grudger",
            vec![
                Rule::when(
                    Condition::OpponentActionCount {
                        value: Move::Defect,
                        count: 1,
                    },
                    Action::Defect,
                ),
                Rule::always(Action::Cooperate),
            ],
        ),
        builtin(
            "Alternate",
            vec![
                Rule::when(Condition::IsNthMove { interval: 2 }, Action::Cooperate),
                Rule::always(Action::Defect),
            ],
        ),
    ]
}
