use serde::{Deserialize, Serialize};
use std::fmt;

/// A single move in one round of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Cooperate,
    Defect,
}

impl Move {
    /// Get the string identifier used in rule data
    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Cooperate => "cooperate",
            Move::Defect => "defect",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Move> {
        match s {
            "cooperate" => Some(Move::Cooperate),
            "defect" => Some(Move::Defect),
            _ => None,
        }
    }

    pub fn is_cooperate(&self) -> bool {
        matches!(self, Move::Cooperate)
    }

    /// Short form used in history strings ("C" / "D").
    pub fn symbol(&self) -> char {
        match self {
            Move::Cooperate => 'C',
            Move::Defect => 'D',
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary trait of a strategy: cooperative-leaning ("good") or defecting-leaning ("bad").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Cooperative,
    Defecting,
}

impl Disposition {
    pub fn flipped(self) -> Self {
        match self {
            Disposition::Cooperative => Disposition::Defecting,
            Disposition::Defecting => Disposition::Cooperative,
        }
    }

    pub fn is_cooperative(&self) -> bool {
        matches!(self, Disposition::Cooperative)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Cooperative => "cooperative",
            Disposition::Defecting => "defecting",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whose history a condition inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Own,
    #[default]
    Opponent,
}

/// Unique identifier for an agent instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the `index`-th clone of a template.
    pub fn clone_of(template_id: &str, index: usize) -> Self {
        Self(format!("{}_{}", template_id, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a history as a compact "CDDC" string.
pub fn history_string(history: &[Move]) -> String {
    history.iter().map(Move::symbol).collect()
}
