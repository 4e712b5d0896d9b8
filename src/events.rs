use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::types::{AgentId, Disposition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub generation: usize,
    pub event_type: EventType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventType {
    TournamentCompleted {
        matches: usize,
        leader: Option<String>,
        leader_average_score: f64,
    },
    DispositionFlipped {
        agent_id: AgentId,
        strategy: String,
        x: usize,
        y: usize,
        from: Disposition,
        to: Disposition,
    },
    GenerationCompleted {
        cooperative: usize,
        defecting: usize,
        mutation_attempts: usize,
        flips: usize,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[gen {}] ", self.generation)?;

        match &self.event_type {
            EventType::TournamentCompleted {
                matches,
                leader,
                leader_average_score,
            } => match leader {
                Some(leader) => write!(
                    f,
                    "Tournament of {} matches won by {} ({:.2} avg)",
                    matches, leader, leader_average_score
                ),
                None => write!(f, "Tournament of {} matches with no entrants", matches),
            },
            EventType::DispositionFlipped {
                agent_id,
                strategy,
                x,
                y,
                from,
                to,
            } => {
                write!(
                    f,
                    "Agent {} ({}) at ({}, {}) flipped {} -> {}",
                    agent_id, strategy, x, y, from, to
                )
            }
            EventType::GenerationCompleted {
                cooperative,
                defecting,
                mutation_attempts,
                flips,
            } => {
                write!(
                    f,
                    "Population - Coop:{} Defect:{} Attempts:{} Flips:{}",
                    cooperative, defecting, mutation_attempts, flips
                )
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EventLogger {
    events: Vec<Event>,
}

impl EventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger over events recorded elsewhere, timestamps kept.
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn log(&mut self, generation: usize, event_type: EventType) {
        self.events.push(Event {
            timestamp: Utc::now(),
            generation,
            event_type,
        });
    }

    pub fn get_events(&self) -> &[Event] {
        &self.events
    }

    pub fn for_generation(&self, generation: usize) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.generation == generation)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.events)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let events: Vec<Event> = serde_json::from_str(&json)?;
        Ok(Self { events })
    }
}
