pub mod cli;
pub mod engine;
pub mod environment;
pub mod error;
pub mod events;
pub mod experiment;
pub mod game;
pub mod metrics;
pub mod rules;
pub mod scenario;
pub mod simulation;
pub mod strategies;
pub mod tournament;
pub mod types;
pub mod world;

pub use engine::{MatchState, RuleEngine};
pub use error::{Result, SimError};
pub use events::{Event, EventLogger, EventType};
pub use game::{AgentResult, MatchOutcome, MatchSimulator, PayoffMatrix};
pub use simulation::Simulator;
pub use strategies::{Agent, Strategy, StrategyCatalog, StrategyLookup};
pub use tournament::{AggregatedResult, Standings, TournamentAggregator};
pub use types::{AgentId, Disposition, Move};
pub use world::{EvolvingWorld, World, WorldSize};

#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod scenario_test;
#[cfg(test)]
mod world_test;
