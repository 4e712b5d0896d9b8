//! Command-line interface for the dilemma simulator.

use crate::error::{Result, SimError};
use crate::scenario::{RunConfig, Scenario, create_standard_scenarios};
use crate::strategies::StrategyDefinition;
use lexopt::prelude::*;
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Command-line arguments for the simulation.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub command: Command,
    pub environment: Option<String>,
    pub strategies: Vec<String>,
    pub strategy_files: Vec<PathBuf>,
    pub scenario_name: Option<String>,
    pub scenario_file: Option<PathBuf>,
    pub rounds: Option<usize>,
    pub games: Option<usize>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub population: Option<usize>,
    pub years: Option<usize>,
    pub random_seed: Option<u64>,
    pub verbose: bool,
    pub quiet: bool,
    pub output_file: Option<PathBuf>,
    pub events_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Match,
    Tournament,
    World,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Match => "match",
            RunKind::Tournament => "tournament",
            RunKind::World => "world",
        }
    }

    /// Built-in scenario used when no scenario is named.
    fn default_scenario(&self) -> &'static str {
        match self {
            RunKind::Match => "duel",
            RunKind::Tournament => "tournament",
            RunKind::World => "world",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `None` when no subcommand was given; the scenario decides what runs.
    Run { kind: Option<RunKind> },
    Batch { config: PathBuf },
    Strategies,
    Environments,
}

impl Default for Command {
    fn default() -> Self {
        Command::Run { kind: None }
    }
}

pub fn parse_args() -> std::result::Result<CliArgs, lexopt::Error> {
    parse_from(lexopt::Parser::from_env())
}

pub fn parse_from(mut args: lexopt::Parser) -> std::result::Result<CliArgs, lexopt::Error> {
    let mut cli_args = CliArgs::default();
    let mut subcommand = None;
    let mut batch_config = None;

    while let Some(arg) = args.next()? {
        match arg {
            Value(val) => {
                let val_str = val.string()?;
                if subcommand.is_none() {
                    subcommand = Some(val_str);
                } else if subcommand.as_deref() == Some("batch") && batch_config.is_none() {
                    batch_config = Some(PathBuf::from(val_str));
                } else {
                    return Err(lexopt::Error::from(format!(
                        "unexpected argument: {}",
                        val_str
                    )));
                }
            }
            Long("env") => cli_args.environment = Some(args.value()?.string()?),
            Long("strategy") | Short('s') => cli_args.strategies.push(args.value()?.string()?),
            Long("strategy-file") => {
                cli_args
                    .strategy_files
                    .push(PathBuf::from(args.value()?.string()?));
            }
            Long("scenario") => cli_args.scenario_name = Some(args.value()?.string()?),
            Long("scenario-file") => {
                cli_args.scenario_file = Some(PathBuf::from(args.value()?.string()?));
            }
            Long("rounds") | Short('r') => cli_args.rounds = Some(args.value()?.parse()?),
            Long("games") | Short('g') => cli_args.games = Some(args.value()?.parse()?),
            Long("width") => cli_args.width = Some(args.value()?.parse()?),
            Long("height") => cli_args.height = Some(args.value()?.parse()?),
            Long("population") | Short('p') => cli_args.population = Some(args.value()?.parse()?),
            Long("years") | Short('y') => cli_args.years = Some(args.value()?.parse()?),
            Long("seed") => cli_args.random_seed = Some(args.value()?.parse()?),
            Long("output") | Short('o') => {
                cli_args.output_file = Some(PathBuf::from(args.value()?.string()?));
            }
            Long("events") => cli_args.events_file = Some(PathBuf::from(args.value()?.string()?)),
            Long("verbose") | Short('v') => cli_args.verbose = true,
            Long("quiet") | Short('q') => cli_args.quiet = true,
            Long("help") | Short('h') => {
                print_help();
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    cli_args.command = match subcommand.as_deref() {
        Some("match") => Command::Run {
            kind: Some(RunKind::Match),
        },
        Some("tournament") => Command::Run {
            kind: Some(RunKind::Tournament),
        },
        Some("world") => Command::Run {
            kind: Some(RunKind::World),
        },
        Some("run") | None => Command::Run { kind: None },
        Some("batch") => match batch_config {
            Some(config) => Command::Batch { config },
            None => {
                return Err(lexopt::Error::from(
                    "batch command requires a configuration file",
                ));
            }
        },
        Some("strategies") => Command::Strategies,
        Some("environments") => Command::Environments,
        Some(cmd) => return Err(lexopt::Error::from(format!("unknown command: {}", cmd))),
    };

    Ok(cli_args)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<StrategyDefinition>),
    One(StrategyDefinition),
}

/// Strategy definitions from a JSON or YAML file holding one definition or a list.
pub fn load_strategy_file(path: &Path) -> Result<Vec<StrategyDefinition>> {
    let contents = std::fs::read_to_string(path)?;
    let file: DefinitionFile = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
        _ => serde_json::from_str(&contents)?,
    };
    Ok(match file {
        DefinitionFile::Many(definitions) => definitions,
        DefinitionFile::One(definition) => vec![definition],
    })
}

/// Scenario named by the arguments, before overrides.
pub fn resolve_scenario(args: &CliArgs) -> Result<Scenario> {
    let kind = match args.command {
        Command::Run { kind } => kind,
        _ => None,
    };

    let scenario = if let Some(file) = &args.scenario_file {
        Scenario::load_from_file(file)?
    } else {
        let name = args
            .scenario_name
            .as_deref()
            .unwrap_or_else(|| kind.unwrap_or(RunKind::World).default_scenario());
        let mut scenarios = create_standard_scenarios();
        match scenarios.remove(name) {
            Some(scenario) => scenario,
            None => {
                let mut available: Vec<String> = scenarios.into_keys().collect();
                available.sort();
                return Err(SimError::invalid(format!(
                    "unknown scenario: {} (available: {})",
                    name,
                    available.join(", ")
                )));
            }
        }
    };

    if let Some(kind) = kind {
        if scenario.run.kind() != kind.as_str() {
            return Err(SimError::invalid(format!(
                "scenario {} runs a {}, not a {}",
                scenario.name,
                scenario.run.kind(),
                kind.as_str()
            )));
        }
    }

    Ok(scenario)
}

/// Apply CLI overrides to a scenario's parameters.
pub fn apply_overrides(scenario: &mut Scenario, args: &CliArgs) -> Result<()> {
    if let Some(env) = &args.environment {
        scenario.environment = env.clone();
    }

    if let Some(seed) = args.random_seed {
        scenario.random_seed = Some(seed);
    }

    for path in &args.strategy_files {
        scenario.strategies.extend(load_strategy_file(path)?);
    }

    match &mut scenario.run {
        RunConfig::Match { strategies, rounds } => {
            if !args.strategies.is_empty() {
                *strategies = args.strategies.clone();
            }
            if let Some(r) = args.rounds {
                *rounds = r;
            }
        }
        RunConfig::Tournament {
            strategies,
            games_per_match,
            rounds_per_game,
        } => {
            if !args.strategies.is_empty() {
                *strategies = args.strategies.clone();
            }
            if let Some(g) = args.games {
                *games_per_match = g;
            }
            if let Some(r) = args.rounds {
                *rounds_per_game = r;
            }
        }
        RunConfig::World {
            width,
            height,
            population_size,
            years,
            games_per_match,
            rounds_per_game,
        } => {
            if !args.strategies.is_empty() {
                warn!("--strategy is ignored for world runs; the population uses the whole catalog");
            }
            if let Some(w) = args.width {
                *width = w;
            }
            if let Some(h) = args.height {
                *height = h;
            }
            if let Some(p) = args.population {
                *population_size = p;
            }
            if let Some(y) = args.years {
                *years = y;
            }
            if let Some(g) = args.games {
                *games_per_match = g;
            }
            if let Some(r) = args.rounds {
                *rounds_per_game = r;
            }
        }
    }

    Ok(())
}

pub fn print_help() {
    println!("\nIterated Prisoner's Dilemma Simulator\n");
    println!("USAGE:");
    println!("    dilemma-sim [COMMAND] [OPTIONS]\n");

    println!("COMMANDS:");
    println!("    world            Evolve a grid of agents over several years (default)");
    println!("    match            Play a single match between two strategies");
    println!("    tournament       Round-robin tournament over many strategies");
    println!("    batch CONFIG     Run batch experiments from YAML config");
    println!("    strategies       List available strategies");
    println!("    environments     List available environments\n");

    println!("SIMULATION OPTIONS:");
    println!("    --env <ID>                 Environment: balanced, hostile, friendly");
    println!("    -s, --strategy <NAME>      Strategy id or name (can be used multiple times)");
    println!("    --strategy-file <FILE>     Add custom strategies from JSON or YAML");
    println!("    --scenario <NAME>          Use a built-in scenario: duel, tournament,");
    println!("                               world, hostile");
    println!("    --scenario-file <FILE>     Load scenario from JSON or YAML file");
    println!("    -r, --rounds <N>           Rounds per game");
    println!("    -g, --games <N>            Games per pairing");
    println!("    --width <N>                World width");
    println!("    --height <N>               World height");
    println!("    -p, --population <N>       Number of agents placed in the world");
    println!("    -y, --years <N>            Generations to evolve");
    println!("    --seed <N>                 Random seed for reproducible runs\n");

    println!("OUTPUT OPTIONS:");
    println!("    -o, --output <FILE>        Write the report as JSON");
    println!("    --events <FILE>            Write world events as JSON");
    println!("    -v, --verbose              Enable debug logging");
    println!("    -q, --quiet                Suppress non-essential output");
    println!("    -h, --help                 Print help information\n");

    println!("EXAMPLES:");
    println!("    # Tit-for-Tat against Always Defect for 20 rounds");
    println!("    dilemma-sim match -s tit-for-tat -s always-defect -r 20\n");

    println!("    # Reproducible tournament among three strategies");
    println!("    dilemma-sim tournament -s Pavlov -s Grudger -s Random --seed 7\n");

    println!("    # Hostile world for 50 years, events exported");
    println!("    dilemma-sim world --scenario hostile -y 50 --events events.json");
}
