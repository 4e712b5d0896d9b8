use std::process;

use dilemma_world::cli::{self, CliArgs, Command};
use dilemma_world::environment::{EnvironmentCatalog, EnvironmentLookup};
use dilemma_world::experiment::ExperimentBatch;
use dilemma_world::metrics::MetricsCalculator;
use dilemma_world::scenario::ScenarioOutcome;
use dilemma_world::simulation::{MatchReport, TournamentReport, WorldReport};
use dilemma_world::strategies::{StrategyCatalog, StrategyLookup};
use dilemma_world::{EventLogger, Result};
use log::{LevelFilter, info, warn};

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run with --help for usage");
            process::exit(1);
        }
    };

    init_logging(&args);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(args: &CliArgs) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if args.quiet {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.format_timestamp(None).init();
}

fn run(args: &CliArgs) -> Result<()> {
    match &args.command {
        Command::Strategies => list_strategies(args),
        Command::Environments => {
            list_environments();
            Ok(())
        }
        Command::Batch { config } => run_batch(config, args),
        Command::Run { .. } => run_scenario(args),
    }
}

fn list_strategies(args: &CliArgs) -> Result<()> {
    let mut catalog = StrategyCatalog::with_defaults();
    for path in &args.strategy_files {
        for definition in cli::load_strategy_file(path)? {
            catalog.add(definition)?;
        }
    }

    println!("{:<22} {:<20} {:<12} {}", "ID", "NAME", "DISPOSITION", "RULES");
    for strategy in catalog.catalog() {
        println!(
            "{:<22} {:<20} {:<12} {}",
            strategy.id,
            strategy.name,
            strategy.disposition,
            strategy.rules.len()
        );
    }
    Ok(())
}

fn list_environments() {
    println!(
        "{:<10} {:<16} {:>12} {:>9}  {}",
        "ID", "NAME", "COOPERATION", "MUTATION", "DESCRIPTION"
    );
    for env in EnvironmentCatalog::with_defaults().environments() {
        println!(
            "{:<10} {:<16} {:>12.2} {:>9.2}  {}",
            env.id, env.name, env.cooperation_probability, env.mutation_rate, env.description
        );
    }
}

fn run_batch(config: &std::path::Path, args: &CliArgs) -> Result<()> {
    let batch = ExperimentBatch::load_from_file(config)?;
    if !args.quiet {
        println!("Batch: {}", batch.name);
        if !batch.description.is_empty() {
            println!("{}", batch.description);
        }
    }

    let results = batch.run();
    let succeeded = results.iter().filter(|r| r.success).count();

    for result in &results {
        match (&result.summary, &result.error) {
            (Some(summary), _) => println!(
                "  {} #{}: {} leader={} cooperation={:.1}% ({} ms)",
                result.name,
                result.run,
                summary.kind,
                summary.leader.as_deref().unwrap_or("-"),
                summary.mean_cooperation_rate * 100.0,
                result.duration_ms
            ),
            (None, Some(error)) => println!("  {} #{}: FAILED {}", result.name, result.run, error),
            (None, None) => println!("  {} #{}: no result", result.name, result.run),
        }
    }
    println!("\n{}/{} runs succeeded", succeeded, results.len());

    if let Some(output) = &args.output_file {
        std::fs::write(output, serde_json::to_string_pretty(&results)?)?;
        println!("Results saved to {}", output.display());
    }
    Ok(())
}

fn run_scenario(args: &CliArgs) -> Result<()> {
    let mut scenario = cli::resolve_scenario(args)?;
    cli::apply_overrides(&mut scenario, args)?;
    if !args.quiet {
        println!("{}", scenario);
    }

    let outcome = scenario.run()?;
    match &outcome {
        ScenarioOutcome::Match(report) => print_match(report),
        ScenarioOutcome::Tournament(report) => print_tournament(report),
        ScenarioOutcome::World(report) => print_world(report, args.quiet),
    }

    if let Some(output) = &args.output_file {
        std::fs::write(output, serde_json::to_string_pretty(&outcome)?)?;
        info!("report saved to {}", output.display());
    }

    if let Some(path) = &args.events_file {
        let logger = match &outcome {
            ScenarioOutcome::World(report) => EventLogger::from_events(report.events.clone()),
            _ => {
                warn!("--events only applies to world runs");
                EventLogger::new()
            }
        };
        logger.save_to_file(path)?;
        info!("events saved to {}", path.display());
    }

    Ok(())
}

fn print_match(report: &MatchReport) {
    println!("Match in {} over {} rounds:", report.environment, report.rounds);
    for result in &report.results {
        println!("  {}", result);
    }
    if let [a, b] = report.results.as_slice() {
        if a.score == b.score {
            println!("Draw");
        } else {
            let winner = if a.score > b.score { a } else { b };
            println!("Winner: {}", winner.strategy);
        }
    }
}

fn print_tournament(report: &TournamentReport) {
    println!(
        "Tournament in {}: {} games per match, {} rounds per game\n",
        report.environment, report.games_per_match, report.rounds_per_game
    );
    println!(
        "{:<4} {:<20} {:>9} {:>6} {:>5} {:>5} {:>5} {:>8}",
        "#", "STRATEGY", "AVG", "GAMES", "W", "L", "D", "COOP"
    );
    for (rank, r) in report.results.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:>9.2} {:>6} {:>5} {:>5} {:>5} {:>7.1}%",
            rank + 1,
            r.name,
            r.average_score,
            r.total_games,
            r.wins,
            r.losses,
            r.draws,
            r.average_cooperation_rate * 100.0
        );
    }
    println!(
        "\n{}",
        MetricsCalculator::calculate_tournament_metrics(&report.results)
    );
}

fn print_world(report: &WorldReport, quiet: bool) {
    if !quiet {
        for generation in &report.yearly_stats {
            println!(
                "Year {:>3}: {} cooperative, {} defecting, {} flips",
                generation.generation,
                generation.cooperative,
                generation.defecting,
                generation.flips
            );
        }
    }

    let stats = &report.final_stats;
    println!(
        "\n{} world {}x{} with {} agents",
        report.environment, report.world_size.width, report.world_size.height, report.population_size
    );
    println!(
        "Dominant: {} at {:.1}% ({} cooperative, {} defecting)",
        stats.dominant_disposition, stats.dominant_percentage, stats.cooperative, stats.defecting
    );
    println!(
        "\n{}",
        MetricsCalculator::calculate_world_metrics(
            &report.initial_stats,
            &report.yearly_stats,
            &report.final_stats
        )
    );
}
