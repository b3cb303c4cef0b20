//! WastelandSim - headless combat scenario runner

use std::process::ExitCode;

use wastelandsim::cli;
use wastelandsim::headless::{run_headless_scenario, ScenarioConfig, ScenarioResult};

fn main() -> ExitCode {
    let args = cli::parse_args();

    let mut config = match ScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid scenario {}: {}", args.scenario.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }

    match run_headless_scenario(config, true) {
        Ok(result) => {
            if args.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Failed to serialize result: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_summary(&result);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Scenario failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_summary(result: &ScenarioResult) {
    println!("Outcome: {:?} after {:.1}s", result.outcome, result.elapsed);
    if let Some(player) = &result.player {
        println!(
            "Player ({:?}): {:.0}/{:.0} HP",
            player.archetype, player.health, player.max_health
        );
    }
    println!(
        "Enemies defeated: {}/{}",
        result.enemies_defeated, result.enemies_spawned
    );
    println!(
        "Damage dealt: {}, taken: {}",
        result.damage_dealt, result.damage_taken
    );
    println!("Currency earned: {}", result.rewards.currency);
    let mut items: Vec<_> = result.rewards.items.iter().collect();
    items.sort();
    for (item, quantity) in items {
        println!("  {} x{}", item, quantity);
    }
    if let Some(seed) = result.random_seed {
        println!("Seed: {}", seed);
    }
    if let Some(path) = &result.log_path {
        println!("Log saved to: {}", path);
    }
}
