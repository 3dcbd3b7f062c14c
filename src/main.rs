use mapf_pibt::config::{Cli, Config};
use mapf_pibt::map::Map;
use mapf_pibt::scenario::Scenario;
use mapf_pibt::solver::{Solver, PIBT};

use anyhow::{anyhow, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let map = Map::from_file(&config.map_path)?;
    let agents = if let Some(agents_yaml) = config.agents_yaml.as_ref() {
        Scenario::load_agents_from_yaml(agents_yaml)?
    } else {
        let scenario = Scenario::load_from_scen(&config.scen_path)?;
        if config.random_agents {
            let mut rng = StdRng::seed_from_u64(config.seed);
            scenario.generate_agents_randomly(config.num_agents, &mut rng)?
        } else {
            scenario.agents_in_order(config.num_agents)?
        }
    };

    let mut solver = PIBT::new(agents, &map, &config)?;
    if solver.solve() {
        info!(
            "solved at timestep {}: sum of costs {}, makespan {}",
            solver.timestep(),
            solver.sum_of_costs(),
            solver.makespan()
        );
    } else {
        error!("pibt fails to reach every goal by timestep {}", solver.timestep());
    }

    let solution = solver.solution();
    if !solution.validate(&map, solver.starts(), solver.goals(), solver.succeeded()) {
        return Err(anyhow!("pibt produced an invalid solution"));
    }

    if let Some(output_path) = config.output_path.as_ref() {
        Scenario::write_paths_to_yaml(output_path, &solution.paths(&map))?;
        info!("paths written to {output_path}");
    }

    Ok(())
}
