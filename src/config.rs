use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;

use crate::algorithm::{CandidateScoring, PriorityKind};

#[derive(Parser, Debug, Default)]
#[command(
    name = "Rust PIBT",
    about = "Priority Inheritance with Backtracking for multi-agent path finding.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file")]
    pub map_path: Option<String>,

    #[arg(long, help = "Path to the scenario file")]
    pub scen_path: Option<String>,

    #[arg(long, help = "Path to a YAML agent list, used instead of the scenario")]
    pub agents_yaml: Option<String>,

    #[arg(long, help = "Path to write the solution paths as YAML")]
    pub output_path: Option<String>,

    #[arg(long, help = "Number of agents")]
    pub num_agents: Option<usize>,

    #[arg(long, help = "Draw agents randomly from the scenario instead of in order")]
    pub random_agents: bool,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, value_enum, help = "Priority policy")]
    pub priority: Option<PriorityKind>,

    #[arg(long, value_enum, help = "Candidate ordering inside a negotiation")]
    pub candidate_scoring: Option<CandidateScoring>,

    #[arg(long, help = "Give up after this many timesteps")]
    pub max_timestep: Option<usize>,

    #[arg(long, help = "Wall-clock budget in milliseconds")]
    pub time_limit_ms: Option<u64>,

    #[arg(long, help = "Repair rounds per timestep, 0 disables repair")]
    pub repair_rounds: Option<usize>,

    #[arg(long, help = "Timesteps a boss keeps its promotion")]
    pub boss_window: Option<usize>,

    #[arg(
        long,
        help = "Disable initialization of priorities using distance from starts to goals"
    )]
    pub disable_dist_init: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map_path: String,
    pub scen_path: String,
    pub agents_yaml: Option<String>,
    pub output_path: Option<String>,
    pub num_agents: usize,
    pub random_agents: bool,
    pub seed: u64,
    pub priority: PriorityKind,
    pub candidate_scoring: CandidateScoring,
    pub max_timestep: usize,
    pub time_limit_ms: Option<u64>,
    pub repair_rounds: usize,
    pub boss_window: usize,
    pub disable_dist_init: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: "map_file/random-32-32-20/random-32-32-20.map".to_string(),
            scen_path: "map_file/random-32-32-20/random-32-32-20-random-1.scen".to_string(),
            agents_yaml: None,
            output_path: None,
            num_agents: 10,
            random_agents: false,
            seed: 0,
            priority: PriorityKind::LocalPotential,
            candidate_scoring: CandidateScoring::Distance,
            max_timestep: 1000,
            time_limit_ms: None,
            repair_rounds: 100,
            boss_window: 10,
            disable_dist_init: false,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).context("invalid YAML config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = map_path.clone();
        }
        if let Some(scen_path) = &cli.scen_path {
            self.scen_path = scen_path.clone();
        }
        if let Some(agents_yaml) = &cli.agents_yaml {
            self.agents_yaml = Some(agents_yaml.clone());
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(num_agents) = cli.num_agents {
            self.num_agents = num_agents;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(priority) = cli.priority {
            self.priority = priority;
        }
        if let Some(candidate_scoring) = cli.candidate_scoring {
            self.candidate_scoring = candidate_scoring;
        }
        if let Some(max_timestep) = cli.max_timestep {
            self.max_timestep = max_timestep;
        }
        if let Some(time_limit_ms) = cli.time_limit_ms {
            self.time_limit_ms = Some(time_limit_ms);
        }
        if let Some(repair_rounds) = cli.repair_rounds {
            self.repair_rounds = repair_rounds;
        }
        if let Some(boss_window) = cli.boss_window {
            self.boss_window = boss_window;
        }
        self.random_agents |= cli.random_agents;
        self.disable_dist_init |= cli.disable_dist_init;

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.num_agents == 0 {
            return Err(anyhow!("Number of agents must be positive"));
        }
        if self.max_timestep == 0 {
            return Err(anyhow!("Max timestep must be positive"));
        }
        if self.boss_window == 0 {
            return Err(anyhow!("Boss window must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml_str("num_agents: 40\npriority: boss\n").unwrap();
        assert_eq!(config.num_agents, 40);
        assert_eq!(config.priority, PriorityKind::Boss);
        assert_eq!(config.repair_rounds, 100);
        assert_eq!(config.candidate_scoring, CandidateScoring::Distance);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::from_yaml_str("num_agent: 40\n").is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_yaml_str("max_timestep: 0\n").is_err());
        assert!(Config::from_yaml_str("boss_window: 0\n").is_err());
    }

    #[test]
    fn test_command_line_overrides_file() {
        let cli = Cli::parse_from([
            "pibt",
            "--seed",
            "7",
            "--priority",
            "flexibility",
            "--candidate-scoring",
            "flexibility",
            "--disable-dist-init",
        ]);
        let config = Config::from_yaml_str("seed: 3\nrepair_rounds: 5\n")
            .unwrap()
            .override_from_command_line(&cli)
            .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.repair_rounds, 5);
        assert_eq!(config.priority, PriorityKind::Flexibility);
        assert_eq!(config.candidate_scoring, CandidateScoring::Flexibility);
        assert!(config.disable_dist_init);
    }
}
