use anyhow::{anyhow, Context, Result};
use rand::prelude::*;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use tracing::info;

use crate::common::{Agent, Path};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Route {
    pub start_x: usize,
    pub start_y: usize,
    pub goal_x: usize,
    pub goal_y: usize,
}

#[derive(Debug)]
pub struct Scenario {
    pub map: String,
    pub map_width: usize,
    pub map_height: usize,
    pub routes: Vec<Route>,
}

impl Scenario {
    pub fn load_from_scen(path: &str) -> Result<Scenario> {
        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read scenario {path}"))?;
        Self::parse(&content).with_context(|| format!("malformed scenario {path}"))
    }

    /// Parses the MovingAI `.scen` format; the first line is `version x`.
    pub fn parse(content: &str) -> Result<Scenario> {
        let mut lines = content.lines();
        let _version = lines.next().ok_or_else(|| anyhow!("empty scenario"))?;

        let mut scenario = Scenario {
            map: String::new(),
            map_width: 0,
            map_height: 0,
            routes: Vec::new(),
        };

        for (line_number, line) in lines.enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() < 8 {
                return Err(anyhow!("line {} has {} fields", line_number + 2, parts.len()));
            }
            let field = |index: usize| -> Result<usize> {
                parts[index]
                    .parse()
                    .with_context(|| format!("line {}: field {index}", line_number + 2))
            };

            // Scenario columns are x (column) before y (row).
            let route = Route {
                start_x: field(5)?,
                start_y: field(4)?,
                goal_x: field(7)?,
                goal_y: field(6)?,
            };

            if scenario.map.is_empty() {
                scenario.map = parts[1].to_string();
                scenario.map_width = field(2)?;
                scenario.map_height = field(3)?;
            }
            scenario.routes.push(route);
        }

        Ok(scenario)
    }

    /// The first `num_agents` routes, in file order.
    pub fn agents_in_order(&self, num_agents: usize) -> Result<Vec<Agent>> {
        if self.routes.len() < num_agents {
            return Err(anyhow!(
                "scenario has {} routes, {num_agents} agents requested",
                self.routes.len()
            ));
        }
        Ok(self
            .routes
            .iter()
            .take(num_agents)
            .enumerate()
            .map(|(id, route)| route.to_agent(id))
            .collect())
    }

    pub fn generate_agents_randomly<R: Rng + ?Sized>(
        &self,
        num_agents: usize,
        rng: &mut R,
    ) -> Result<Vec<Agent>> {
        let mut available_routes = self.routes.clone();
        available_routes.sort();
        available_routes.dedup();

        if available_routes.len() < num_agents {
            return Err(anyhow!(
                "Not enough unique routes available to match the number of agents"
            ));
        }

        // Shuffle the available routes to randomize the route selection
        available_routes.shuffle(rng);

        let agents: Vec<Agent> = available_routes
            .iter()
            .take(num_agents)
            .enumerate()
            .map(|(id, route)| route.to_agent(id))
            .collect();

        info!("Generate scen: {agents:?}");
        Ok(agents)
    }

    pub fn load_agents_from_yaml(path: &str) -> Result<Vec<Agent>> {
        let file = File::open(path).with_context(|| format!("cannot open {path}"))?;
        let reader = BufReader::new(file);
        let agents = serde_yaml::from_reader(reader)?;
        Ok(agents)
    }

    pub fn write_agents_to_yaml(path: &str, agents: &[Agent]) -> Result<()> {
        Self::write_yaml(path, &agents)
    }

    pub fn write_paths_to_yaml(path: &str, paths: &[Path]) -> Result<()> {
        Self::write_yaml(path, &paths)
    }

    fn write_yaml<T: serde::Serialize>(path: &str, value: &T) -> Result<()> {
        let file = File::create(path).with_context(|| format!("cannot create {path}"))?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(value)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }
}

impl Route {
    fn to_agent(&self, id: usize) -> Agent {
        Agent {
            id,
            start: (self.start_x, self.start_y),
            goal: (self.goal_x, self.goal_y),
        }
    }
}
