mod agent;
mod distance;
mod reservation;

pub use agent::AgentState;
pub use distance::{DistanceOracle, DistanceTable};
pub use reservation::ReservationTable;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::map::Map;

pub type NodeId = usize;
pub type AgentId = usize;

/// Node of every agent at one timestep, indexed by agent id.
pub type Configuration = Vec<NodeId>;

pub type Path = Vec<(usize, usize)>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub start: (usize, usize),
    pub goal: (usize, usize),
}

/// Committed configurations, index 0 being the initial placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    configurations: Vec<Configuration>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, configuration: Configuration) {
        self.configurations.push(configuration);
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Number of committed timesteps.
    pub fn makespan(&self) -> usize {
        self.configurations.len().saturating_sub(1)
    }

    /// Per agent, the timestep of its final arrival at the goal; waiting at the
    /// goal afterwards is free.
    pub fn sum_of_costs(&self, goals: &[NodeId]) -> usize {
        let makespan = self.makespan();
        goals
            .iter()
            .enumerate()
            .map(|(agent, &goal)| {
                let mut cost = makespan;
                while cost > 0 && self.configurations[cost - 1][agent] == goal {
                    cost -= 1;
                }
                // Never arrived: charged the whole run.
                if self.configurations[makespan][agent] != goal {
                    makespan
                } else {
                    cost
                }
            })
            .sum()
    }

    pub fn paths(&self, map: &Map) -> Vec<Path> {
        let num_agents = self.configurations.first().map_or(0, |c| c.len());
        (0..num_agents)
            .map(|agent| {
                self.configurations
                    .iter()
                    .map(|configuration| map.position(configuration[agent]))
                    .collect()
            })
            .collect()
    }

    /// Checks the plan against its instance: starts, connectivity, vertex and
    /// swap collisions, and goals when `require_goals` is set.
    pub fn validate(
        &self,
        map: &Map,
        starts: &[NodeId],
        goals: &[NodeId],
        require_goals: bool,
    ) -> bool {
        let Some(first) = self.configurations.first() else {
            debug!("empty solution");
            return false;
        };
        if first.as_slice() != starts {
            debug!("first configuration {first:?} differs from starts {starts:?}");
            return false;
        }

        for (time_step, configuration) in self.configurations.iter().enumerate() {
            if configuration.len() != starts.len() {
                debug!("configuration at {time_step} has wrong size");
                return false;
            }
            let mut occupied = HashSet::new();
            for (agent, &node) in configuration.iter().enumerate() {
                if !occupied.insert(node) {
                    debug!("vertex conflict of agent {agent} at node {node}, time {time_step}");
                    return false;
                }
            }

            if time_step == 0 {
                continue;
            }
            let prev = &self.configurations[time_step - 1];
            for agent in 0..configuration.len() {
                let (from, to) = (prev[agent], configuration[agent]);
                if from != to && !map.neighbors(from).contains(&to) {
                    debug!("agent {agent} jumps from {from} to {to} at time {time_step}");
                    return false;
                }
                for other in (agent + 1)..configuration.len() {
                    if from == configuration[other] && to == prev[other] && from != to {
                        debug!("swap conflict of agents {agent} and {other} at time {time_step}");
                        return false;
                    }
                }
            }
        }

        if require_goals && self.configurations.last().map(|c| c.as_slice()) != Some(goals) {
            debug!("agents do not end on their goals");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Map {
        Map::from_grid(&["..."]).unwrap()
    }

    #[test]
    fn test_sum_of_costs_ignores_waiting_at_goal() {
        let mut solution = Solution::new();
        solution.push(vec![0, 2]);
        solution.push(vec![1, 2]);
        solution.push(vec![2, 1]);
        solution.push(vec![2, 0]);

        assert_eq!(solution.makespan(), 3);
        // Agent 0 arrives at 2, agent 1 leaves its goal at 2 and never returns.
        assert_eq!(solution.sum_of_costs(&[2, 2]), 2 + 3);
        assert_eq!(solution.sum_of_costs(&[2, 0]), 2 + 3);
    }

    #[test]
    fn test_validate_detects_swap() {
        let map = corridor();
        let mut solution = Solution::new();
        solution.push(vec![0, 1]);
        solution.push(vec![1, 0]);
        assert!(!solution.validate(&map, &[0, 1], &[1, 0], true));
    }

    #[test]
    fn test_validate_detects_vertex_conflict_and_jump() {
        let map = corridor();
        let mut solution = Solution::new();
        solution.push(vec![0, 2]);
        solution.push(vec![1, 1]);
        assert!(!solution.validate(&map, &[0, 2], &[1, 1], false));

        let mut jump = Solution::new();
        jump.push(vec![0]);
        jump.push(vec![2]);
        assert!(!jump.validate(&map, &[0], &[2], true));
    }

    #[test]
    fn test_validate_accepts_follow_the_leader() {
        let map = corridor();
        let mut solution = Solution::new();
        solution.push(vec![1, 0]);
        solution.push(vec![2, 1]);
        assert!(solution.validate(&map, &[1, 0], &[2, 1], true));

        let paths = solution.paths(&map);
        assert_eq!(paths[1], vec![(0, 0), (0, 1)]);
    }
}
