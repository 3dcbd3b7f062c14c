use std::collections::HashMap;

use super::{AgentId, NodeId};
use crate::map::Map;

/// Shortest-path distances, precomputed once and only queried afterwards.
pub trait DistanceOracle {
    /// Distance from `node` to the goal of `agent`.
    fn distance(&self, agent: AgentId, node: NodeId) -> usize;
}

/// One BFS table per distinct goal.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    tables: Vec<Vec<usize>>,
    agent_table: Vec<usize>,
}

impl DistanceTable {
    pub fn new(map: &Map, goals: &[NodeId]) -> Self {
        let mut tables = Vec::new();
        let mut goal_table: HashMap<NodeId, usize> = HashMap::new();
        let agent_table = goals
            .iter()
            .map(|&goal| {
                *goal_table.entry(goal).or_insert_with(|| {
                    tables.push(map.bfs_distances(goal));
                    tables.len() - 1
                })
            })
            .collect();

        DistanceTable {
            tables,
            agent_table,
        }
    }
}

impl DistanceOracle for DistanceTable {
    fn distance(&self, agent: AgentId, node: NodeId) -> usize {
        self.tables[self.agent_table[agent]][node]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_goal_shares_table() {
        let map = Map::from_grid(&["...", "...", "..."]).unwrap();
        let goal = map.node_at((2, 2)).unwrap();
        let table = DistanceTable::new(&map, &[goal, goal]);

        assert_eq!(table.tables.len(), 1);
        assert_eq!(table.distance(0, map.node_at((0, 0)).unwrap()), 4);
        assert_eq!(table.distance(1, goal), 0);
    }

    #[test]
    fn test_unreachable_nodes() {
        let map = Map::from_grid(&["..@."]).unwrap();
        let table = DistanceTable::new(&map, &[map.node_at((0, 0)).unwrap()]);

        assert_eq!(table.distance(0, map.node_at((0, 1)).unwrap()), 1);
        assert_eq!(table.distance(0, map.node_at((0, 3)).unwrap()), usize::MAX);
    }
}
