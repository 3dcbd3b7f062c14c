use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use std::fs;

use crate::common::NodeId;

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub position: (usize, usize),
    pub neighbors: Vec<NodeId>, // Stores ids of accessible neighbors
}

/// Passable cells of an octile grid, flattened into a graph with dense node ids.
#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub nodes: Vec<Node>,
    index: Vec<Vec<Option<NodeId>>>,
}

impl Map {
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read map file {path}"))?;
        Self::parse(&content).with_context(|| format!("malformed map file {path}"))
    }

    /// Parses the MovingAI format: `type`, `height`, `width`, `map`, then the rows.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines();

        let _type = lines.next().ok_or_else(|| anyhow!("missing type line"))?;
        let height = Self::parse_header(lines.next(), "height")?;
        let width = Self::parse_header(lines.next(), "width")?;
        let _map = lines.next().ok_or_else(|| anyhow!("missing map line"))?;

        let rows: Vec<&str> = lines.take(height).collect();
        if rows.len() != height {
            return Err(anyhow!("expected {height} rows, found {}", rows.len()));
        }
        Self::from_rows(&rows, width)
    }

    /// Builds a map straight from grid rows, e.g. `["...", "@.@"]`.
    pub fn from_grid(rows: &[&str]) -> Result<Self> {
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        Self::from_rows(rows, width)
    }

    fn parse_header(line: Option<&str>, key: &str) -> Result<usize> {
        let line = line.ok_or_else(|| anyhow!("missing {key} line"))?;
        line.split_whitespace()
            .last()
            .ok_or_else(|| anyhow!("empty {key} line"))?
            .parse::<usize>()
            .with_context(|| format!("invalid {key}: {line:?}"))
    }

    fn from_rows(rows: &[&str], width: usize) -> Result<Self> {
        let height = rows.len();
        let mut index = vec![vec![None; width]; height];
        let mut nodes = Vec::new();

        for (x, row) in rows.iter().enumerate() {
            let row: Vec<char> = row.chars().collect();
            if row.len() < width {
                return Err(anyhow!("row {x} has {} cells, expected {width}", row.len()));
            }
            for (y, &ch) in row.iter().take(width).enumerate() {
                if ch == '.' {
                    let id = nodes.len();
                    index[x][y] = Some(id);
                    nodes.push(Node {
                        id,
                        position: (x, y),
                        neighbors: Vec::new(),
                    });
                }
            }
        }

        let mut map = Map {
            height,
            width,
            nodes,
            index,
        };
        map.initialize_neighbors();
        Ok(map)
    }

    fn initialize_neighbors(&mut self) {
        let directions = [(-1, 0), (1, 0), (0, -1), (0, 1)]; // Up, down, left, right
        for id in 0..self.nodes.len() {
            let (x, y) = self.nodes[id].position;
            let mut neighbors = Vec::with_capacity(4);
            for &(dx, dy) in &directions {
                let new_x = x as i64 + dx;
                let new_y = y as i64 + dy;
                if new_x < 0 || new_y < 0 {
                    continue;
                }
                if let Some(neighbor) = self.node_at((new_x as usize, new_y as usize)) {
                    neighbors.push(neighbor);
                }
            }
            self.nodes[id].neighbors = neighbors;
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].neighbors
    }

    pub fn position(&self, node: NodeId) -> (usize, usize) {
        self.nodes[node].position
    }

    /// Node id of a passable cell, `None` for blocked or out-of-bounds cells.
    pub fn node_at(&self, position: (usize, usize)) -> Option<NodeId> {
        self.index
            .get(position.0)
            .and_then(|row| row.get(position.1))
            .copied()
            .flatten()
    }

    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        self.node_at((x, y)).is_some()
    }

    /// Unit-cost BFS from `source`; unreachable nodes keep `usize::MAX`.
    pub fn bfs_distances(&self, source: NodeId) -> Vec<usize> {
        let mut distances = vec![usize::MAX; self.nodes.len()];
        let mut queue = VecDeque::new();

        distances[source] = 0;
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            let next_cost = distances[node] + 1;
            for &neighbor in &self.nodes[node].neighbors {
                if next_cost < distances[neighbor] {
                    distances[neighbor] = next_cost;
                    queue.push_back(neighbor);
                }
            }
        }

        distances
    }
}
