use clap::ValueEnum;
use rand::Rng;
use serde::Deserialize;
use std::cmp::Ordering;
use tracing::debug;

use crate::common::{AgentId, AgentState, DistanceOracle, ReservationTable};
use crate::map::Map;

/// Keys consulted after `elapsed` and before the random tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityKind {
    /// Static start-to-goal distance, ascending.
    ///
    /// The order never changes between timesteps, so two agents that block
    /// each other can livelock without repair rounds, even next to a free
    /// passing bay.
    Distance,
    /// Potential of the current neighbourhood, recomputed every timestep.
    LocalPotential,
    /// One rotating boss first, then static distance.
    Boss,
    /// Fewest free neighbours first, then static distance.
    Flexibility,
}

#[derive(Debug, Clone)]
pub struct PriorityPolicy {
    kind: PriorityKind,
    boss_window: usize,
    // Current boss and the timestep it was promoted.
    boss: Option<(AgentId, usize)>,
}

impl PriorityPolicy {
    pub fn new(kind: PriorityKind, boss_window: usize) -> Self {
        PriorityPolicy {
            kind,
            boss_window,
            boss: None,
        }
    }

    pub fn kind(&self) -> PriorityKind {
        self.kind
    }

    pub fn boss(&self) -> Option<AgentId> {
        self.boss.map(|(agent, _)| agent)
    }

    /// Refreshes the position-derived signals before a planning pass.
    pub fn prepare<D: DistanceOracle>(
        &mut self,
        agents: &mut [AgentState],
        map: &Map,
        distance: &D,
        reservation: &ReservationTable,
        timestep: usize,
    ) {
        match self.kind {
            PriorityKind::Distance => {}
            PriorityKind::LocalPotential => {
                for agent in agents.iter_mut() {
                    agent.local_potential = local_potential(agent, map, distance);
                }
            }
            PriorityKind::Boss => self.rotate_boss(agents, timestep),
            PriorityKind::Flexibility => {
                for agent in agents.iter_mut() {
                    agent.flexibility = map
                        .neighbors(agent.current)
                        .iter()
                        .filter(|&&neighbor| reservation.is_free_now(neighbor))
                        .count();
                }
            }
        }
    }

    /// `Less` means `a` plans before `b`.
    pub fn compare(&self, a: &AgentState, b: &AgentState) -> Ordering {
        b.elapsed
            .cmp(&a.elapsed)
            .then_with(|| match self.kind {
                PriorityKind::Distance => a.init_distance.cmp(&b.init_distance),
                PriorityKind::LocalPotential => a.local_potential.cmp(&b.local_potential),
                PriorityKind::Boss => b
                    .boss
                    .cmp(&a.boss)
                    .then_with(|| a.init_distance.cmp(&b.init_distance)),
                PriorityKind::Flexibility => a
                    .flexibility
                    .cmp(&b.flexibility)
                    .then_with(|| a.init_distance.cmp(&b.init_distance)),
            })
            .then_with(|| b.tie_breaker.total_cmp(&a.tie_breaker))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn sort(&self, order: &mut [AgentId], agents: &[AgentState]) {
        order.sort_by(|&a, &b| self.compare(&agents[a], &agents[b]));
    }

    /// Boss variants draw fresh tie-breakers after every committed timestep.
    pub fn after_timestep<R: Rng + ?Sized>(&mut self, agents: &mut [AgentState], rng: &mut R) {
        if self.kind != PriorityKind::Boss {
            return;
        }
        for agent in agents.iter_mut() {
            agent.tie_breaker = rng.gen();
            agent.boss_tie_breaker = rng.gen();
        }
    }

    fn rotate_boss(&mut self, agents: &mut [AgentState], timestep: usize) {
        let expired = match self.boss {
            Some((boss, since)) => {
                agents[boss].at_goal() || timestep >= since + self.boss_window
            }
            None => true,
        };
        if !expired {
            return;
        }

        if let Some((boss, _)) = self.boss.take() {
            agents[boss].boss = false;
        }
        let successor = agents
            .iter()
            .filter(|agent| !agent.at_goal())
            .max_by(|a, b| a.boss_tie_breaker.total_cmp(&b.boss_tie_breaker))
            .map(|agent| agent.id);
        if let Some(successor) = successor {
            debug!("agent {successor} promoted to boss at timestep {timestep}");
            agents[successor].boss = true;
            self.boss = Some((successor, timestep));
        }
    }
}

/// Sum of distance changes over every neighbour move. Agents with many moves
/// towards the goal score low and plan first; boxed-in agents score high.
fn local_potential<D: DistanceOracle>(agent: &AgentState, map: &Map, distance: &D) -> i64 {
    let here = distance.distance(agent.id, agent.current) as i64;
    map.neighbors(agent.current)
        .iter()
        .map(|&neighbor| distance.distance(agent.id, neighbor) as i64 - here)
        .sum()
}
