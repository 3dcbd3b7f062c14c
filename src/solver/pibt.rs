use super::Solver;
use crate::algorithm::{CandidateScoring, Negotiator, PlanState, PriorityPolicy};
use crate::common::{
    Agent, AgentId, AgentState, Configuration, DistanceOracle, DistanceTable, NodeId, Solution,
};
use crate::config::Config;
use crate::error::InstanceError;
use crate::map::Map;
use crate::stat::Stats;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

pub struct PIBT {
    map: Map,
    distance: DistanceTable,
    starts: Configuration,
    goals: Configuration,
    state: PlanState,
    order: Vec<AgentId>,
    policy: PriorityPolicy,
    scoring: CandidateScoring,
    rng: StdRng,
    max_timestep: usize,
    time_limit: Option<Duration>,
    repair_rounds: usize,
    timestep: usize,
    solution: Solution,
    solved: bool,
    stats: Stats,
}

impl PIBT {
    /// Validates the instance and places every agent on its start.
    pub fn new(agents: Vec<Agent>, map: &Map, config: &Config) -> Result<Self, InstanceError> {
        let (starts, goals) = Self::resolve_nodes(&agents, map)?;
        let distance = DistanceTable::new(map, &goals);
        for (agent, &start) in starts.iter().enumerate() {
            if distance.distance(agent, start) == usize::MAX {
                return Err(InstanceError::Unreachable { agent });
            }
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let states = starts
            .iter()
            .zip(&goals)
            .enumerate()
            .map(|(id, (&start, &goal))| {
                let init_distance = if config.disable_dist_init {
                    0
                } else {
                    distance.distance(id, start)
                };
                AgentState::new(id, start, goal, init_distance, rng.gen(), rng.gen())
            })
            .collect();

        let mut solution = Solution::new();
        solution.push(starts.clone());

        Ok(PIBT {
            map: map.clone(),
            distance,
            order: (0..starts.len()).collect(),
            state: PlanState::new(states, map.node_count()),
            starts,
            goals,
            policy: PriorityPolicy::new(config.priority, config.boss_window),
            scoring: config.candidate_scoring,
            rng,
            max_timestep: config.max_timestep,
            time_limit: config.time_limit_ms.map(Duration::from_millis),
            repair_rounds: config.repair_rounds,
            timestep: 0,
            solution,
            solved: false,
            stats: Stats::default(),
        })
    }

    fn resolve_nodes(
        agents: &[Agent],
        map: &Map,
    ) -> Result<(Configuration, Configuration), InstanceError> {
        let mut starts = Vec::with_capacity(agents.len());
        let mut goals = Vec::with_capacity(agents.len());
        let mut start_owner: HashMap<NodeId, AgentId> = HashMap::new();
        let mut goal_owner: HashMap<NodeId, AgentId> = HashMap::new();

        for (index, agent) in agents.iter().enumerate() {
            if agent.id != index {
                return Err(InstanceError::InvalidId {
                    agent: index,
                    id: agent.id,
                });
            }
            let start = map.node_at(agent.start).ok_or(InstanceError::InvalidStart {
                agent: index,
                position: agent.start,
            })?;
            let goal = map.node_at(agent.goal).ok_or(InstanceError::InvalidGoal {
                agent: index,
                position: agent.goal,
            })?;
            if let Some(&first) = start_owner.get(&start) {
                return Err(InstanceError::DuplicateStart {
                    first,
                    second: index,
                    position: agent.start,
                });
            }
            if let Some(&first) = goal_owner.get(&goal) {
                return Err(InstanceError::DuplicateGoal {
                    first,
                    second: index,
                    position: agent.goal,
                });
            }
            start_owner.insert(start, index);
            goal_owner.insert(goal, index);
            starts.push(start);
            goals.push(goal);
        }

        Ok((starts, goals))
    }

    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.state.agents
    }

    /// Orders agents and negotiates every unplanned one.
    fn plan(&mut self) {
        self.policy.prepare(
            &mut self.state.agents,
            &self.map,
            &self.distance,
            &self.state.reservation,
            self.timestep,
        );
        self.policy.sort(&mut self.order, &self.state.agents);

        let negotiator = Negotiator::new(&self.map, &self.distance, self.scoring);
        negotiator.plan(&mut self.state, &self.order, &mut self.rng, &mut self.stats);
    }

    /// Replans with fresh tie-breakers for compromised agents and keeps the
    /// round with the lowest total compromise. Tie-breakers drawn here carry
    /// over to later timesteps.
    fn repair(&mut self) {
        let mut best_sum = self.state.total_compromise();
        let mut best_configuration = self.state.planned_configuration();
        let mut best_compromises: Vec<usize> = self
            .state
            .agents
            .iter()
            .map(|agent| agent.current_compromise)
            .collect();

        for round in 0..self.repair_rounds {
            if best_sum == 0 {
                break;
            }
            self.stats.repair_rounds += 1;

            for agent in self.state.agents.iter_mut() {
                if agent.current_compromise != 0 {
                    agent.tie_breaker = self.rng.gen();
                }
                agent.discard_compromise();
            }
            self.state.clear_plans();
            self.plan();

            let sum = self.state.total_compromise();
            debug!("repair round {round}: compromise {sum}, best {best_sum}");
            if sum < best_sum {
                best_sum = sum;
                best_configuration = self.state.planned_configuration();
                for (best, agent) in best_compromises.iter_mut().zip(&self.state.agents) {
                    *best = agent.current_compromise;
                }
                self.stats.repair_rounds_accepted += 1;
            }
        }

        self.state.clear_plans();
        let PlanState {
            agents,
            reservation,
        } = &mut self.state;
        for agent in agents.iter_mut() {
            agent.discard_compromise();
            agent.record_compromise(best_compromises[agent.id]);
            let next = best_configuration[agent.id];
            reservation.reserve_next(next, agent.id);
            agent.next = Some(next);
        }
    }

    /// Commits every tentative move and clears the next-table.
    fn act(&mut self) -> Configuration {
        let PlanState {
            agents,
            reservation,
        } = &mut self.state;
        let mut configuration = Vec::with_capacity(agents.len());

        for agent in agents.iter_mut() {
            let next = agent.next.take().unwrap_or(agent.current);
            reservation.release_current(agent.current, agent.id);
            reservation.release_next(next);
            reservation.reserve_current(next, agent.id);

            agent.elapsed = if next == agent.goal {
                0
            } else {
                agent.elapsed + 1
            };
            agent.current = next;
            agent.current_compromise = 0;
            configuration.push(next);
        }

        configuration
    }

    fn all_at_goal(&self) -> bool {
        self.state.agents.iter().all(|agent| agent.at_goal())
    }
}

impl Solver for PIBT {
    #[instrument(skip_all, name = "pibt_solve", fields(agents = self.starts.len()), level = "debug")]
    fn solve(&mut self) -> bool {
        let total_solve_start_time = Instant::now();
        info!(
            "solve {} agents, priority {:?}, candidates {:?}",
            self.starts.len(),
            self.policy.kind(),
            self.scoring
        );

        self.solved = self.all_at_goal();
        while !self.solved {
            if self.timestep >= self.max_timestep {
                info!("timestep limit {} reached", self.max_timestep);
                break;
            }
            if let Some(limit) = self.time_limit {
                if total_solve_start_time.elapsed() >= limit {
                    info!("time limit {limit:?} reached at timestep {}", self.timestep);
                    break;
                }
            }
            debug!(
                "elapsed: {:?}, timestep: {}",
                total_solve_start_time.elapsed(),
                self.timestep
            );

            self.plan();
            if self.repair_rounds > 0 && self.state.total_compromise() > 0 {
                self.repair();
            }
            let configuration = self.act();
            self.solution.push(configuration);
            self.timestep += 1;
            self.policy
                .after_timestep(&mut self.state.agents, &mut self.rng);

            self.solved = self.all_at_goal();
        }

        self.stats.solved = self.solved;
        self.stats.timesteps = self.timestep;
        self.stats.sum_of_costs = self.sum_of_costs();
        self.stats.sum_of_costs_lower_bound = self.lower_bound_sum_of_costs();
        self.stats.makespan = self.makespan();
        self.stats.makespan_lower_bound = self.lower_bound_makespan();
        self.stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.sum_of_compromise = self
            .state
            .agents
            .iter()
            .map(|agent| agent.cumulative_compromise)
            .sum();
        self.stats.print();

        self.solved
    }

    fn succeeded(&self) -> bool {
        self.solved
    }

    fn solution(&self) -> &Solution {
        &self.solution
    }

    fn starts(&self) -> &[NodeId] {
        &self.starts
    }

    fn goals(&self) -> &[NodeId] {
        &self.goals
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn lower_bound_sum_of_costs(&self) -> usize {
        self.starts
            .iter()
            .enumerate()
            .map(|(agent, &start)| self.distance.distance(agent, start))
            .sum()
    }

    fn lower_bound_makespan(&self) -> usize {
        self.starts
            .iter()
            .enumerate()
            .map(|(agent, &start)| self.distance.distance(agent, start))
            .max()
            .unwrap_or(0)
    }
}
