use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{instrument, trace};

use super::CandidateScoring;
use crate::common::{AgentId, AgentState, Configuration, DistanceOracle, ReservationTable};
use crate::map::Map;
use crate::stat::Stats;

/// Agents plus the reservation tables they claim nodes in.
#[derive(Debug, Clone)]
pub struct PlanState {
    pub agents: Vec<AgentState>,
    pub reservation: ReservationTable,
}

impl PlanState {
    /// Reserves every agent's current node. `agents[i].id` must equal `i`.
    pub fn new(agents: Vec<AgentState>, node_count: usize) -> Self {
        let mut reservation = ReservationTable::new(node_count);
        for agent in &agents {
            reservation.reserve_current(agent.current, agent.id);
        }
        PlanState {
            agents,
            reservation,
        }
    }

    pub fn total_compromise(&self) -> usize {
        self.agents
            .iter()
            .map(|agent| agent.current_compromise)
            .sum()
    }

    /// Tentative next nodes, unplanned agents counted as staying.
    pub fn planned_configuration(&self) -> Configuration {
        self.agents
            .iter()
            .map(|agent| agent.next.unwrap_or(agent.current))
            .collect()
    }

    /// Drops every tentative claim, leaving all agents unplanned.
    pub fn clear_plans(&mut self) {
        for agent in self.agents.iter_mut() {
            if let Some(next) = agent.next.take() {
                self.reservation.release_next(next);
            }
        }
    }
}

pub struct Negotiator<'a, D: DistanceOracle> {
    map: &'a Map,
    distance: &'a D,
    scoring: CandidateScoring,
}

impl<'a, D: DistanceOracle> Negotiator<'a, D> {
    pub fn new(map: &'a Map, distance: &'a D, scoring: CandidateScoring) -> Self {
        Negotiator {
            map,
            distance,
            scoring,
        }
    }

    /// Negotiates every still-unplanned agent, highest priority first.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        state: &mut PlanState,
        order: &[AgentId],
        rng: &mut R,
        stats: &mut Stats,
    ) {
        for &agent in order {
            if !state.agents[agent].is_planned() {
                self.negotiate(state, agent, None, rng, stats);
            }
        }
    }

    /// Secures a next node for `ai`, pushing unplanned occupants out of the way.
    ///
    /// `aj` is the agent whose move displaced `ai`, if any; its current node is
    /// off limits to avoid a swap. Returns `false` when `ai` could only stay
    /// put, which tells `aj` to try its next candidate.
    #[instrument(skip_all, name = "pibt", fields(agent = ai, displaced_by = ?aj), level = "trace")]
    pub fn negotiate<R: Rng + ?Sized>(
        &self,
        state: &mut PlanState,
        ai: AgentId,
        aj: Option<AgentId>,
        rng: &mut R,
        stats: &mut Stats,
    ) -> bool {
        stats.negotiations += 1;

        let current = state.agents[ai].current;
        let at_goal = state.agents[ai].at_goal();
        let forbidden = aj.map(|aj| state.agents[aj].current);

        let mut candidates = self.map.neighbors(current).to_vec();
        candidates.push(current);
        candidates.shuffle(rng);
        self.scoring.sort(
            &mut candidates,
            ai,
            self.map,
            self.distance,
            &state.reservation,
        );

        let shortest = self.distance.distance(ai, candidates[0]);

        for &u in &candidates {
            if state.reservation.occupant_next(u).is_some() || forbidden == Some(u) {
                continue;
            }

            state.reservation.reserve_next(u, ai);
            state.agents[ai].next = Some(u);

            if let Some(ak) = state.reservation.occupant_current(u) {
                if !state.agents[ak].is_planned() && !self.negotiate(state, ak, Some(ai), rng, stats)
                {
                    // `ak` stays on `u` and now holds its claim.
                    continue;
                }
            }

            let mut compromise = self.distance.distance(ai, u) - shortest;
            if at_goal {
                compromise *= 2;
            }
            trace!("agent {ai} secures node {u}, compromise {compromise}");
            state.agents[ai].record_compromise(compromise);
            return true;
        }

        // Only a displacer can have claimed `current`, and it moves on.
        state.reservation.reserve_next(current, ai);
        state.agents[ai].next = Some(current);
        let compromise = self.distance.distance(ai, current) - shortest;
        trace!("agent {ai} fails to secure a node, stays at {current}");
        state.agents[ai].record_compromise(compromise);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DistanceTable;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("trace")
            .try_init();
    }

    fn setup(map: &Map, tasks: &[(usize, usize)]) -> (PlanState, DistanceTable) {
        let goals: Vec<_> = tasks.iter().map(|&(_, goal)| goal).collect();
        let distance = DistanceTable::new(map, &goals);
        let agents = tasks
            .iter()
            .enumerate()
            .map(|(id, &(start, goal))| {
                AgentState::new(id, start, goal, distance.distance(id, start), 0.5, 0.5)
            })
            .collect();
        (PlanState::new(agents, map.node_count()), distance)
    }

    #[test]
    fn test_free_move() {
        init_tracing();
        let map = Map::from_grid(&["...."]).unwrap();
        let (mut state, distance) = setup(&map, &[(0, 3)]);
        let negotiator = Negotiator::new(&map, &distance, CandidateScoring::Distance);
        let mut rng = StdRng::seed_from_u64(0);
        let mut stats = Stats::default();

        assert!(negotiator.negotiate(&mut state, 0, None, &mut rng, &mut stats));
        assert_eq!(state.agents[0].next, Some(1));
        assert_eq!(state.reservation.occupant_next(1), Some(0));
        assert_eq!(state.agents[0].current_compromise, 0);
    }

    #[test]
    fn test_push_occupant_off_its_goal() {
        init_tracing();
        // Agent 1 sits on its goal in the way of agent 0.
        let map = Map::from_grid(&["...."]).unwrap();
        let (mut state, distance) = setup(&map, &[(0, 3), (1, 1)]);
        let negotiator = Negotiator::new(&map, &distance, CandidateScoring::Distance);
        let mut rng = StdRng::seed_from_u64(1);
        let mut stats = Stats::default();

        assert!(negotiator.negotiate(&mut state, 0, None, &mut rng, &mut stats));
        assert_eq!(state.agents[0].next, Some(1));
        assert_eq!(state.agents[1].next, Some(2));
        assert_eq!(state.reservation.occupant_next(1), Some(0));
        assert_eq!(state.reservation.occupant_next(2), Some(1));
        // Pushed off the goal: doubled.
        assert_eq!(state.agents[1].current_compromise, 2);
        assert_eq!(stats.negotiations, 2);
    }

    #[test]
    fn test_failed_displacement_falls_back_to_staying() {
        init_tracing();
        // Two cells, two agents that want to swap.
        let map = Map::from_grid(&[".."]).unwrap();
        let (mut state, distance) = setup(&map, &[(0, 1), (1, 0)]);
        let negotiator = Negotiator::new(&map, &distance, CandidateScoring::Distance);
        let mut rng = StdRng::seed_from_u64(2);
        let mut stats = Stats::default();

        // Agent 0 already claimed node 1 and displaces agent 1.
        state.reservation.reserve_next(1, 0);
        state.agents[0].next = Some(1);
        assert!(!negotiator.negotiate(&mut state, 1, Some(0), &mut rng, &mut stats));
        assert_eq!(state.agents[1].next, Some(1));
        assert_eq!(state.reservation.occupant_next(1), Some(1));
        assert_eq!(state.agents[1].current_compromise, 1);

        let mut state = setup(&map, &[(0, 1), (1, 0)]).0;
        assert!(negotiator.negotiate(&mut state, 0, None, &mut rng, &mut stats));
        assert_eq!(state.agents[0].next, Some(0));
        assert_eq!(state.agents[1].next, Some(1));
        assert_eq!(state.reservation.occupant_next(0), Some(0));
        assert_eq!(state.reservation.occupant_next(1), Some(1));
    }

    #[test]
    fn test_never_swaps_with_displacer() {
        // 0 - 1 - 2, agent 1 wants to go where agent 0 comes from.
        let map = Map::from_grid(&["..."]).unwrap();
        let (mut state, distance) = setup(&map, &[(0, 2), (1, 0)]);
        let negotiator = Negotiator::new(&map, &distance, CandidateScoring::Distance);
        let mut rng = StdRng::seed_from_u64(3);
        let mut stats = Stats::default();

        assert!(negotiator.negotiate(&mut state, 0, None, &mut rng, &mut stats));
        assert_eq!(state.agents[0].next, Some(1));
        assert_eq!(state.agents[1].next, Some(2));
    }

    #[test]
    fn test_plan_negotiates_each_agent_once() {
        let map = Map::from_grid(&[".....", ".....", "....."]).unwrap();
        let (mut state, distance) = setup(&map, &[(0, 4), (1, 3), (2, 10), (7, 5), (12, 14)]);
        let negotiator = Negotiator::new(&map, &distance, CandidateScoring::Flexibility);
        let mut rng = StdRng::seed_from_u64(4);
        let mut stats = Stats::default();

        negotiator.plan(&mut state, &[0, 1, 2, 3, 4], &mut rng, &mut stats);
        assert_eq!(stats.negotiations, 5);

        let configuration = state.planned_configuration();
        for (agent, &node) in configuration.iter().enumerate() {
            assert_eq!(state.reservation.occupant_next(node), Some(agent));
            let current = state.agents[agent].current;
            assert!(node == current || map.neighbors(current).contains(&node));
        }

        state.clear_plans();
        assert!(state.agents.iter().all(|agent| agent.next.is_none()));
        assert!((0..map.node_count()).all(|node| state.reservation.occupant_next(node).is_none()));
    }

    #[test]
    fn test_first_in_order_wins_contention() {
        // Agents on both ends of a corridor want the middle cell.
        let map = Map::from_grid(&["..."]).unwrap();
        let (state, distance) = setup(&map, &[(0, 1), (2, 1)]);
        let negotiator = Negotiator::new(&map, &distance, CandidateScoring::Distance);
        let mut rng = StdRng::seed_from_u64(5);
        let mut stats = Stats::default();

        let mut first = state.clone();
        negotiator.plan(&mut first, &[0, 1], &mut rng, &mut stats);
        assert_eq!(first.planned_configuration(), vec![1, 2]);

        let mut second = state;
        negotiator.plan(&mut second, &[1, 0], &mut rng, &mut stats);
        assert_eq!(second.planned_configuration(), vec![0, 1]);
    }
}
