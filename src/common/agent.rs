use super::{AgentId, NodeId};

/// Mutable per-agent planning state, owned by the solver for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    pub id: AgentId,
    pub current: NodeId,
    /// `None` until the agent is negotiated in the current planning pass.
    pub next: Option<NodeId>,
    pub goal: NodeId,
    /// Timesteps since the agent last stood on its goal.
    pub elapsed: usize,
    pub init_distance: usize,
    pub local_potential: i64,
    pub tie_breaker: f64,
    pub boss: bool,
    pub boss_tie_breaker: f64,
    pub flexibility: usize,
    pub current_compromise: usize,
    pub cumulative_compromise: usize,
}

impl AgentState {
    pub fn new(
        id: AgentId,
        start: NodeId,
        goal: NodeId,
        init_distance: usize,
        tie_breaker: f64,
        boss_tie_breaker: f64,
    ) -> Self {
        AgentState {
            id,
            current: start,
            next: None,
            goal,
            elapsed: 0,
            init_distance,
            local_potential: 0,
            tie_breaker,
            boss: false,
            boss_tie_breaker,
            flexibility: 0,
            current_compromise: 0,
            cumulative_compromise: 0,
        }
    }

    pub fn at_goal(&self) -> bool {
        self.current == self.goal
    }

    pub fn is_planned(&self) -> bool {
        self.next.is_some()
    }

    /// Records the compromise of the move just negotiated.
    pub(crate) fn record_compromise(&mut self, compromise: usize) {
        self.current_compromise = compromise;
        self.cumulative_compromise += compromise;
    }

    /// Forgets the compromise of the last negotiation, e.g. before a repair round.
    pub(crate) fn discard_compromise(&mut self) {
        self.cumulative_compromise -= self.current_compromise;
        self.current_compromise = 0;
    }
}
