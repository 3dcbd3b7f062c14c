use super::{AgentId, NodeId};

/// Which agent claims each node now and in the upcoming timestep.
///
/// A plain store: callers keep the one-claimant-per-node invariant by checking
/// [`ReservationTable::occupant_next`] before claiming. Not meant to be shared
/// across threads without external synchronisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationTable {
    now: Vec<Option<AgentId>>,
    next: Vec<Option<AgentId>>,
}

impl ReservationTable {
    pub fn new(node_count: usize) -> Self {
        ReservationTable {
            now: vec![None; node_count],
            next: vec![None; node_count],
        }
    }

    pub fn reserve_current(&mut self, node: NodeId, agent: AgentId) {
        self.now[node] = Some(agent);
    }

    pub fn reserve_next(&mut self, node: NodeId, agent: AgentId) {
        self.next[node] = Some(agent);
    }

    /// Clears the current claim on `node`, but only if `agent` holds it.
    pub fn release_current(&mut self, node: NodeId, agent: AgentId) {
        if self.now[node] == Some(agent) {
            self.now[node] = None;
        }
    }

    pub fn release_next(&mut self, node: NodeId) {
        self.next[node] = None;
    }

    pub fn occupant_current(&self, node: NodeId) -> Option<AgentId> {
        self.now[node]
    }

    pub fn occupant_next(&self, node: NodeId) -> Option<AgentId> {
        self.next[node]
    }

    pub fn is_free_now(&self, node: NodeId) -> bool {
        self.now[node].is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_current_respects_owner() {
        let mut table = ReservationTable::new(3);
        table.reserve_current(1, 7);

        table.release_current(1, 8);
        assert_eq!(table.occupant_current(1), Some(7));

        table.release_current(1, 7);
        assert_eq!(table.occupant_current(1), None);
    }

    #[test]
    fn test_tables_are_independent() {
        let mut table = ReservationTable::new(2);
        table.reserve_current(0, 1);
        table.reserve_next(0, 2);

        assert_eq!(table.occupant_current(0), Some(1));
        assert_eq!(table.occupant_next(0), Some(2));
        assert!(table.is_free_now(1));

        table.release_next(0);
        assert_eq!(table.occupant_next(0), None);
        assert_eq!(table.occupant_current(0), Some(1));
    }
}
