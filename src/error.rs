use thiserror::Error;

use crate::common::AgentId;

/// Malformed instances, rejected before the scheduler starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceError {
    #[error("agent {agent} starts at {position:?}, which is not a passable cell")]
    InvalidStart {
        agent: AgentId,
        position: (usize, usize),
    },

    #[error("agent {agent} has goal {position:?}, which is not a passable cell")]
    InvalidGoal {
        agent: AgentId,
        position: (usize, usize),
    },

    #[error("agent {agent} has id {id}, expected ids 0..n in order")]
    InvalidId { agent: usize, id: usize },

    #[error("agents {first} and {second} share start {position:?}")]
    DuplicateStart {
        first: AgentId,
        second: AgentId,
        position: (usize, usize),
    },

    #[error("agents {first} and {second} share goal {position:?}")]
    DuplicateGoal {
        first: AgentId,
        second: AgentId,
        position: (usize, usize),
    },

    #[error("goal of agent {agent} is unreachable from its start")]
    Unreachable { agent: AgentId },
}
