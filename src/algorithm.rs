mod candidate;
mod pibt;
mod priority;

pub use candidate::CandidateScoring;
pub use pibt::{Negotiator, PlanState};
pub use priority::{PriorityKind, PriorityPolicy};
