mod pibt;

pub use pibt::PIBT;

use crate::common::{NodeId, Solution};
use crate::stat::Stats;

/// Contract shared by one-shot MAPF solvers.
///
/// Instances are single-threaded: `solve` mutates internal reservation and
/// agent state, so sharing one across threads needs external locking.
pub trait Solver {
    /// Runs to termination, returns whether every agent reached its goal.
    fn solve(&mut self) -> bool;

    fn succeeded(&self) -> bool;

    fn solution(&self) -> &Solution;

    fn starts(&self) -> &[NodeId];

    fn goals(&self) -> &[NodeId];

    fn stats(&self) -> &Stats;

    fn lower_bound_sum_of_costs(&self) -> usize;

    fn lower_bound_makespan(&self) -> usize;

    fn sum_of_costs(&self) -> usize {
        self.solution().sum_of_costs(self.goals())
    }

    fn makespan(&self) -> usize {
        self.solution().makespan()
    }
}
