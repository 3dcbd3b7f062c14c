use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub solved: bool,
    pub timesteps: usize,
    pub sum_of_costs: usize,
    pub sum_of_costs_lower_bound: usize,
    pub makespan: usize,
    pub makespan_lower_bound: usize,
    pub time_us: usize,
    pub negotiations: usize,
    pub repair_rounds: usize,
    pub repair_rounds_accepted: usize,
    pub sum_of_compromise: usize,
}

impl Stats {
    pub fn print(&self) {
        info!(
            "Solved {:?} Timesteps {:?} SOC {:?} (lb {:?}) Makespan {:?} (lb {:?}) Time(microseconds) {:?} Negotiations {:?} Repair rounds {:?} (accepted {:?}) Compromise {:?}",
            self.solved,
            self.timesteps,
            self.sum_of_costs,
            self.sum_of_costs_lower_bound,
            self.makespan,
            self.makespan_lower_bound,
            self.time_us,
            self.negotiations,
            self.repair_rounds,
            self.repair_rounds_accepted,
            self.sum_of_compromise
        );
    }
}
