use clap::ValueEnum;
use serde::Deserialize;
use std::cmp::Reverse;

use crate::common::{AgentId, DistanceOracle, NodeId, ReservationTable};
use crate::map::Map;

/// How a negotiating agent ranks its candidate nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateScoring {
    /// Distance to goal, then free nodes before occupied ones.
    Distance,
    /// Distance to goal, then nodes with more free neighbours, then free nodes.
    Flexibility,
}

impl CandidateScoring {
    /// Sorts `candidates` best first. The sort is stable, so shuffling
    /// beforehand randomises the order among equal candidates.
    pub fn sort<D: DistanceOracle>(
        self,
        candidates: &mut [NodeId],
        agent: AgentId,
        map: &Map,
        distance: &D,
        reservation: &ReservationTable,
    ) {
        candidates.sort_by_cached_key(|&node| {
            let flexibility = match self {
                CandidateScoring::Distance => 0,
                CandidateScoring::Flexibility => node_flexibility(node, map, reservation),
            };
            (
                distance.distance(agent, node),
                Reverse(flexibility),
                !reservation.is_free_now(node),
            )
        });
    }
}

fn node_flexibility(node: NodeId, map: &Map, reservation: &ReservationTable) -> usize {
    map.neighbors(node)
        .iter()
        .filter(|&&neighbor| reservation.is_free_now(neighbor))
        .count()
}
