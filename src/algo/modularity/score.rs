//! Modularity of a community assignment.

use foldhash::{HashMap, HashMapExt};

use crate::graph::loading::DEFAULT_WEIGHT;
use crate::graph::Graph;

/// Modularity of `communities` on `graph`:
///
/// ```text
/// Q = sum over c of [ in_c / m2 - resolution * (tot_c / m2)^2 ]
/// ```
///
/// where `m2` is the total stored relationship weight, `in_c` the weight of
/// relationships with both ends in `c` (self-loops included) and `tot_c` the
/// summed weighted degree of `c`. Community ids may be any `u64`. An empty or
/// weightless graph scores `0.0`.
pub fn modularity(graph: &Graph, communities: impl Fn(u64) -> u64, resolution: f64) -> f64 {
    let mut volumes: HashMap<u64, f64> = HashMap::new();
    let mut internal = 0.0;
    let mut total = 0.0;

    for node in graph.nodes() {
        let community = communities(node);
        let mut degree = 0.0;
        for (target, weight) in graph.relationships(node, DEFAULT_WEIGHT) {
            degree += weight;
            if communities(target) == community {
                internal += weight;
            }
        }
        *volumes.entry(community).or_insert(0.0) += degree;
        total += degree;
    }

    if total == 0.0 {
        return 0.0;
    }
    let expected: f64 = volumes.values().map(|v| (v / total) * (v / total)).sum();
    internal / total - resolution * expected
}
