//! City adjacency graph and distance queries

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::CityId;

/// World-graph distance query used by capital relocation
pub trait WorldMap: Send + Sync {
    /// Hop distance from `city` to every city within `max_distance`
    ///
    /// The origin itself is reported at distance 0.
    fn distances_from(&self, city: CityId, max_distance: u32) -> AHashMap<CityId, u32>;
}

/// Undirected adjacency list over cities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityGraph {
    neighbors: AHashMap<CityId, Vec<CityId>>,
}

impl CityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of roads
    pub fn from_edges(edges: &[(u32, u32)]) -> Self {
        let mut graph = Self::new();
        for &(a, b) in edges {
            graph.connect(CityId(a), CityId(b));
        }
        graph
    }

    /// Add an undirected road between two cities
    pub fn connect(&mut self, a: CityId, b: CityId) {
        if a == b {
            return;
        }
        let list = self.neighbors.entry(a).or_default();
        if !list.contains(&b) {
            list.push(b);
        }
        let list = self.neighbors.entry(b).or_default();
        if !list.contains(&a) {
            list.push(a);
        }
    }

    pub fn neighbors(&self, city: CityId) -> &[CityId] {
        self.neighbors.get(&city).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn city_count(&self) -> usize {
        self.neighbors.len()
    }
}

impl WorldMap for CityGraph {
    fn distances_from(&self, city: CityId, max_distance: u32) -> AHashMap<CityId, u32> {
        let mut dist = AHashMap::new();
        dist.insert(city, 0);

        let mut queue = VecDeque::new();
        queue.push_back(city);

        while let Some(current) = queue.pop_front() {
            let d = dist[&current];
            if d >= max_distance {
                continue;
            }
            for &next in self.neighbors(current) {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }

        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> CityGraph {
        // 1 - 2 - 3 - 4 - 5
        CityGraph::from_edges(&[(1, 2), (2, 3), (3, 4), (4, 5)])
    }

    #[test]
    fn test_distances_on_line() {
        let d = line().distances_from(CityId(1), 99);
        assert_eq!(d[&CityId(1)], 0);
        assert_eq!(d[&CityId(3)], 2);
        assert_eq!(d[&CityId(5)], 4);
    }

    #[test]
    fn test_max_distance_limits_search() {
        let d = line().distances_from(CityId(1), 2);
        assert_eq!(d.len(), 3);
        assert!(!d.contains_key(&CityId(4)));
    }

    #[test]
    fn test_shortest_path_wins_over_long_loop() {
        // 1-2-3-4 and a shortcut 1-4
        let g = CityGraph::from_edges(&[(1, 2), (2, 3), (3, 4), (1, 4)]);
        let d = g.distances_from(CityId(1), 99);
        assert_eq!(d[&CityId(4)], 1);
        assert_eq!(d[&CityId(3)], 2);
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut g = CityGraph::new();
        g.connect(CityId(1), CityId(2));
        g.connect(CityId(2), CityId(1));
        g.connect(CityId(1), CityId(1));
        assert_eq!(g.neighbors(CityId(1)), &[CityId(2)]);
        assert_eq!(g.neighbors(CityId(2)), &[CityId(1)]);
    }

    #[test]
    fn test_isolated_city() {
        let d = CityGraph::new().distances_from(CityId(7), 5);
        assert_eq!(d.len(), 1);
    }
}
