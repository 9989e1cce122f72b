//! Long-range routing beyond the local search radius.
//!
//! Routes are coarse: a list of waypoints to walk through, each close enough
//! to the previous one for the local path finder to connect them.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use world_core::WorldPoint;

/// Coarse route between two distant tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Waypoints ending at the destination. The start is not included.
    pub waypoints: Vec<WorldPoint>,
    pub cost: u32,
}

/// Graph-based router used when a destination lies beyond local range.
pub trait LongRangeRouter: Send + Sync {
    fn route(&self, from: WorldPoint, to: WorldPoint) -> Option<Route>;
}

/// Undirected waypoint graph searched with Dijkstra.
///
/// Start and destination are attached to their nearest waypoint; the
/// straight-line distance of that hop is added to the cost.
#[derive(Clone, Debug, Default)]
pub struct WaypointGraph {
    nodes: Vec<WorldPoint>,
    edges: HashMap<usize, Vec<(usize, u32)>>,
}

impl WaypointGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_waypoint(&mut self, point: WorldPoint) -> usize {
        self.nodes.push(point);
        self.nodes.len() - 1
    }

    /// Connects two waypoints. `cost` defaults to their tile distance.
    pub fn connect(&mut self, a: usize, b: usize, cost: Option<u32>) {
        let (Some(pa), Some(pb)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return;
        };
        let cost = cost.unwrap_or_else(|| pa.chebyshev_distance(*pb).max(0) as u32);
        self.edges.entry(a).or_default().push((b, cost));
        self.edges.entry(b).or_default().push((a, cost));
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn nearest(&self, point: WorldPoint) -> Option<(usize, u32)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.plane == point.plane)
            .map(|(index, node)| (index, node.chebyshev_distance(point).max(0) as u32))
            .min_by_key(|(_, distance)| *distance)
    }

    fn shortest(&self, start: usize, goal: usize) -> Option<(Vec<usize>, u32)> {
        let mut dist: HashMap<usize, u32> = HashMap::new();
        let mut previous: HashMap<usize, usize> = HashMap::new();
        let mut heap = BinaryHeap::new();

        dist.insert(start, 0);
        heap.push(Reverse((0u32, start)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == goal {
                let mut path = vec![goal];
                let mut current = goal;
                while let Some(&prev) = previous.get(&current) {
                    path.push(prev);
                    current = prev;
                }
                path.reverse();
                return Some((path, cost));
            }
            if cost > dist.get(&node).copied().unwrap_or(u32::MAX) {
                continue;
            }
            for &(next, weight) in self.edges.get(&node).into_iter().flatten() {
                let candidate = cost.saturating_add(weight);
                if candidate < dist.get(&next).copied().unwrap_or(u32::MAX) {
                    dist.insert(next, candidate);
                    previous.insert(next, node);
                    heap.push(Reverse((candidate, next)));
                }
            }
        }
        None
    }
}

impl LongRangeRouter for WaypointGraph {
    fn route(&self, from: WorldPoint, to: WorldPoint) -> Option<Route> {
        let (start, entry) = self.nearest(from)?;
        let (goal, exit) = self.nearest(to)?;
        let (indices, cost) = self.shortest(start, goal)?;

        let mut waypoints: Vec<WorldPoint> = indices
            .into_iter()
            .filter_map(|index| self.nodes.get(index).copied())
            .collect();
        if waypoints.last() != Some(&to) {
            waypoints.push(to);
        }

        Some(Route {
            waypoints,
            cost: entry.saturating_add(cost).saturating_add(exit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> WorldPoint {
        WorldPoint::new(x, y, 0)
    }

    #[test]
    fn routes_through_cheapest_chain() {
        let mut graph = WaypointGraph::new();
        let a = graph.add_waypoint(p(0, 0));
        let b = graph.add_waypoint(p(50, 0));
        let c = graph.add_waypoint(p(100, 0));
        let detour = graph.add_waypoint(p(50, 80));
        graph.connect(a, b, None);
        graph.connect(b, c, None);
        graph.connect(a, detour, None);
        graph.connect(detour, c, None);

        let route = graph.route(p(2, 1), p(103, 0)).expect("connected graph");
        assert_eq!(route.waypoints, vec![p(0, 0), p(50, 0), p(100, 0), p(103, 0)]);
        assert_eq!(route.cost, 2 + 100 + 3);
    }

    #[test]
    fn disconnected_components_have_no_route() {
        let mut graph = WaypointGraph::new();
        graph.add_waypoint(p(0, 0));
        graph.add_waypoint(p(500, 0));

        assert!(graph.route(p(0, 0), p(500, 0)).is_none());
        assert!(WaypointGraph::new().route(p(0, 0), p(1, 1)).is_none());
    }
}
