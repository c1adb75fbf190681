// Road network and jeep path planning.
//
// The road graph is a set of tiles, each listing its neighboring road tiles
// in the order the links were laid. Links are always symmetric. Path queries
// run breadth-first over the neighbor lists, so the result is shortest in
// edge count and ties go to whichever neighbor was linked first.

use macroquad::prelude::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::error::ParkError;
use crate::grid::TilePos;

/// Shape of the road piece on a tile. A curve names the two sides it joins
/// (north is toward y = 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadKind {
    Horizontal,
    Vertical,
    CurveNorthEast,
    CurveNorthWest,
    CurveSouthEast,
    CurveSouthWest,
}

impl RoadKind {
    fn curve(from_west: bool, to_south: bool) -> Self {
        match (from_west, to_south) {
            (true, true) => RoadKind::CurveSouthWest,
            (true, false) => RoadKind::CurveNorthWest,
            (false, true) => RoadKind::CurveSouthEast,
            (false, false) => RoadKind::CurveNorthEast,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoadNode {
    pub pos: TilePos,
    pub kind: RoadKind,
    pub neighbors: Vec<TilePos>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoadGraph {
    nodes: BTreeMap<TilePos, RoadNode>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, pos: TilePos) -> Option<&RoadNode> {
        self.nodes.get(&pos)
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        self.nodes.contains_key(&pos)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RoadNode> {
        self.nodes.values()
    }

    /// Lay road along an L-shaped route: horizontal run first, then vertical.
    /// Returns every tile the route visits, in order.
    pub fn lay_segment(&mut self, a: TilePos, b: TilePos) -> Vec<TilePos> {
        let mut route = Vec::new();
        let step_x = (b.x - a.x).signum();
        let step_y = (b.y - a.y).signum();

        let mut x = a.x;
        route.push(a);
        while x != b.x {
            x += step_x;
            route.push(TilePos::new(x, a.y));
        }
        let mut y = a.y;
        while y != b.y {
            y += step_y;
            route.push(TilePos::new(b.x, y));
        }

        let corner = TilePos::new(b.x, a.y);
        let turns = a.x != b.x && a.y != b.y;
        for (i, &pos) in route.iter().enumerate() {
            let kind = if turns && pos == corner {
                RoadKind::curve(a.x < b.x, b.y > a.y)
            } else if pos.y == a.y && a.x != b.x {
                RoadKind::Horizontal
            } else if a.y != b.y {
                RoadKind::Vertical
            } else {
                RoadKind::Horizontal
            };
            self.nodes.entry(pos).or_insert_with(|| RoadNode {
                pos,
                kind,
                neighbors: Vec::new(),
            });
            if i > 0 {
                self.link(route[i - 1], pos);
            }
        }
        route
    }

    fn link(&mut self, a: TilePos, b: TilePos) {
        if let Some(node) = self.nodes.get_mut(&a) {
            if !node.neighbors.contains(&b) {
                node.neighbors.push(b);
            }
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            if !node.neighbors.contains(&a) {
                node.neighbors.push(a);
            }
        }
    }

    /// Remove a road tile and every link to it.
    pub fn remove(&mut self, pos: TilePos) -> Option<RoadNode> {
        let node = self.nodes.remove(&pos)?;
        for neighbor in &node.neighbors {
            if let Some(other) = self.nodes.get_mut(neighbor) {
                other.neighbors.retain(|p| *p != pos);
            }
        }
        Some(node)
    }

    /// Nearest road tile to `pos` (itself if it is a road tile).
    pub fn nearest_node(&self, pos: TilePos) -> Option<TilePos> {
        if self.nodes.contains_key(&pos) {
            return Some(pos);
        }
        self.nodes
            .keys()
            .copied()
            .min_by_key(|candidate| candidate.distance_sq(pos))
    }

    /// Breadth-first tile route from `start` to `goal`, both snapped onto the
    /// road. Empty when the goal is unreachable.
    pub fn find_tile_path(&self, start: TilePos, goal: TilePos) -> Result<Vec<TilePos>, ParkError> {
        let start = self.nearest_node(start).ok_or(ParkError::NoRoadNetwork)?;
        let goal = self.nearest_node(goal).ok_or(ParkError::NoRoadNetwork)?;
        if start == goal {
            return Ok(vec![start]);
        }

        let mut came_from: HashMap<TilePos, TilePos> = HashMap::new();
        let mut visited: HashSet<TilePos> = HashSet::new();
        let mut frontier = VecDeque::new();
        visited.insert(start);
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            if current == goal {
                return Ok(reconstruct(&came_from, start, goal));
            }
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for &next in &node.neighbors {
                if visited.insert(next) {
                    came_from.insert(next, current);
                    frontier.push_back(next);
                }
            }
        }

        Ok(Vec::new())
    }

    /// Waypoints (tile centers) from `start` to `goal` inclusive.
    pub fn find_path(&self, start: TilePos, goal: TilePos) -> Result<Vec<Vec2>, ParkError> {
        Ok(self
            .find_tile_path(start, goal)?
            .into_iter()
            .map(TilePos::center)
            .collect())
    }
}

fn reconstruct(came_from: &HashMap<TilePos, TilePos>, start: TilePos, goal: TilePos) -> Vec<TilePos> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_symmetric(graph: &RoadGraph) {
        for node in graph.nodes() {
            for n in &node.neighbors {
                let other = graph.node(*n).expect("neighbor must be a road node");
                assert!(
                    other.neighbors.contains(&node.pos),
                    "{:?} lists {:?} but not the reverse",
                    node.pos,
                    n
                );
            }
        }
    }

    #[test]
    fn laid_segments_link_both_ways() {
        let mut graph = RoadGraph::new();
        let route = graph.lay_segment(TilePos::new(0, 2), TilePos::new(4, 5));
        graph.lay_segment(TilePos::new(4, 5), TilePos::new(1, 1));

        for pair in route.windows(2) {
            assert!(graph.node(pair[0]).unwrap().neighbors.contains(&pair[1]));
            assert!(graph.node(pair[1]).unwrap().neighbors.contains(&pair[0]));
        }
        assert_symmetric(&graph);
    }

    #[test]
    fn corner_tile_is_tagged_with_curve() {
        let mut graph = RoadGraph::new();
        graph.lay_segment(TilePos::new(0, 0), TilePos::new(3, 2));
        assert_eq!(graph.node(TilePos::new(1, 0)).unwrap().kind, RoadKind::Horizontal);
        assert_eq!(graph.node(TilePos::new(3, 0)).unwrap().kind, RoadKind::CurveSouthWest);
        assert_eq!(graph.node(TilePos::new(3, 1)).unwrap().kind, RoadKind::Vertical);

        graph.lay_segment(TilePos::new(8, 5), TilePos::new(6, 3));
        assert_eq!(graph.node(TilePos::new(6, 5)).unwrap().kind, RoadKind::CurveNorthEast);
    }

    #[test]
    fn connected_path_ends_at_goal() {
        let mut graph = RoadGraph::new();
        graph.lay_segment(TilePos::new(0, 3), TilePos::new(5, 1));
        graph.lay_segment(TilePos::new(5, 1), TilePos::new(9, 6));

        let goal = TilePos::new(9, 6);
        let path = graph.find_path(TilePos::new(0, 3), goal).unwrap();
        assert!(!path.is_empty());
        assert_eq!(*path.last().unwrap(), goal.center());
        assert_eq!(path[0], TilePos::new(0, 3).center());
        // L-shaped routes are already edge-count shortest.
        assert_eq!(path.len(), 5 + 2 + 4 + 5 + 1);
    }

    #[test]
    fn bfs_prefers_fewest_edges() {
        let mut graph = RoadGraph::new();
        // Long way round, then a shortcut laid later.
        graph.lay_segment(TilePos::new(0, 0), TilePos::new(0, 4));
        graph.lay_segment(TilePos::new(0, 4), TilePos::new(4, 4));
        graph.lay_segment(TilePos::new(4, 4), TilePos::new(4, 0));
        graph.lay_segment(TilePos::new(0, 0), TilePos::new(4, 0));

        let path = graph
            .find_tile_path(TilePos::new(0, 0), TilePos::new(4, 0))
            .unwrap();
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn disconnected_components_give_empty_path() {
        let mut graph = RoadGraph::new();
        graph.lay_segment(TilePos::new(0, 0), TilePos::new(3, 0));
        graph.lay_segment(TilePos::new(0, 5), TilePos::new(3, 5));
        let path = graph
            .find_path(TilePos::new(0, 0), TilePos::new(3, 5))
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn off_road_endpoints_snap_to_nearest_node() {
        let mut graph = RoadGraph::new();
        graph.lay_segment(TilePos::new(0, 0), TilePos::new(4, 0));
        let path = graph
            .find_tile_path(TilePos::new(0, 2), TilePos::new(4, 1))
            .unwrap();
        assert_eq!(path.first(), Some(&TilePos::new(0, 0)));
        assert_eq!(path.last(), Some(&TilePos::new(4, 0)));
    }

    #[test]
    fn empty_graph_is_an_error() {
        let graph = RoadGraph::new();
        assert_eq!(
            graph.find_path(TilePos::new(0, 0), TilePos::new(1, 1)),
            Err(ParkError::NoRoadNetwork)
        );
    }

    #[test]
    fn remove_unlinks_neighbors() {
        let mut graph = RoadGraph::new();
        graph.lay_segment(TilePos::new(0, 0), TilePos::new(2, 0));
        graph.remove(TilePos::new(1, 0));
        assert!(graph.node(TilePos::new(0, 0)).unwrap().neighbors.is_empty());
        assert!(graph
            .find_path(TilePos::new(0, 0), TilePos::new(2, 0))
            .unwrap()
            .is_empty());
        assert_symmetric(&graph);
    }
}
