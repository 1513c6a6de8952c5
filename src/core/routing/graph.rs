use super::network::RoadNetwork;
use crate::core::errors::RoutingError;
use crate::core::types::Coord;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// Index of a node inside a `RoadGraph`
pub type NodeIndex = usize;

#[derive(Debug, Clone, Copy)]
struct Arc {
    to: NodeIndex,
    length_m: f64,
}

/// A shortest path between two graph nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes: Vec<NodeIndex>,
    /// Node coordinates in travel order
    pub points: Vec<Coord>,
    pub distance_m: f64,
    /// True when only the undirected graph connected the endpoints
    pub undirected: bool,
}

/// Dijkstra frontier entry, min-ordered on distance then insertion order
#[derive(Debug)]
struct Frontier {
    distance_m: f64,
    sequence_num: u64,
    node: NodeIndex,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .distance_m
            .total_cmp(&self.distance_m)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Drivable road graph around one kitchen.
///
/// Read-only once built; shared by every order sampled at its location.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    node_ids: Vec<u64>,
    coords: Vec<Coord>,
    outgoing: Vec<Vec<Arc>>,
    undirected: Vec<Vec<Arc>>,
}

impl RoadGraph {
    /// Cut `network` down to the nodes within `radius_m` of `center`
    pub fn from_network(network: &RoadNetwork, center: Coord, radius_m: f64) -> Self {
        let mut graph = RoadGraph::default();
        let mut index: HashMap<u64, NodeIndex> = HashMap::new();

        for node in &network.nodes {
            let coord = Coord::new(node.lat, node.lon);
            if center.haversine_m(&coord) > radius_m || index.contains_key(&node.id) {
                continue;
            }
            index.insert(node.id, graph.node_ids.len());
            graph.node_ids.push(node.id);
            graph.coords.push(coord);
        }

        graph.outgoing = vec![Vec::new(); graph.node_ids.len()];
        graph.undirected = vec![Vec::new(); graph.node_ids.len()];

        for edge in &network.edges {
            let (Some(&from), Some(&to)) = (index.get(&edge.from), index.get(&edge.to)) else {
                continue;
            };
            if !edge.length_m.is_finite() || edge.length_m < 0.0 {
                continue;
            }
            let length_m = edge.length_m;
            graph.outgoing[from].push(Arc { to, length_m });
            graph.undirected[from].push(Arc { to, length_m });
            graph.undirected[to].push(Arc { to: from, length_m });
        }

        graph
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn node_id(&self, node: NodeIndex) -> u64 {
        self.node_ids[node]
    }

    pub fn coord(&self, node: NodeIndex) -> Coord {
        self.coords[node]
    }

    /// Graph node closest to `coord`
    pub fn nearest_node(&self, coord: Coord) -> Option<NodeIndex> {
        self.coords
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| coord.haversine_m(a).total_cmp(&coord.haversine_m(b)))
            .map(|(idx, _)| idx)
    }

    /// Nodes weakly connected to `start`, in ascending index order
    pub fn component_of(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = vec![false; self.node_count()];
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(node) = queue.pop_front() {
            for arc in &self.undirected[node] {
                if !seen[arc.to] {
                    seen[arc.to] = true;
                    queue.push_back(arc.to);
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter_map(|(idx, hit)| hit.then_some(idx))
            .collect()
    }

    /// Shortest path by length; falls back to the undirected graph when
    /// one-way streets leave no directed path.
    pub fn shortest_route(&self, from: NodeIndex, to: NodeIndex) -> Result<Route, RoutingError> {
        if let Some((nodes, distance_m)) = dijkstra(&self.outgoing, from, to) {
            return Ok(self.route(nodes, distance_m, false));
        }
        if let Some((nodes, distance_m)) = dijkstra(&self.undirected, from, to) {
            return Ok(self.route(nodes, distance_m, true));
        }
        Err(RoutingError::NoPath {
            from: self.node_ids[from],
            to: self.node_ids[to],
        })
    }

    fn route(&self, nodes: Vec<NodeIndex>, distance_m: f64, undirected: bool) -> Route {
        let points = nodes.iter().map(|&n| self.coords[n]).collect();
        Route {
            nodes,
            points,
            distance_m,
            undirected,
        }
    }
}

fn dijkstra(adjacency: &[Vec<Arc>], from: NodeIndex, to: NodeIndex) -> Option<(Vec<NodeIndex>, f64)> {
    let mut best = vec![f64::INFINITY; adjacency.len()];
    let mut previous: Vec<Option<NodeIndex>> = vec![None; adjacency.len()];
    let mut heap = BinaryHeap::new();
    let mut sequence_counter = 0u64;

    best[from] = 0.0;
    heap.push(Frontier {
        distance_m: 0.0,
        sequence_num: sequence_counter,
        node: from,
    });

    while let Some(Frontier { distance_m, node, .. }) = heap.pop() {
        if node == to {
            break;
        }
        if distance_m > best[node] {
            continue;
        }
        for arc in &adjacency[node] {
            let candidate = distance_m + arc.length_m;
            if candidate < best[arc.to] {
                best[arc.to] = candidate;
                previous[arc.to] = Some(node);
                sequence_counter += 1;
                heap.push(Frontier {
                    distance_m: candidate,
                    sequence_num: sequence_counter,
                    node: arc.to,
                });
            }
        }
    }

    if !best[to].is_finite() {
        return None;
    }

    let mut path = vec![to];
    let mut cursor = to;
    while let Some(prev) = previous[cursor] {
        path.push(prev);
        cursor = prev;
    }
    path.reverse();
    Some((path, best[to]))
}
