use crate::core::errors::RoutingError;
use crate::core::types::Coord;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
}

/// Directed road segment; two-way streets appear once per direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub from: u64,
    pub to: u64,
    pub length_m: f64,
}

/// Raw drivable street network, as extracted or cached on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetwork {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

/// Shape of a synthesised street grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridShape {
    pub block_m: f64,
    /// Share of segments that are one-way
    pub one_way_ratio: f64,
    /// Share of segments missing entirely
    pub missing_ratio: f64,
    /// Node position jitter as a share of the block length
    pub jitter_ratio: f64,
}

impl Default for GridShape {
    fn default() -> Self {
        Self {
            block_m: 250.0,
            one_way_ratio: 0.12,
            missing_ratio: 0.05,
            jitter_ratio: 0.15,
        }
    }
}

impl RoadNetwork {
    pub fn load(path: &Path) -> Result<Self, RoutingError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RoutingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| RoutingError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), RoutingError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RoutingError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let raw = serde_json::to_string(self).map_err(|source| RoutingError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, raw).map_err(|source| RoutingError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Perturbed street grid covering the square around `center`.
    ///
    /// Some segments are one-way and some are missing, so the grid has
    /// dead ends, unreachable pockets and directed-only gaps like a real
    /// street extract.
    pub fn street_grid<R: Rng + ?Sized>(center: Coord, radius_m: f64, shape: &GridShape, rng: &mut R) -> Self {
        let half = (radius_m / shape.block_m).ceil() as i64;
        let side = (2 * half + 1) as u64;
        let node_id = |row: i64, col: i64| ((row + half) as u64) * side + (col + half) as u64 + 1;
        let jitter = shape.block_m * shape.jitter_ratio;

        let mut network = RoadNetwork::default();
        for row in -half..=half {
            for col in -half..=half {
                let north = row as f64 * shape.block_m + rng.gen_range(-jitter..=jitter);
                let east = col as f64 * shape.block_m + rng.gen_range(-jitter..=jitter);
                let coord = center.offset_m(north, east);
                network.nodes.push(NetworkNode {
                    id: node_id(row, col),
                    lat: coord.lat,
                    lon: coord.lon,
                });
            }
        }

        let coord_of = |id: u64| {
            let n = &network.nodes[(id - 1) as usize];
            Coord::new(n.lat, n.lon)
        };

        let mut edges = Vec::new();
        for row in -half..=half {
            for col in -half..=half {
                let from = node_id(row, col);
                let neighbours = [(row, col + 1), (row + 1, col)];
                for (r, c) in neighbours {
                    if r > half || c > half {
                        continue;
                    }
                    if rng.gen_bool(shape.missing_ratio) {
                        continue;
                    }
                    let to = node_id(r, c);
                    // Streets are rarely straight; stretch the chord a little
                    let length_m = coord_of(from).haversine_m(&coord_of(to)) * rng.gen_range(1.0..1.15);
                    if rng.gen_bool(shape.one_way_ratio) {
                        let (a, b) = if rng.gen_bool(0.5) { (from, to) } else { (to, from) };
                        edges.push(NetworkEdge { from: a, to: b, length_m });
                    } else {
                        edges.push(NetworkEdge { from, to, length_m });
                        edges.push(NetworkEdge { from: to, to: from, length_m });
                    }
                }
            }
        }
        network.edges = edges;
        network
    }
}
