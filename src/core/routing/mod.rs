//! Routing service: one cached road graph per kitchen, restricted to the
//! component the kitchen sits in.

pub mod graph;
pub mod network;

pub use graph::{NodeIndex, RoadGraph, Route};
pub use network::{GridShape, NetworkEdge, NetworkNode, RoadNetwork};

use crate::core::dimensions::Location;
use crate::core::errors::RoutingError;
use crate::core::rng::{RngContext, StreamDomain};
use crate::core::types::{LocationId, METERS_PER_MILE};
use log::info;
use rand::Rng;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DRIVER_MPH: f64 = 25.0;

/// Neighbourhood radius around each kitchen
pub const DEFAULT_RADIUS_M: f64 = 4.0 * METERS_PER_MILE;

/// Minutes to drive `distance_m` at `mph`
pub fn drive_time_minutes(distance_m: f64, mph: f64) -> f64 {
    distance_m / METERS_PER_MILE / mph * 60.0
}

/// Where road networks come from
#[derive(Debug, Clone)]
pub struct GraphSource {
    /// Directory holding `graph_<code>.json`; networks missing there are
    /// synthesised and written back
    pub cache_dir: Option<PathBuf>,
    pub radius_m: f64,
    pub grid: GridShape,
}

impl GraphSource {
    pub fn new() -> Self {
        Self {
            cache_dir: None,
            radius_m: DEFAULT_RADIUS_M,
            grid: GridShape::default(),
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_grid(mut self, grid: GridShape) -> Self {
        self.grid = grid;
        self
    }

    pub fn cache_path(&self, location: &Location) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("graph_{}.json", location.location_code)))
    }

    /// Load the cached network for `location`, or build and cache it
    pub fn network_for(&self, location: &Location, ctx: &RngContext) -> Result<RoadNetwork, RoutingError> {
        if let Some(path) = self.cache_path(location) {
            if path.exists() {
                info!("Loading cached road network for {} from {}", location.location_code, path.display());
                return RoadNetwork::load(&path);
            }
        }

        info!("Building road network for {}", location.name);
        let mut rng = ctx.stream(StreamDomain::RoadNetwork, location.location_id as u64, 0);
        let network = RoadNetwork::street_grid(location.coord(), self.radius_m, &self.grid, &mut rng);

        if let Some(path) = self.cache_path(location) {
            network.save(&path)?;
        }
        Ok(network)
    }
}

impl Default for GraphSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Road graph, kitchen node and addressable destinations for one location
#[derive(Debug, Clone)]
pub struct LocationRoutes {
    pub location_id: LocationId,
    graph: RoadGraph,
    kitchen_node: NodeIndex,
    addressable: Vec<NodeIndex>,
}

impl LocationRoutes {
    pub fn build(location: &Location, network: &RoadNetwork, radius_m: f64) -> Result<Self, RoutingError> {
        let graph = RoadGraph::from_network(network, location.coord(), radius_m);
        let kitchen_node = graph
            .nearest_node(location.coord())
            .ok_or(RoutingError::EmptyGraph(location.location_id))?;
        let addressable = graph.component_of(kitchen_node);

        info!(
            "  {}: {} addressable nodes of {}",
            location.location_code,
            addressable.len(),
            graph.node_count()
        );

        Ok(Self {
            location_id: location.location_id,
            graph,
            kitchen_node,
            addressable,
        })
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn kitchen_node(&self) -> NodeIndex {
        self.kitchen_node
    }

    pub fn addressable(&self) -> &[NodeIndex] {
        &self.addressable
    }

    /// Uniformly random customer node from the kitchen's component
    pub fn sample_customer<R: Rng + ?Sized>(&self, rng: &mut R) -> NodeIndex {
        self.addressable[rng.gen_range(0..self.addressable.len())]
    }

    pub fn route_to(&self, customer: NodeIndex) -> Result<Route, RoutingError> {
        self.graph.shortest_route(self.kitchen_node, customer)
    }
}

/// Road graphs for every location, built once per generation run
#[derive(Debug, Clone, Default)]
pub struct RoutingService {
    routes: HashMap<LocationId, LocationRoutes>,
}

impl RoutingService {
    pub fn build(locations: &[Location], source: &GraphSource, ctx: &RngContext) -> Result<Self, RoutingError> {
        let mut routes = HashMap::new();
        for location in locations {
            let network = source.network_for(location, ctx)?;
            routes.insert(
                location.location_id,
                LocationRoutes::build(location, &network, source.radius_m)?,
            );
        }
        Ok(Self { routes })
    }

    pub fn from_routes(routes: impl IntoIterator<Item = LocationRoutes>) -> Self {
        Self {
            routes: routes.into_iter().map(|r| (r.location_id, r)).collect(),
        }
    }

    pub fn for_location(&self, location_id: LocationId) -> Result<&LocationRoutes, RoutingError> {
        self.routes
            .get(&location_id)
            .ok_or(RoutingError::UnknownLocation(location_id))
    }
}
