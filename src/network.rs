/*
 * Copyright (c) 2022 Frank Fischer <frank-fischer@shadow-soft.de>
 *
 * This program is free software: you can redistribute it and/or
 * modify it under the terms of the GNU General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see  <http://www.gnu.org/licenses/>
 */

//! The transport network of districts and routes.
//!
//! A network is a static directed graph. Districts are its nodes and are
//! created implicitly by the routes that reference them; every route is an
//! edge of its own, so parallel and reverse routes are independent
//! capacity channels.
//!
//! Networks are built in two steps: a [`NetworkBuilder`] collects districts
//! and edges and is then turned into a [`Network`] whose adjacency lists are
//! stored contiguously. For each district the outgoing edges come first,
//! followed by the incoming edges, both in insertion order.
//!
//! # Example
//!
//! ```
//! use rs_supply::config::Config;
//! use rs_supply::network::{Network, Route};
//!
//! let routes = vec![
//!     Route::new(1, "Dhaka", "Comilla", 50),
//!     Route::new(2, "Comilla", "Chittagong", 30),
//!     Route::new(3, "Dhaka", "Chittagong", 10),
//! ];
//! let net = Network::build(&routes, &Config::default()).unwrap();
//!
//! assert_eq!(net.num_nodes(), 3);
//! assert_eq!(net.num_edges(), 3);
//!
//! let dhaka = net.node("Dhaka").unwrap();
//! let neighs: Vec<_> = net.neighbors(dhaka).map(|(_, v, cap)| (net.name(v), cap)).collect();
//! assert_eq!(neighs, vec![("Comilla", 50), ("Chittagong", 10)]);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::slice::Iter as SliceIter;

use log::{debug, warn};

use crate::config::{Config, Direction, ParallelRoutePolicy, SelfLoopPolicy};
use crate::{Error, Result};

/// The capacity of a route.
pub type Capacity = u64;

/// The identifier of a route.
pub type RouteId = u64;

/// A directed route between two districts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: RouteId,
    pub source: String,
    pub destination: String,
    pub capacity: Capacity,
}

impl Route {
    pub fn new<S, D>(id: RouteId, source: S, destination: D, capacity: Capacity) -> Route
    where
        S: Into<String>,
        D: Into<String>,
    {
        Route {
            id,
            source: source.into(),
            destination: destination.into(),
            capacity,
        }
    }
}

/// A district of the network.
///
/// This is basically a newtype of the node index.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub struct Node(u32);

impl Node {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An edge of the network.
///
/// This is basically a newtype of the edge index.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub struct Edge(u32);

impl Edge {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct NodeData {
    firstout: u32,
    firstin: u32,
}

#[derive(Clone)]
struct EdgeData {
    nodes: [u32; 2],
    capacity: Capacity,
    route: RouteId,
    // `true` for the mirrored edge of a bidirectional route
    mirrored: bool,
}

/// A capacitated transport network.
pub struct Network {
    names: Vec<String>,
    index: HashMap<String, Node>,
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
    // The list of adjacencies. Each entry is `edge << 1` for an outgoing and
    // `edge << 1 | 1` for an incoming edge.
    adj: Vec<u32>,
}

/// Iterator over the outgoing or incoming edges of a district.
#[derive(Clone)]
pub struct NeighIt<'a> {
    net: &'a Network,
    it: SliceIter<'a, u32>,
}

impl<'a> Iterator for NeighIt<'a> {
    type Item = (Edge, Node);

    fn next(&mut self) -> Option<Self::Item> {
        let net = self.net;
        self.it.next().map(|&eid| {
            let i = eid as usize;
            (Edge(eid >> 1), Node(net.edges[i >> 1].nodes[1 - (i & 1)]))
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl Network {
    /// Build the network of a list of routes.
    ///
    /// Self-loops and parallel routes are handled according to `cfg`. With
    /// [`Direction::Bidirectional`] every route is followed by its mirrored
    /// edge.
    pub fn build(routes: &[Route], cfg: &Config) -> Result<Network> {
        let mut b = NetworkBuilder::with_capacities(routes.len(), routes.len());
        let mut pairs = HashSet::new();
        let mut ids = HashSet::new();

        for r in routes {
            if r.source.is_empty() || r.destination.is_empty() {
                return Err(Error::Validation {
                    route: r.id,
                    reason: "empty district name".to_string(),
                });
            }
            if !ids.insert(r.id) {
                return Err(Error::Validation {
                    route: r.id,
                    reason: "duplicate route id".to_string(),
                });
            }
            if r.source == r.destination {
                match cfg.self_loops {
                    SelfLoopPolicy::Reject => {
                        return Err(Error::Validation {
                            route: r.id,
                            reason: format!("self-loop at '{}'", r.source),
                        })
                    }
                    SelfLoopPolicy::Ignore => {
                        warn!("Ignore self-loop route {} at '{}'", r.id, r.source);
                        continue;
                    }
                }
            }

            let u = b.add_district(&r.source);
            let v = b.add_district(&r.destination);
            if !pairs.insert((u, v)) && cfg.parallel_routes == ParallelRoutePolicy::Reject {
                return Err(Error::Validation {
                    route: r.id,
                    reason: format!("parallel route '{}' -> '{}'", r.source, r.destination),
                });
            }

            b.add_edge(u, v, r.capacity, r.id, false);
            if cfg.direction == Direction::Bidirectional {
                b.add_edge(v, u, r.capacity, r.id, true);
            }
        }

        let net = b.into_network();
        debug!(
            "Built network with {} districts and {} edges from {} routes",
            net.num_nodes(),
            net.num_edges(),
            routes.len()
        );
        Ok(net)
    }

    /// Return the number of districts.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of edges.
    ///
    /// This is the number of routes unless routes are bidirectional or
    /// self-loops have been dropped.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Return an iterator over all districts.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + Clone {
        (0..self.nodes.len() as u32).map(Node)
    }

    /// Return an iterator over all edges.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + Clone {
        (0..self.edges.len() as u32).map(Edge)
    }

    /// Return the names of all districts in order of first appearance.
    pub fn districts(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Return `true` if the network contains a district with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Return the district with the given name.
    pub fn node(&self, name: &str) -> Option<Node> {
        self.index.get(name).copied()
    }

    /// Return the name of a district.
    pub fn name(&self, u: Node) -> &str {
        &self.names[u.index()]
    }

    pub fn node_id(&self, u: Node) -> usize {
        u.index()
    }

    pub fn edge_id(&self, e: Edge) -> usize {
        e.index()
    }

    pub fn id2edge(&self, id: usize) -> Edge {
        debug_assert!(id < self.edges.len(), "Invalid edge id: {}, must be in 0..{}", id, self.edges.len());
        Edge(id as u32)
    }

    /// Return the source district of an edge.
    pub fn src(&self, e: Edge) -> Node {
        Node(self.edges[e.index()].nodes[0])
    }

    /// Return the destination district of an edge.
    pub fn snk(&self, e: Edge) -> Node {
        Node(self.edges[e.index()].nodes[1])
    }

    /// Return the capacity of an edge.
    pub fn capacity(&self, e: Edge) -> Capacity {
        self.edges[e.index()].capacity
    }

    /// Return the id of the route an edge belongs to.
    pub fn route_id(&self, e: Edge) -> RouteId {
        self.edges[e.index()].route
    }

    /// Return `true` if `e` is the mirrored edge of a bidirectional route.
    pub fn is_mirrored(&self, e: Edge) -> bool {
        self.edges[e.index()].mirrored
    }

    /// Return the outgoing edges of a district with their end districts.
    pub fn outedges(&self, u: Node) -> NeighIt<'_> {
        let uid = u.index();
        let beg = self.nodes[uid].firstout as usize;
        let end = self.nodes[uid].firstin as usize;
        NeighIt {
            net: self,
            it: self.adj[beg..end].iter(),
        }
    }

    /// Return the incoming edges of a district with their start districts.
    pub fn inedges(&self, u: Node) -> NeighIt<'_> {
        let uid = u.index();
        let beg = self.nodes[uid].firstin as usize;
        let end = self
            .nodes
            .get(uid + 1)
            .map(|n| n.firstout as usize)
            .unwrap_or_else(|| self.adj.len());
        NeighIt {
            net: self,
            it: self.adj[beg..end].iter(),
        }
    }

    /// Return the outgoing edges of a district with their capacities.
    pub fn neighbors(&self, u: Node) -> impl Iterator<Item = (Edge, Node, Capacity)> + '_ {
        self.outedges(u).map(move |(e, v)| (e, v, self.capacity(e)))
    }

    // Raw adjacency entries of `u`: outgoing edges as `e << 1`, then incoming
    // edges as `e << 1 | 1`.
    pub(crate) fn adjacency(&self, u: Node) -> impl Iterator<Item = (usize, usize)> + '_ {
        let uid = u.index();
        let beg = self.nodes[uid].firstout as usize;
        let end = self
            .nodes
            .get(uid + 1)
            .map(|n| n.firstout as usize)
            .unwrap_or_else(|| self.adj.len());
        self.adj[beg..end].iter().map(move |&eid| {
            let i = eid as usize;
            (i, self.edges[i >> 1].nodes[1 - (i & 1)] as usize)
        })
    }
}

/// A builder for a [`Network`].
///
/// The basic task is to arrange the final outgoing and incoming edges of
/// each district appropriately (i.e. first outgoing, then incoming edges).
pub struct NetworkBuilder {
    names: Vec<String>,
    index: HashMap<String, Node>,
    /// The outgoing and incoming edges of each district.
    nodes: Vec<[Vec<u32>; 2]>,
    edges: Vec<EdgeData>,
}

impl NetworkBuilder {
    /// Create a new, empty builder with reserved memory.
    pub fn with_capacities(nnodes: usize, nedges: usize) -> Self {
        NetworkBuilder {
            names: Vec::with_capacity(nnodes),
            index: HashMap::with_capacity(nnodes),
            nodes: Vec::with_capacity(nnodes),
            edges: Vec::with_capacity(nedges),
        }
    }

    /// Return the district with the given name, adding it if necessary.
    pub fn add_district(&mut self, name: &str) -> Node {
        if let Some(&u) = self.index.get(name) {
            return u;
        }
        assert!(self.nodes.len() < u32::max_value() as usize, "Node capacity exceeded");
        let u = Node(self.nodes.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), u);
        self.nodes.push([vec![], vec![]]);
        u
    }

    /// Add a new edge from `u` to `v`.
    pub fn add_edge(&mut self, u: Node, v: Node, capacity: Capacity, route: RouteId, mirrored: bool) -> Edge {
        assert!(
            self.edges.len() * 2 + 2 < u32::max_value() as usize,
            "Edge capacity exceeded"
        );
        let eid = self.edges.len() as u32;
        self.edges.push(EdgeData {
            nodes: [u.0, v.0],
            capacity,
            route,
            mirrored,
        });
        self.nodes[u.index()][0].push(eid << 1);
        self.nodes[v.index()][1].push((eid << 1) | 1);
        Edge(eid)
    }

    /// Turn the builder into a network.
    pub fn into_network(self) -> Network {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut adj = Vec::with_capacity(self.edges.len() * 2);

        for [outs, ins] in self.nodes.into_iter() {
            nodes.push(NodeData {
                firstout: adj.len() as u32,
                firstin: (adj.len() + outs.len()) as u32,
            });
            adj.extend(outs);
            adj.extend(ins);
        }

        Network {
            names: self.names,
            index: self.index,
            nodes,
            edges: self.edges,
            adj,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Network, Route};
    use crate::config::{Config, Direction, ParallelRoutePolicy, SelfLoopPolicy};
    use crate::Error;

    fn routes() -> Vec<Route> {
        vec![
            Route::new(1, "Dhaka", "Comilla", 50),
            Route::new(2, "Comilla", "Chittagong", 30),
            Route::new(3, "Dhaka", "Chittagong", 10),
            Route::new(4, "Chittagong", "Dhaka", 0),
        ]
    }

    #[test]
    fn test_build() {
        let net = Network::build(&routes(), &Config::default()).unwrap();
        assert_eq!(net.districts().collect::<Vec<_>>(), vec!["Dhaka", "Comilla", "Chittagong"]);
        assert_eq!(net.num_edges(), 4);
        assert!(net.contains("Comilla"));
        assert!(!net.contains("Sylhet"));

        for e in net.edges() {
            let r = &routes()[e.index()];
            assert_eq!(net.name(net.src(e)), r.source);
            assert_eq!(net.name(net.snk(e)), r.destination);
            assert_eq!(net.capacity(e), r.capacity);
            assert_eq!(net.route_id(e), r.id);
            assert!(!net.is_mirrored(e));
        }
    }

    #[test]
    fn test_adjacencies() {
        let net = Network::build(&routes(), &Config::default()).unwrap();
        for u in net.nodes() {
            for (e, v) in net.outedges(u) {
                assert_eq!(net.src(e), u);
                assert_eq!(net.snk(e), v);
            }
            for (e, v) in net.inedges(u) {
                assert_eq!(net.src(e), v);
                assert_eq!(net.snk(e), u);
            }
        }

        let chittagong = net.node("Chittagong").unwrap();
        let ins: Vec<_> = net.inedges(chittagong).map(|(_, v)| net.name(v)).collect();
        assert_eq!(ins, vec!["Comilla", "Dhaka"]);
        let outs: Vec<_> = net.neighbors(chittagong).map(|(_, v, c)| (net.name(v), c)).collect();
        assert_eq!(outs, vec![("Dhaka", 0)]);
    }

    #[test]
    fn test_self_loops() {
        let mut rs = routes();
        rs.push(Route::new(7, "Comilla", "Comilla", 5));

        match Network::build(&rs, &Config::default()) {
            Err(Error::Validation { route, .. }) => assert_eq!(route, 7),
            _ => panic!("self-loop must be rejected"),
        }

        let cfg = Config {
            self_loops: SelfLoopPolicy::Ignore,
            ..Config::default()
        };
        let net = Network::build(&rs, &cfg).unwrap();
        assert_eq!(net.num_edges(), 4);
    }

    #[test]
    fn test_parallel_routes() {
        let mut rs = routes();
        rs.push(Route::new(8, "Dhaka", "Comilla", 20));

        let net = Network::build(&rs, &Config::default()).unwrap();
        let dhaka = net.node("Dhaka").unwrap();
        let caps: Vec<_> = net.neighbors(dhaka).map(|(_, v, c)| (net.name(v), c)).collect();
        assert_eq!(caps, vec![("Comilla", 50), ("Chittagong", 10), ("Comilla", 20)]);

        let cfg = Config {
            parallel_routes: ParallelRoutePolicy::Reject,
            ..Config::default()
        };
        assert!(matches!(Network::build(&rs, &cfg), Err(Error::Validation { route: 8, .. })));
        // a reverse route is not parallel
        assert!(Network::build(&routes(), &cfg).is_ok());
    }

    #[test]
    fn test_bidirectional() {
        let cfg = Config {
            direction: Direction::Bidirectional,
            ..Config::default()
        };
        let net = Network::build(&routes()[..1], &cfg).unwrap();
        assert_eq!(net.num_edges(), 2);
        let e = net.id2edge(1);
        assert!(net.is_mirrored(e));
        assert_eq!(net.route_id(e), 1);
        assert_eq!(net.name(net.src(e)), "Comilla");
        assert_eq!(net.capacity(e), 50);
    }

    #[test]
    fn test_duplicate_ids() {
        let mut rs = routes();
        rs.push(Route::new(1, "Dhaka", "Sylhet", 20));
        match Network::build(&rs, &Config::default()) {
            Err(Error::Validation { route, reason }) => {
                assert_eq!(route, 1);
                assert_eq!(reason, "duplicate route id");
            }
            _ => panic!("repeated route id must be rejected"),
        }

        // an ignored self-loop still claims its id
        rs.pop();
        rs.push(Route::new(5, "Sylhet", "Sylhet", 3));
        rs.push(Route::new(5, "Sylhet", "Dhaka", 3));
        let cfg = Config {
            self_loops: SelfLoopPolicy::Ignore,
            ..Config::default()
        };
        assert!(matches!(Network::build(&rs, &cfg), Err(Error::Validation { route: 5, .. })));
    }

    #[test]
    fn test_empty_name() {
        let rs = vec![Route::new(1, "", "Comilla", 5)];
        assert!(matches!(
            Network::build(&rs, &Config::default()),
            Err(Error::Validation { route: 1, .. })
        ));
    }

    #[test]
    fn test_empty() {
        let net = Network::build(&[], &Config::default()).unwrap();
        assert_eq!(net.num_nodes(), 0);
        assert_eq!(net.num_edges(), 0);
        assert!(net.node("Dhaka").is_none());
    }
}
