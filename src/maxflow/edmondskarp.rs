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

//! This module implements the max flow algorithm of Edmonds-Karp.
//!
//! Each route `e` of the network is represented by two residual channels:
//! the forward channel `2e` and the backward channel `2e+1`. The residual
//! capacity of a channel is stored at its partner, so `flow[2e]` is the
//! flow on `e` and `flow[2e+1]` its remaining capacity. A caller-declared
//! reverse route is a different edge with channels of its own.
//!
//! Augmenting paths are found by breadth-first search. The neighbors of a
//! district are visited in a fixed order (outgoing routes, then incoming
//! routes, both in insertion order), so the flow is reproducible.
//!
//! # Example
//!
//! ```
//! use rs_supply::config::Config;
//! use rs_supply::maxflow::edmondskarp;
//! use rs_supply::network::{Network, Route};
//!
//! let routes = vec![
//!     Route::new(1, "s", "a", 5),
//!     Route::new(2, "s", "c", 5),
//!     Route::new(3, "a", "b", 2),
//!     Route::new(4, "a", "c", 1),
//!     Route::new(5, "a", "d", 1),
//!     Route::new(6, "c", "d", 2),
//!     Route::new(7, "d", "b", 2),
//!     Route::new(8, "b", "t", 4),
//!     Route::new(9, "d", "t", 5),
//! ];
//! let g = Network::build(&routes, &Config::default()).unwrap();
//! let s = g.node("s").unwrap();
//! let t = g.node("t").unwrap();
//!
//! let (value, flow, mincut) = edmondskarp(&g, s, t, |e| g.capacity(e));
//!
//! assert_eq!(value, 5);
//! assert!(flow.iter().all(|&(e, f)| f <= g.capacity(e)));
//! assert!(g.nodes().filter(|&u| u != s && u != t).all(|u| {
//!     g.outedges(u).map(|(e, _)| flow[g.edge_id(e)].1).sum::<u64>() ==
//!     g.inedges(u).map(|(e, _)| flow[g.edge_id(e)].1).sum::<u64>()
//! }));
//!
//! let mut cut: Vec<_> = mincut.into_iter().map(|u| g.name(u)).collect();
//! cut.sort();
//! assert_eq!(cut, vec!["a", "c", "s"]);
//! ```

use std::cmp::min;
use std::collections::VecDeque;

use log::{debug, info};

use crate::assemble::FlowResult;
use crate::cancel::Cancel;
use crate::error::Endpoint;
use crate::network::{Edge, Network, Node};
use crate::num::traits::NumAssign;
use crate::{Error, Result};

const NONE: (usize, usize) = (usize::MAX, usize::MAX);

/// Max-flow algorithm of Edmonds and Karp.
pub struct EdmondsKarp<'a, F> {
    g: &'a Network,
    neighs: Vec<Vec<(usize, usize)>>,
    pred: Vec<(usize, usize)>,
    flow: Vec<F>,
    queue: VecDeque<usize>,
    value: F,
    niter: usize,
}

impl<'a, F> EdmondsKarp<'a, F>
where
    F: NumAssign + Ord + Copy,
{
    /// Create a new Edmonds-Karp algorithm instance for a network.
    pub fn new(g: &'a Network) -> Self {
        EdmondsKarp {
            g,
            neighs: g.nodes().map(|u| g.adjacency(u).collect()).collect(),
            pred: vec![NONE; g.num_nodes()],
            flow: vec![F::zero(); g.num_edges() * 2],
            queue: VecDeque::with_capacity(g.num_nodes()),
            value: F::zero(),
            niter: 0,
        }
    }

    /// Return the underlying network.
    pub fn as_network(&self) -> &'a Network {
        self.g
    }

    /// Return the value of the latest computed maximum flow.
    pub fn value(&self) -> F {
        self.value
    }

    /// Return the flow value on edge `e`
    pub fn flow(&self, e: Edge) -> F {
        self.flow[self.g.edge_id(e) << 1]
    }

    /// Return the number of augmenting paths of the latest run.
    pub fn num_iterations(&self) -> usize {
        self.niter
    }

    /// Solve the maxflow problem.
    ///
    /// The method solves the max flow problem from the source node `src` to
    /// the sink node `snk` with the given `upper` bounds on the edges.
    ///
    /// # Panics
    ///
    /// Panics if `src == snk`.
    pub fn solve<Us>(&mut self, src: Node, snk: Node, upper: Us)
    where
        Us: Fn(Edge) -> F,
    {
        self.augment(src, snk, upper, || false);
    }

    /// Solve the maxflow problem unless `cancel` fires.
    ///
    /// The token is checked before each augmenting path search. If it fires,
    /// the flow is reset to zero and `Error::Cancelled` is returned.
    pub fn solve_with<Us>(&mut self, src: Node, snk: Node, upper: Us, cancel: &Cancel) -> Result<()>
    where
        Us: Fn(Edge) -> F,
    {
        if self.augment(src, snk, upper, || cancel.is_cancelled()) {
            Ok(())
        } else {
            debug!("Max-flow cancelled after {} augmentations", self.niter);
            for flw in self.flow.iter_mut() {
                *flw = F::zero();
            }
            self.value = F::zero();
            Err(Error::Cancelled)
        }
    }

    // Run the augmenting path loop. Returns `false` if `stop` fired.
    fn augment<Us, St>(&mut self, src: Node, snk: Node, upper: Us, stop: St) -> bool
    where
        Us: Fn(Edge) -> F,
        St: Fn() -> bool,
    {
        let src = self.g.node_id(src);
        let snk = self.g.node_id(snk);
        assert_ne!(src, snk, "Source and sink node must not be equal");

        // initialize network flow
        for (e, flw) in self.flow.iter_mut().enumerate() {
            *flw = if (e & 1) == 0 {
                F::zero()
            } else {
                upper(self.g.id2edge(e >> 1))
            };
        }
        self.value = F::zero();
        self.niter = 0;
        self.pred.fill(NONE);
        // just some dummy edge
        self.pred[src] = (0, 0);

        // nothing to do if there is no edge
        if self.g.num_edges() == 0 {
            return true;
        }

        loop {
            if stop() {
                return false;
            }

            // do bfs from source to sink
            self.pred.fill(NONE);
            self.pred[src] = (0, 0);
            self.queue.clear();
            self.queue.push_back(src);
            'bfs: while let Some(u) = self.queue.pop_front() {
                for &(e, v) in &self.neighs[u] {
                    if self.pred[v] == NONE && !self.flow[e ^ 1].is_zero() {
                        self.pred[v] = (e, u);
                        self.queue.push_back(v);
                        if v == snk {
                            break 'bfs;
                        }
                    }
                }
            }

            // sink cannot be reached -> stop
            if self.pred[snk] == NONE {
                break;
            }

            // compute augmentation value
            let mut v = snk;
            let mut df = self.flow[self.pred[v].0 ^ 1];
            while v != src {
                let (e, u) = self.pred[v];
                df = min(df, self.flow[e ^ 1]);
                v = u;
            }

            debug_assert!(!df.is_zero());

            // now augment the flow
            let mut v = snk;
            while v != src {
                let (e, u) = self.pred[v];
                self.flow[e] += df;
                self.flow[e ^ 1] -= df;
                v = u;
            }

            self.value += df;
            self.niter += 1;
        }

        true
    }

    /// Return the minimal cut associated with the last maximum flow.
    ///
    /// These are the districts reachable from the source in the final
    /// residual network.
    pub fn mincut(&self) -> Vec<Node> {
        self.g.nodes().filter(|&u| self.pred[self.g.node_id(u)] != NONE).collect()
    }
}

/// Solve the maxflow problem using the algorithm of Edmonds-Karp.
///
/// The function solves the max flow problem from the source node `src` to
/// the sink node `snk` with the given `upper` bounds on the edges.
///
/// The function returns the flow value, the flow on each edge and the
/// nodes in a minimal cut.
pub fn edmondskarp<F, Us>(g: &Network, src: Node, snk: Node, upper: Us) -> (F, Vec<(Edge, F)>, Vec<Node>)
where
    F: NumAssign + Ord + Copy,
    Us: Fn(Edge) -> F,
{
    let mut maxflow = EdmondsKarp::new(g);
    maxflow.solve(src, snk, upper);
    (
        maxflow.value(),
        g.edges().map(|e| (e, maxflow.flow(e))).collect(),
        maxflow.mincut(),
    )
}

/// Compute a maximum flow between two districts given by name.
///
/// # Errors
///
/// - `Error::DegenerateRequest` if `source == sink`,
/// - `Error::InvalidEndpoint` if one of the districts is not in the network.
///
/// An unreachable sink is not an error, the flow value is then 0.
///
/// # Example
///
/// ```
/// use rs_supply::config::Config;
/// use rs_supply::maxflow::max_flow;
/// use rs_supply::network::{Network, Route};
///
/// let routes = vec![
///     Route::new(1, "Dhaka", "Comilla", 50),
///     Route::new(2, "Comilla", "Chittagong", 30),
///     Route::new(3, "Dhaka", "Chittagong", 10),
/// ];
/// let net = Network::build(&routes, &Config::default()).unwrap();
/// let res = max_flow(&net, "Dhaka", "Chittagong").unwrap();
///
/// assert_eq!(res.max_flow, 40);
/// assert_eq!(res.details["Dhaka"]["Comilla"], 30);
/// assert_eq!(res.details["Dhaka"]["Chittagong"], 10);
/// assert_eq!(res.details["Comilla"]["Chittagong"], 30);
/// ```
pub fn max_flow(net: &Network, source: &str, sink: &str) -> Result<FlowResult> {
    max_flow_with(net, source, sink, &Cancel::new())
}

/// Compute a maximum flow between two districts, checking `cancel` between
/// augmenting paths.
pub fn max_flow_with(net: &Network, source: &str, sink: &str, cancel: &Cancel) -> Result<FlowResult> {
    let (src, snk) = endpoints(net, source, sink)?;

    let mut solver = EdmondsKarp::new(net);
    solver.solve_with(src, snk, |e| net.capacity(e), cancel)?;
    info!(
        "Max-flow from '{}' to '{}': {} ({} augmenting paths)",
        source,
        sink,
        solver.value(),
        solver.num_iterations()
    );

    Ok(FlowResult::from_solver(&solver, src, snk))
}

fn endpoints(net: &Network, source: &str, sink: &str) -> Result<(Node, Node)> {
    if source == sink {
        return Err(Error::DegenerateRequest {
            district: source.to_string(),
        });
    }
    let src = net.node(source).ok_or_else(|| Error::InvalidEndpoint {
        district: source.to_string(),
        role: Endpoint::Source,
    })?;
    let snk = net.node(sink).ok_or_else(|| Error::InvalidEndpoint {
        district: sink.to_string(),
        role: Endpoint::Sink,
    })?;
    Ok((src, snk))
}

#[cfg(test)]
mod tests {
    use super::{edmondskarp, max_flow, max_flow_with, EdmondsKarp};
    use crate::cancel::Cancel;
    use crate::config::{Config, Direction};
    use crate::error::Endpoint;
    use crate::network::{Network, Route};
    use crate::Error;

    fn net(routes: &[(&str, &str, u64)]) -> Network {
        let routes: Vec<_> = routes
            .iter()
            .enumerate()
            .map(|(i, &(u, v, c))| Route::new(i as u64 + 1, u, v, c))
            .collect();
        Network::build(&routes, &Config::default()).unwrap()
    }

    #[test]
    fn test_edmondskarp() {
        let g = net(&[
            ("s", "v1", 15),
            ("s", "v3", 10),
            ("v1", "v2", 6),
            ("v1", "v3", 7),
            ("v2", "t", 5),
            ("v2", "v4", 2),
            ("v3", "v2", 11),
            ("v3", "v4", 4),
            ("v4", "v2", 4),
            ("v4", "t", 20),
        ]);
        let s = g.node("s").unwrap();
        let t = g.node("t").unwrap();
        let (value, flow, mincut) = edmondskarp(&g, s, t, |e| g.capacity(e));

        assert_eq!(value, 11);
        assert!(flow.iter().all(|&(e, f)| f <= g.capacity(e)));
        assert!(g.nodes().filter(|&u| u != s && u != t).all(|u| {
            g.outedges(u).map(|(e, _)| flow[g.edge_id(e)].1).sum::<u64>()
                == g.inedges(u).map(|(e, _)| flow[g.edge_id(e)].1).sum::<u64>()
        }));

        let cut: u64 = g
            .edges()
            .filter(|&e| mincut.contains(&g.src(e)) && !mincut.contains(&g.snk(e)))
            .map(|e| g.capacity(e))
            .sum();
        assert_eq!(cut, 11);
    }

    #[test]
    fn test_scenario() {
        let g = net(&[("Dhaka", "Comilla", 50), ("Comilla", "Chittagong", 30), ("Dhaka", "Chittagong", 10)]);
        let res = max_flow(&g, "Dhaka", "Chittagong").unwrap();
        assert_eq!(res.max_flow, 40);
        assert_eq!(res.details.len(), 2);
        assert_eq!(res.details["Dhaka"].len(), 2);
        assert_eq!(res.details["Comilla"]["Chittagong"], 30);
        assert_eq!(res.min_cut, vec!["Dhaka", "Comilla"]);
    }

    #[test]
    fn test_reverse_route_is_independent() {
        // the declared reverse route must not be mistaken for a residual
        let g = net(&[("a", "b", 4), ("b", "a", 7), ("b", "c", 10)]);
        let res = max_flow(&g, "a", "c").unwrap();
        assert_eq!(res.max_flow, 4);
        assert!(!res.details.contains_key("b") || !res.details["b"].contains_key("a"));

        let res = max_flow(&g, "b", "a").unwrap();
        assert_eq!(res.max_flow, 7);
    }

    #[test]
    fn test_parallel_routes() {
        let g = net(&[("a", "b", 4), ("a", "b", 3), ("b", "c", 10)]);
        let res = max_flow(&g, "a", "c").unwrap();
        assert_eq!(res.max_flow, 7);
        assert_eq!(res.details["a"]["b"], 7);
        assert_eq!(res.route_flows.len(), 3);
    }

    #[test]
    fn test_cycle() {
        let g = net(&[("s", "a", 10), ("a", "b", 8), ("b", "a", 8), ("b", "t", 6), ("a", "t", 3)]);
        let res = max_flow(&g, "s", "t").unwrap();
        assert_eq!(res.max_flow, 9);
    }

    #[test]
    fn test_disconnected() {
        let g = net(&[("a", "b", 4), ("c", "d", 3)]);
        let res = max_flow(&g, "a", "d").unwrap();
        assert_eq!(res.max_flow, 0);
        assert!(res.details.is_empty());
        assert_eq!(res.min_cut, vec!["a", "b"]);

        let g = net(&[("a", "b", 0), ("b", "c", 0)]);
        let res = max_flow(&g, "a", "c").unwrap();
        assert_eq!(res.max_flow, 0);
        assert!(res.details.is_empty());
    }

    #[test]
    fn test_endpoints() {
        let g = net(&[("a", "b", 4)]);
        assert!(matches!(max_flow(&g, "a", "a"), Err(Error::DegenerateRequest { .. })));
        match max_flow(&g, "x", "b") {
            Err(Error::InvalidEndpoint { district, role }) => {
                assert_eq!(district, "x");
                assert_eq!(role, Endpoint::Source);
            }
            _ => panic!("unknown source must be rejected"),
        }
        assert!(matches!(
            max_flow(&g, "a", "y"),
            Err(Error::InvalidEndpoint {
                role: Endpoint::Sink,
                ..
            })
        ));
    }

    #[test]
    fn test_bidirectional() {
        let routes = vec![Route::new(1, "a", "b", 5), Route::new(2, "c", "b", 3)];
        let cfg = Config {
            direction: Direction::Bidirectional,
            ..Config::default()
        };
        let g = Network::build(&routes, &cfg).unwrap();
        let res = max_flow(&g, "a", "c").unwrap();
        assert_eq!(res.max_flow, 3);
        assert_eq!(res.details["b"]["c"], 3);
    }

    #[test]
    fn test_cancel() {
        let g = net(&[("a", "b", 4), ("b", "c", 3)]);
        let cancel = Cancel::new();
        cancel.cancel();
        assert!(matches!(max_flow_with(&g, "a", "c", &cancel), Err(Error::Cancelled)));

        let mut ek = EdmondsKarp::new(&g);
        let (a, c) = (g.node("a").unwrap(), g.node("c").unwrap());
        assert!(ek.solve_with(a, c, |e| g.capacity(e), &cancel).is_err());
        assert_eq!(ek.value(), 0);
        ek.solve(a, c, |e| g.capacity(e));
        assert_eq!(ek.value(), 3);
        assert_eq!(ek.num_iterations(), 1);
    }
}
