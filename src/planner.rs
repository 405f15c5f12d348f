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

//! Request handling.
//!
//! A [`Planner`] serves the requests of the dashboard. Every request builds
//! its own network and resource pool from the records passed in, so
//! concurrent requests share nothing but the configuration.
//!
//! # Example
//!
//! ```
//! use rs_supply::config::Config;
//! use rs_supply::network::Route;
//! use rs_supply::planner::Planner;
//! use rs_supply::records::FlowRequest;
//! use rs_supply::resources::Resource;
//!
//! let routes = vec![
//!     Route::new(1, "Dhaka", "Comilla", 50),
//!     Route::new(2, "Comilla", "Chittagong", 30),
//!     Route::new(3, "Dhaka", "Chittagong", 10),
//! ];
//! let resources = vec![
//!     Resource::new(1, "Saline", 2, 3, 5),
//!     Resource::new(2, "Water", 5, 8, 2),
//! ];
//!
//! let planner = Planner::new(Config::default()).unwrap();
//! let flow = planner.calculate_flow(&routes, &FlowRequest::new("Dhaka", "Chittagong")).unwrap();
//! assert_eq!(flow.max_flow, 40);
//!
//! let alloc = planner.calculate_allocation(&routes, &resources).unwrap();
//! assert_eq!(alloc.len(), 3);
//! assert_eq!(alloc.get(3).unwrap().total_priority, 16);
//! ```

use log::info;

use crate::assemble::{Allocation, FlowResult};
use crate::cancel::Cancel;
use crate::config::Config;
use crate::knapsack;
use crate::maxflow;
use crate::network::{Network, Route};
use crate::records::FlowRequest;
use crate::resources::{Resource, ResourcePool};
use crate::Result;

/// The request handler of the engine.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    cfg: Config,
}

impl Planner {
    /// Create a planner, validating the configuration.
    pub fn new(cfg: Config) -> Result<Planner> {
        cfg.validate()?;
        Ok(Planner { cfg })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn cancel(&self) -> Cancel {
        Cancel::from_timeout(self.cfg.timeout())
    }

    /// Compute the maximum flow between the districts of a request.
    pub fn calculate_flow(&self, routes: &[Route], req: &FlowRequest) -> Result<FlowResult> {
        self.calculate_flow_with(routes, req, &self.cancel())
    }

    /// Compute the maximum flow, aborting when `cancel` fires.
    pub fn calculate_flow_with(&self, routes: &[Route], req: &FlowRequest, cancel: &Cancel) -> Result<FlowResult> {
        let net = Network::build(routes, &self.cfg)?;
        maxflow::max_flow_with(&net, &req.source, &req.sink, cancel)
    }

    /// Load every route of the network from the resource pool.
    ///
    /// Routes dropped while building the network (ignored self-loops) get
    /// no entry.
    pub fn calculate_allocation(&self, routes: &[Route], resources: &[Resource]) -> Result<Allocation> {
        self.calculate_allocation_with(routes, resources, &self.cancel())
    }

    /// Load every route, aborting between routes when `cancel` fires.
    pub fn calculate_allocation_with(
        &self,
        routes: &[Route],
        resources: &[Resource],
        cancel: &Cancel,
    ) -> Result<Allocation> {
        let net = Network::build(routes, &self.cfg)?;
        let pool = ResourcePool::new(resources.to_vec())?;
        knapsack::allocate_all(&declared_routes(&net), &pool, &self.cfg, cancel)
    }

    /// Load the first legs of a flow.
    ///
    /// Every route leaving the source of `flow` with positive flow is loaded
    /// with the flow on it as capacity.
    pub fn calculate_dispatch(&self, flow: &FlowResult, resources: &[Resource]) -> Result<Allocation> {
        let legs: Vec<Route> = flow
            .route_flows
            .iter()
            .filter(|rf| rf.source == flow.source)
            .map(|rf| Route::new(rf.route, rf.source.as_str(), rf.destination.as_str(), rf.flow))
            .collect();
        info!("Dispatching {} legs from '{}'", legs.len(), flow.source);
        let pool = ResourcePool::new(resources.to_vec())?;
        knapsack::allocate_all(&legs, &pool, &self.cfg, &self.cancel())
    }
}

// The routes of a network in their declared direction.
fn declared_routes(net: &Network) -> Vec<Route> {
    net.edges()
        .filter(|&e| !net.is_mirrored(e))
        .map(|e| {
            Route::new(
                net.route_id(e),
                net.name(net.src(e)),
                net.name(net.snk(e)),
                net.capacity(e),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::Planner;
    use crate::config::{Config, Direction, SelfLoopPolicy};
    use crate::network::Route;
    use crate::records::FlowRequest;
    use crate::resources::Resource;
    use crate::Error;

    fn routes() -> Vec<Route> {
        vec![
            Route::new(1, "Dhaka", "Comilla", 50),
            Route::new(2, "Comilla", "Chittagong", 30),
            Route::new(3, "Dhaka", "Chittagong", 10),
        ]
    }

    fn resources() -> Vec<Resource> {
        vec![Resource::new(1, "Saline", 2, 3, 5), Resource::new(2, "Water", 5, 8, 2)]
    }

    #[test]
    fn test_flow_errors() {
        let p = Planner::default();
        let err = p
            .calculate_flow(&routes(), &FlowRequest::new("Dhaka", "Dhaka"))
            .unwrap_err();
        assert!(matches!(err, Error::DegenerateRequest { .. }));
        assert!(err.is_client_error());

        let err = p
            .calculate_flow(&routes(), &FlowRequest::new("Dhaka", "Sylhet"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));

        let mut rs = routes();
        rs.push(Route::new(9, "Sylhet", "Sylhet", 3));
        let err = p.calculate_flow(&rs, &FlowRequest::new("Dhaka", "Comilla")).unwrap_err();
        assert!(matches!(err, Error::Validation { route: 9, .. }));
    }

    #[test]
    fn test_allocation_skips_ignored_routes() {
        let p = Planner::new(Config {
            self_loops: SelfLoopPolicy::Ignore,
            direction: Direction::Bidirectional,
            ..Config::default()
        })
        .unwrap();
        let mut rs = routes();
        rs.push(Route::new(9, "Sylhet", "Sylhet", 3));
        let alloc = p.calculate_allocation(&rs, &resources()).unwrap();
        assert_eq!(alloc.iter().map(|r| r.route).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(alloc.get(1).map(|r| r.total_priority), Some(31));
        assert_eq!(alloc.get(1).map(|r| r.source.as_str()), Some("Dhaka"));
    }

    #[test]
    fn test_allocation_duplicate_ids() {
        let mut rs = routes();
        rs.push(Route::new(1, "Dhaka", "Sylhet", 20));
        let err = Planner::default().calculate_allocation(&rs, &resources()).unwrap_err();
        assert!(matches!(err, Error::Validation { route: 1, .. }));
        assert_eq!(err.to_string(), "Invalid route 1: duplicate route id");
    }

    #[test]
    fn test_dispatch() {
        let p = Planner::default();
        let flow = p
            .calculate_flow(&routes(), &FlowRequest::new("Dhaka", "Chittagong"))
            .unwrap();
        let alloc = p.calculate_dispatch(&flow, &resources()).unwrap();

        // Dhaka -> Comilla carries 30, Dhaka -> Chittagong carries 10
        assert_eq!(alloc.iter().map(|r| (r.route, r.capacity)).collect::<Vec<_>>(), vec![(1, 30), (3, 10)]);
        assert_eq!(alloc.get(1).map(|r| r.total_priority), Some(31));
        assert_eq!(alloc.get(3).map(|r| r.total_priority), Some(16));
    }

    #[test]
    fn test_invalid_resources() {
        let p = Planner::default();
        let res = vec![Resource::new(4, "Air", 0, 1, 1)];
        assert!(matches!(
            p.calculate_allocation(&routes(), &res),
            Err(Error::InvalidResource { resource: 4, .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let cfg = Config {
            timeout_ms: Some(0),
            ..Config::default()
        };
        assert!(Planner::new(cfg).is_err());
    }
}
