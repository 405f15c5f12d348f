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

//! Result structures handed back to the dashboard.
//!
//! [`FlowResult`] is the answer to a flow request, [`Allocation`] the answer
//! to an allocation request. With the `serialize` feature both serialize to
//! exactly the JSON shapes the dashboard reads; an allocation becomes an
//! object keyed by route id in route order.

use std::collections::BTreeMap;

#[cfg(feature = "serialize")]
use serde::ser::{Serialize, SerializeMap, Serializer};
#[cfg(feature = "serialize")]
use serde::Deserialize;

use crate::maxflow::EdmondsKarp;
use crate::network::{Capacity, Node, RouteId};
use crate::resources::Resource;

/// The flow on a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFlow {
    pub route: RouteId,
    pub source: String,
    pub destination: String,
    pub flow: u64,
    /// `true` if the flow runs against the declared direction of a
    /// bidirectional route.
    pub mirrored: bool,
}

/// A maximum flow between two districts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, Deserialize))]
pub struct FlowResult {
    pub source: String,
    pub sink: String,
    pub max_flow: u64,
    /// `details[u][v]` is the positive flow from `u` to `v`, summed over
    /// parallel routes.
    pub details: BTreeMap<String, BTreeMap<String, u64>>,
    /// The positive flows on the single routes in route order.
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub route_flows: Vec<RouteFlow>,
    /// The districts on the source side of a minimum cut.
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub min_cut: Vec<String>,
}

impl FlowResult {
    /// Assemble the result of a finished solver run.
    pub fn from_solver(solver: &EdmondsKarp<u64>, src: Node, snk: Node) -> FlowResult {
        let g = solver.as_network();
        let mut details: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        let mut route_flows = vec![];

        for e in g.edges() {
            let f = solver.flow(e);
            if f == 0 {
                continue;
            }
            let u = g.name(g.src(e));
            let v = g.name(g.snk(e));
            *details
                .entry(u.to_string())
                .or_default()
                .entry(v.to_string())
                .or_insert(0) += f;
            route_flows.push(RouteFlow {
                route: g.route_id(e),
                source: u.to_string(),
                destination: v.to_string(),
                flow: f,
                mirrored: g.is_mirrored(e),
            });
        }

        FlowResult {
            source: g.name(src).to_string(),
            sink: g.name(snk).to_string(),
            max_flow: solver.value(),
            details,
            route_flows,
            min_cut: solver.mincut().into_iter().map(|u| g.name(u).to_string()).collect(),
        }
    }

    /// Return the total flow on the routes leaving `district`.
    pub fn outflow(&self, district: &str) -> u64 {
        self.details.get(district).map_or(0, |m| m.values().sum())
    }

    /// Return the total flow on the routes entering `district`.
    pub fn inflow(&self, district: &str) -> u64 {
        self.details.values().filter_map(|m| m.get(district)).sum()
    }

    #[cfg(feature = "serialize")]
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A single loaded unit of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, Deserialize))]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub volume: u64,
    pub score: u64,
}

impl From<&Resource> for Item {
    fn from(r: &Resource) -> Self {
        Item {
            id: r.id,
            name: r.name.clone(),
            volume: r.volume,
            score: r.priority_score,
        }
    }
}

/// The load selected for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, Deserialize))]
pub struct RouteAllocation {
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub route: RouteId,
    pub source: String,
    pub destination: String,
    pub capacity: Capacity,
    pub total_priority: u64,
    pub total_volume: u64,
    /// The selected units, in resource order.
    pub items: Vec<Item>,
}

impl RouteAllocation {
    /// Return the selected units as counts per resource id, in resource order.
    pub fn counts(&self) -> Vec<(u64, usize)> {
        let mut counts: Vec<(u64, usize)> = vec![];
        for item in &self.items {
            if let Some((id, n)) = counts.last_mut() {
                if *id == item.id {
                    *n += 1;
                    continue;
                }
            }
            counts.push((item.id, 1));
        }
        counts
    }
}

/// The loads of all routes of a network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allocation {
    routes: Vec<RouteAllocation>,
}

impl Allocation {
    /// Create an allocation from per-route results in route order.
    pub fn new(routes: Vec<RouteAllocation>) -> Allocation {
        Allocation { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Return the load of a route.
    pub fn get(&self, route: RouteId) -> Option<&RouteAllocation> {
        self.routes.iter().find(|r| r.route == route)
    }

    /// Return an iterator over the route loads in route order.
    pub fn iter(&self) -> std::slice::Iter<'_, RouteAllocation> {
        self.routes.iter()
    }

    /// Return the total priority score over all routes.
    pub fn total_priority(&self) -> u64 {
        self.routes.iter().map(|r| r.total_priority).sum()
    }

    #[cfg(feature = "serialize")]
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<'a> IntoIterator for &'a Allocation {
    type Item = &'a RouteAllocation;
    type IntoIter = std::slice::Iter<'a, RouteAllocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

#[cfg(feature = "serialize")]
impl Serialize for Allocation {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.routes.len()))?;
        for r in &self.routes {
            map.serialize_entry(&r.route.to_string(), r)?;
        }
        map.end()
    }
}
