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

//! Bounded knapsack loading of routes.
//!
//! Each route is loaded independently: the capacity of the route is the
//! weight bound, every resource type offers `quantity` units of weight
//! `volume` and value `priority_score`.
//!
//! The algorithm computes one dynamic programming row per resource type,
//! starting with the last type. Row `i` holds, for every capacity `c`, the
//! best load of volume at most `c` using only the types `i..`. The bounded
//! count of a type is handled by unit copies or by power-of-two bundles
//! (see [`Strategy`]), both give the same rows.
//!
//! Loads are compared by total priority score, then by smaller total
//! volume. Among equal loads the selection with more units of earlier
//! types is chosen, which makes the selection unique.
//!
//! # Example
//!
//! ```
//! use rs_supply::config::Strategy;
//! use rs_supply::knapsack::Knapsack;
//! use rs_supply::resources::Resource;
//!
//! let resources = vec![
//!     Resource::new(1, "Saline", 2, 3, 5),
//!     Resource::new(2, "Water", 5, 8, 2),
//! ];
//! let mut ks = Knapsack::new(&resources, Strategy::Auto);
//! ks.solve(7);
//!
//! assert_eq!(ks.value(), 11);
//! assert_eq!(ks.volume(), 7);
//! assert_eq!(ks.counts(), &[1, 1]);
//! ```

use std::cmp::{min, Ordering};
use std::ops::Add;

use log::{debug, info};
use rayon::prelude::*;

use crate::assemble::{Allocation, Item, RouteAllocation};
use crate::cancel::Cancel;
use crate::config::{Config, PoolMode, Strategy};
use crate::network::{Capacity, Route};
use crate::resources::{total_volume, Resource, ResourcePool};
use crate::Result;

/// With [`Strategy::Auto`] quantities above this are split into bundles.
const UNARY_LIMIT: u64 = 8;

/// Value and volume of a (partial) load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Load {
    value: u64,
    volume: u64,
}

impl Load {
    fn of(r: &Resource, k: u64) -> Load {
        Load {
            value: r.priority_score.saturating_mul(k),
            volume: r.volume * k,
        }
    }
}

impl Add for Load {
    type Output = Load;

    fn add(self, other: Load) -> Load {
        Load {
            value: self.value.saturating_add(other.value),
            volume: self.volume + other.volume,
        }
    }
}

impl Ord for Load {
    // higher value first, then smaller volume
    fn cmp(&self, other: &Load) -> Ordering {
        self.value.cmp(&other.value).then(other.volume.cmp(&self.volume))
    }
}

impl PartialOrd for Load {
    fn partial_cmp(&self, other: &Load) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded knapsack solver over a list of resources.
pub struct Knapsack<'a> {
    resources: &'a [Resource],
    strategy: Strategy,
    rows: Vec<Vec<Load>>,
    counts: Vec<u64>,
    best: Load,
}

impl<'a> Knapsack<'a> {
    /// Create a solver for a list of resources.
    pub fn new(resources: &'a [Resource], strategy: Strategy) -> Self {
        Knapsack {
            resources,
            strategy,
            rows: vec![],
            counts: vec![0; resources.len()],
            best: Load::default(),
        }
    }

    /// Return the total priority score of the latest selection.
    pub fn value(&self) -> u64 {
        self.best.value
    }

    /// Return the total volume of the latest selection.
    pub fn volume(&self) -> u64 {
        self.best.volume
    }

    /// Return the number of selected units of each resource.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Return the selected units in resource order.
    pub fn items(&self) -> Vec<Item> {
        self.resources
            .iter()
            .zip(&self.counts)
            .flat_map(|(r, &k)| (0..k).map(move |_| Item::from(r)))
            .collect()
    }

    /// Compute the best load for the given capacity.
    ///
    /// Resources with volume 0 are never selected, a [`ResourcePool`]
    /// rejects them anyway.
    ///
    /// The solver keeps one row of `min(capacity, total volume) + 1` loads
    /// per resource type, so memory grows with the number of types times the
    /// effective capacity. Very large capacities together with a large total
    /// volume may exhaust memory.
    pub fn solve(&mut self, capacity: Capacity) {
        let n = self.resources.len();
        for k in self.counts.iter_mut() {
            *k = 0;
        }
        self.best = Load::default();

        // more capacity than the volume of all units is never needed
        let cap = min(capacity, total_volume(self.resources)) as usize;
        if cap == 0 {
            return;
        }

        self.rows.clear();
        self.rows.resize(n + 1, vec![]);
        self.rows[n] = vec![Load::default(); cap + 1];

        for i in (0..n).rev() {
            let r = &self.resources[i];
            let mut row = self.rows[i + 1].clone();
            let num = max_units(r, cap);
            for k in bundles(num, self.strategy) {
                let load = Load::of(r, k);
                let w = load.volume as usize;
                for c in (w..=cap).rev() {
                    let cand = row[c - w] + load;
                    if cand > row[c] {
                        row[c] = cand;
                    }
                }
            }
            self.rows[i] = row;
        }

        // reconstruct, taking as many units of early types as possible
        let mut c = cap;
        for i in 0..n {
            let r = &self.resources[i];
            let target = self.rows[i][c];
            let kmax = max_units(r, c);
            let k = (0..=kmax)
                .rev()
                .find(|&k| Load::of(r, k) + self.rows[i + 1][c - (r.volume * k) as usize] == target)
                .unwrap_or(0);
            self.counts[i] = k;
            c -= (r.volume * k) as usize;
        }

        self.best = self.rows[0][cap];
        debug_assert_eq!(
            self.best,
            self.resources
                .iter()
                .zip(&self.counts)
                .fold(Load::default(), |s, (r, &k)| s + Load::of(r, k))
        );
    }
}

// The number of units of `r` that fit into `cap`. Types without volume are
// never loaded.
fn max_units(r: &Resource, cap: usize) -> u64 {
    if r.volume == 0 {
        0
    } else {
        min(r.quantity, cap as u64 / r.volume)
    }
}

// The bundle sizes used to represent `0..=num` units.
fn bundles(num: u64, strategy: Strategy) -> Vec<u64> {
    let binary = match strategy {
        Strategy::Unary => false,
        Strategy::BinarySplit => true,
        Strategy::Auto => num > UNARY_LIMIT,
    };
    if !binary {
        return vec![1; num as usize];
    }
    let mut sizes = vec![];
    let mut rest = num;
    let mut k = 1;
    while rest > 0 {
        let b = min(k, rest);
        sizes.push(b);
        rest -= b;
        k <<= 1;
    }
    sizes
}

/// Select the best load of one route from the full pool.
///
/// A route with capacity 0, or one on which no unit fits, gets no items.
pub fn allocate(route: &Route, pool: &ResourcePool, strategy: Strategy) -> RouteAllocation {
    let mut ks = Knapsack::new(pool.list_resources(), strategy);
    ks.solve(route.capacity);
    debug!(
        "Route {} ({} -> {}, capacity {}): value {}, volume {}",
        route.id,
        route.source,
        route.destination,
        route.capacity,
        ks.value(),
        ks.volume()
    );
    RouteAllocation {
        route: route.id,
        source: route.source.clone(),
        destination: route.destination.clone(),
        capacity: route.capacity,
        total_priority: ks.value(),
        total_volume: ks.volume(),
        items: ks.items(),
    }
}

/// Load all routes.
///
/// With [`PoolMode::Independent`] every route sees the full pool and the
/// routes are solved on the rayon thread pool if `cfg.parallel` is set.
/// With [`PoolMode::Depleting`] routes are solved in order and the selected
/// units of a route are not available to later routes.
///
/// `cancel` is checked before each route.
pub fn allocate_all(routes: &[Route], pool: &ResourcePool, cfg: &Config, cancel: &Cancel) -> Result<Allocation> {
    let strategy = cfg.strategy;
    let loads = match cfg.pool {
        PoolMode::Independent if cfg.parallel => {
            let mut slots: Vec<Option<RouteAllocation>> = vec![None; routes.len()];
            slots
                .par_iter_mut()
                .zip(routes.par_iter())
                .try_for_each(|(slot, route)| -> Result<()> {
                    cancel.check()?;
                    *slot = Some(allocate(route, pool, strategy));
                    Ok(())
                })?;
            slots.into_iter().flatten().collect()
        }
        PoolMode::Independent => {
            let mut loads = Vec::with_capacity(routes.len());
            for route in routes {
                cancel.check()?;
                loads.push(allocate(route, pool, strategy));
            }
            loads
        }
        PoolMode::Depleting => {
            let mut left = pool.clone();
            let mut loads = Vec::with_capacity(routes.len());
            for route in routes {
                cancel.check()?;
                let mut ks = Knapsack::new(left.list_resources(), strategy);
                ks.solve(route.capacity);
                let load = RouteAllocation {
                    route: route.id,
                    source: route.source.clone(),
                    destination: route.destination.clone(),
                    capacity: route.capacity,
                    total_priority: ks.value(),
                    total_volume: ks.volume(),
                    items: ks.items(),
                };
                let counts = ks.counts().to_vec();
                left.take(&counts);
                loads.push(load);
            }
            loads
        }
    };

    let alloc = Allocation::new(loads);
    info!(
        "Loaded {} routes from {} units of {} resource types, total priority {}",
        alloc.len(),
        pool.num_units(),
        pool.len(),
        alloc.total_priority()
    );
    Ok(alloc)
}

#[cfg(test)]
mod tests {
    use super::{allocate, allocate_all, bundles, Knapsack};
    use crate::cancel::Cancel;
    use crate::config::{Config, PoolMode, Strategy};
    use crate::network::Route;
    use crate::resources::{Resource, ResourcePool};
    use crate::Error;

    const STRATEGIES: [Strategy; 3] = [Strategy::Unary, Strategy::BinarySplit, Strategy::Auto];

    fn pool() -> ResourcePool {
        ResourcePool::new(vec![Resource::new(1, "Saline", 2, 3, 5), Resource::new(2, "Water", 5, 8, 2)]).unwrap()
    }

    #[test]
    fn test_bundles() {
        assert_eq!(bundles(3, Strategy::Unary), vec![1, 1, 1]);
        assert_eq!(bundles(10, Strategy::BinarySplit), vec![1, 2, 4, 3]);
        assert_eq!(bundles(7, Strategy::BinarySplit), vec![1, 2, 4]);
        assert_eq!(bundles(0, Strategy::BinarySplit), Vec::<u64>::new());
        assert_eq!(bundles(5, Strategy::Auto).len(), 5);
        assert_eq!(bundles(100, Strategy::Auto).len(), 7);
    }

    #[test]
    fn test_scenario() {
        for &s in &STRATEGIES {
            let r = allocate(&Route::new(1, "Dhaka", "Comilla", 7), &pool(), s);
            assert_eq!(r.total_priority, 11);
            assert_eq!(r.total_volume, 7);
            let names: Vec<_> = r.items.iter().map(|it| it.name.as_str()).collect();
            assert_eq!(names, vec!["Saline", "Water"]);
        }
    }

    #[test]
    fn test_larger_capacities() {
        let res = pool();
        let mut ks = Knapsack::new(res.list_resources(), Strategy::BinarySplit);

        // two water (16) beats five saline (15)
        ks.solve(10);
        assert_eq!((ks.value(), ks.volume()), (16, 10));
        assert_eq!(ks.counts(), &[0, 2]);

        ks.solve(20);
        assert_eq!(ks.counts(), &[5, 2]);
        assert_eq!(ks.value(), 31);

        ks.solve(1000);
        assert_eq!(ks.counts(), &[5, 2]);

        ks.solve(1);
        assert_eq!(ks.value(), 0);
        assert!(ks.items().is_empty());
    }

    #[test]
    fn test_zero_capacity() {
        let r = allocate(&Route::new(1, "Dhaka", "Comilla", 0), &pool(), Strategy::Auto);
        assert!(r.items.is_empty());
        assert_eq!(r.total_priority, 0);
    }

    #[test]
    fn test_ties() {
        // equal value and volume: the earlier resource wins
        let res = vec![Resource::new(1, "A", 3, 4, 2), Resource::new(2, "B", 3, 4, 2)];
        let mut ks = Knapsack::new(&res, Strategy::Unary);
        ks.solve(9);
        assert_eq!(ks.counts(), &[2, 1]);

        // equal value: the smaller volume wins
        let res = vec![Resource::new(1, "Big", 5, 6, 1), Resource::new(2, "Small", 2, 6, 1)];
        let mut ks = Knapsack::new(&res, Strategy::Unary);
        ks.solve(5);
        assert_eq!(ks.counts(), &[0, 1]);
        assert_eq!(ks.volume(), 2);
    }

    #[test]
    fn test_zero_volume() {
        let res = vec![Resource::new(1, "Air", 0, 1, 1), Resource::new(2, "Water", 5, 8, 2)];
        for &s in &STRATEGIES {
            let mut ks = Knapsack::new(&res, s);
            ks.solve(5);
            assert_eq!(ks.counts(), &[0, 1]);
            assert_eq!((ks.value(), ks.volume()), (8, 5));
        }

        let mut ks = Knapsack::new(&res[..1], Strategy::Auto);
        ks.solve(5);
        assert_eq!(ks.value(), 0);
        assert!(ks.items().is_empty());
    }

    #[test]
    fn test_empty_pool() {
        let empty = ResourcePool::new(vec![]).unwrap();
        let r = allocate(&Route::new(1, "a", "b", 10), &empty, Strategy::Auto);
        assert!(r.items.is_empty());

        let none_left = ResourcePool::new(vec![Resource::new(1, "A", 1, 1, 0)]).unwrap();
        assert!(allocate(&Route::new(1, "a", "b", 10), &none_left, Strategy::Auto)
            .items
            .is_empty());
    }

    #[test]
    fn test_allocate_all() {
        let routes = vec![
            Route::new(3, "Dhaka", "Comilla", 7),
            Route::new(1, "Dhaka", "Sylhet", 0),
            Route::new(2, "Comilla", "Chittagong", 10),
        ];
        let par = allocate_all(&routes, &pool(), &Config::default(), &Cancel::new()).unwrap();
        let seq = allocate_all(
            &routes,
            &pool(),
            &Config {
                parallel: false,
                ..Config::default()
            },
            &Cancel::new(),
        )
        .unwrap();
        assert_eq!(par, seq);
        assert_eq!(par.iter().map(|r| r.route).collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(par.get(3).map(|r| r.total_priority), Some(11));
        assert_eq!(par.get(2).map(|r| r.total_priority), Some(16));
    }

    #[test]
    fn test_depleting() {
        let routes = vec![Route::new(1, "Dhaka", "Comilla", 10), Route::new(2, "Dhaka", "Sylhet", 10)];
        let cfg = Config {
            pool: PoolMode::Depleting,
            ..Config::default()
        };
        let alloc = allocate_all(&routes, &pool(), &cfg, &Cancel::new()).unwrap();
        assert_eq!(alloc.get(1).map(|r| r.counts()), Some(vec![(2, 2)]));
        // only saline is left for the second route
        assert_eq!(alloc.get(2).map(|r| r.counts()), Some(vec![(1, 5)]));
        assert_eq!(alloc.total_priority(), 31);
    }

    #[test]
    fn test_cancel() {
        let routes = vec![Route::new(1, "Dhaka", "Comilla", 10)];
        let cancel = Cancel::new();
        cancel.cancel();
        for &parallel in &[true, false] {
            let cfg = Config {
                parallel,
                ..Config::default()
            };
            assert!(matches!(
                allocate_all(&routes, &pool(), &cfg, &cancel),
                Err(Error::Cancelled)
            ));
        }
    }
}
