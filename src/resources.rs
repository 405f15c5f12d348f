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

//! The catalog of shippable resources.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A resource type.
///
/// `quantity` identical units are available, each with weight `volume` and
/// value `priority_score`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Resource {
    pub id: u64,
    pub name: String,
    pub volume: u64,
    pub priority_score: u64,
    pub quantity: u64,
}

impl Resource {
    pub fn new<S: Into<String>>(id: u64, name: S, volume: u64, priority_score: u64, quantity: u64) -> Resource {
        Resource {
            id,
            name: name.into(),
            volume,
            priority_score,
            quantity,
        }
    }
}

/// A validated, read-only set of resources.
///
/// The order of the resources is the input order and determines the order
/// of selected items in an allocation.
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    resources: Vec<Resource>,
}

impl ResourcePool {
    /// Create a pool, checking that volumes and scores are positive.
    pub fn new(resources: Vec<Resource>) -> Result<ResourcePool> {
        for r in &resources {
            if r.volume == 0 {
                return Err(Error::InvalidResource {
                    resource: r.id,
                    reason: "volume must be positive".to_string(),
                });
            }
            if r.priority_score == 0 {
                return Err(Error::InvalidResource {
                    resource: r.id,
                    reason: "priority score must be positive".to_string(),
                });
            }
        }
        Ok(ResourcePool { resources })
    }

    /// Return all resources in input order.
    pub fn list_resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Return the total number of available units.
    pub fn num_units(&self) -> u64 {
        self.resources.iter().fold(0u64, |n, r| n.saturating_add(r.quantity))
    }

    /// Return the volume of all available units together.
    pub fn total_volume(&self) -> u64 {
        total_volume(&self.resources)
    }

    /// Remove `counts[i]` units of the `i`-th resource.
    ///
    /// # Panics
    ///
    /// Panics if more units are removed than available.
    pub fn take(&mut self, counts: &[u64]) {
        assert_eq!(counts.len(), self.resources.len(), "Wrong number of counts");
        for (r, &k) in self.resources.iter_mut().zip(counts) {
            assert!(k <= r.quantity, "Cannot take {} units of '{}'", k, r.name);
            r.quantity -= k;
        }
    }
}

/// Return the volume of all units of `resources` together, saturating at
/// `u64::MAX`.
pub fn total_volume(resources: &[Resource]) -> u64 {
    resources
        .iter()
        .fold(0u64, |s, r| s.saturating_add(r.volume.saturating_mul(r.quantity)))
}
