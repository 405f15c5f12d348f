// Copyright (c) 2022 Frank Fischer <frank-fischer@shadow-soft.de>
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see  <http://www.gnu.org/licenses/>
//

//! A library for routing and loading supplies in district transport
//! networks.
//!
//! The engine answers two questions about a network of capacitated routes:
//!
//! - how much can be transported between two districts
//!   ([`maxflow`], Edmonds-Karp on the residual network), and
//! - which resource units should be loaded on each route to maximize the
//!   total priority score ([`knapsack`], bounded knapsack per route).
//!
//! Requests are stateless. The [`Planner`] builds a fresh [`Network`] and
//! [`ResourcePool`](resources::ResourcePool) for each request.

mod num {
    pub use num_traits as traits;
}

// # Data

pub mod config;
pub use self::config::Config;

pub mod error;
pub use self::error::{Error, Result};

pub mod cancel;
pub use self::cancel::Cancel;

pub mod network;
pub use self::network::{Network, NetworkBuilder, Route};

pub mod resources;
pub use self::resources::{Resource, ResourcePool};

pub mod records;

// # Algorithms

pub mod knapsack;
pub mod maxflow;

// # Results

pub mod assemble;
pub use self::assemble::{Allocation, FlowResult, RouteAllocation};

pub mod planner;
pub use self::planner::Planner;
