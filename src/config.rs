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

//! Engine configuration.
//!
//! The configuration fixes the policies that the route data itself leaves
//! open. It can be constructed in code or read from JSON, where missing
//! fields take their default values.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "serialize")] {
//! use rs_supply::config::{Config, SelfLoopPolicy, Strategy};
//!
//! let cfg = Config::from_json(r#"{ "self_loops": "ignore", "timeout_ms": 500 }"#).unwrap();
//! assert_eq!(cfg.self_loops, SelfLoopPolicy::Ignore);
//! assert_eq!(cfg.strategy, Strategy::Auto);
//! assert!(cfg.parallel);
//! # }
//! ```

use std::time::Duration;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// How routes whose source equals their destination are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum SelfLoopPolicy {
    /// Fail with a validation error.
    Reject,
    /// Drop the route.
    Ignore,
}

/// How several routes between the same ordered pair of districts are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum ParallelRoutePolicy {
    /// Each route is an independent channel.
    Keep,
    /// Fail with a validation error.
    Reject,
}

/// Whether a route can be used against its declared direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum Direction {
    Directed,
    /// Every route is also available from destination to source with the
    /// same capacity.
    Bidirectional,
}

/// How the resource pool is shared between the routes of one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum PoolMode {
    /// Every route draws from the full pool.
    Independent,
    /// Routes are served in order, selected units are removed from the pool.
    Depleting,
}

/// Treatment of the bounded count dimension in the knapsack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// Expand each resource into unit copies.
    Unary,
    /// Split each quantity into power-of-two bundles.
    BinarySplit,
    /// Binary splitting once a quantity exceeds a small threshold.
    Auto,
}

/// Configuration of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct Config {
    pub self_loops: SelfLoopPolicy,
    pub parallel_routes: ParallelRoutePolicy,
    pub direction: Direction,
    pub pool: PoolMode,
    pub strategy: Strategy,
    /// Solve the routes of an allocation on the rayon thread pool.
    pub parallel: bool,
    /// Time limit for a single request in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            self_loops: SelfLoopPolicy::Reject,
            parallel_routes: ParallelRoutePolicy::Keep,
            direction: Direction::Directed,
            pool: PoolMode::Independent,
            strategy: Strategy::Auto,
            parallel: true,
            timeout_ms: None,
        }
    }
}

impl Config {
    /// Return the request time limit, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Read a configuration from a JSON string.
    #[cfg(feature = "serialize")]
    pub fn from_json(s: &str) -> crate::Result<Config> {
        let cfg: Config = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the configuration for contradicting settings.
    pub fn validate(&self) -> crate::Result<()> {
        if self.timeout_ms == Some(0) {
            return Err(crate::Error::Config("timeout_ms must be positive".to_string()));
        }
        if self.pool == PoolMode::Depleting && self.parallel {
            log::debug!("depleting pool is served sequentially, `parallel` has no effect");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.self_loops, SelfLoopPolicy::Reject);
        assert_eq!(cfg.parallel_routes, ParallelRoutePolicy::Keep);
        assert_eq!(cfg.direction, Direction::Directed);
        assert_eq!(cfg.pool, PoolMode::Independent);
        assert!(cfg.timeout().is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout() {
        let cfg = Config {
            timeout_ms: Some(0),
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(crate::Error::Config(_))));
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_from_json() {
        let cfg = Config::from_json(r#"{"direction": "bidirectional", "pool": "depleting", "parallel": false}"#).unwrap();
        assert_eq!(cfg.direction, Direction::Bidirectional);
        assert_eq!(cfg.pool, PoolMode::Depleting);
        assert!(!cfg.parallel);
        assert_eq!(cfg.self_loops, SelfLoopPolicy::Reject);

        assert!(Config::from_json(r#"{"self_loops": "merge"}"#).is_err());
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }
}
