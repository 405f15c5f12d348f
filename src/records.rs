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

//! Records exchanged with the dashboard.
//!
//! These are the raw shapes of routes, resources and flow requests as they
//! arrive from the persistence layer. Conversion into [`Route`] and
//! [`Resource`] validates the numbers.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "serialize")] {
//! use rs_supply::records::RouteRecord;
//! use rs_supply::network::Route;
//! use std::convert::TryFrom;
//!
//! let rec: RouteRecord = serde_json::from_str(
//!     r#"{ "id": 4, "A": "Dhaka", "to": "Sylhet", "max_capacity": 25 }"#).unwrap();
//! let route = Route::try_from(rec).unwrap();
//! assert_eq!(route, Route::new(4, "Dhaka", "Sylhet", 25));
//! # }
//! ```

use std::convert::TryFrom;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::network::Route;
use crate::resources::Resource;
use crate::{Error, Result};

/// A route as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RouteRecord {
    pub id: u64,
    #[cfg_attr(feature = "serialize", serde(rename = "A"))]
    pub source: String,
    pub to: String,
    pub max_capacity: i64,
}

impl TryFrom<RouteRecord> for Route {
    type Error = Error;

    fn try_from(rec: RouteRecord) -> Result<Route> {
        if rec.max_capacity < 0 {
            return Err(Error::Validation {
                route: rec.id,
                reason: format!("negative capacity {}", rec.max_capacity),
            });
        }
        Ok(Route {
            id: rec.id,
            source: rec.source.trim().to_string(),
            destination: rec.to.trim().to_string(),
            capacity: rec.max_capacity as u64,
        })
    }
}

/// A resource as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ResourceRecord {
    pub id: u64,
    pub name: String,
    pub volume: i64,
    pub priority_score: i64,
    pub quantity: i64,
}

impl TryFrom<ResourceRecord> for Resource {
    type Error = Error;

    fn try_from(rec: ResourceRecord) -> Result<Resource> {
        let id = rec.id;
        let invalid = |reason: String| Error::InvalidResource { resource: id, reason };
        if rec.volume <= 0 {
            return Err(invalid(format!("volume must be positive, got {}", rec.volume)));
        }
        if rec.priority_score <= 0 {
            return Err(invalid(format!(
                "priority score must be positive, got {}",
                rec.priority_score
            )));
        }
        if rec.quantity < 0 {
            return Err(invalid(format!("negative quantity {}", rec.quantity)));
        }
        Ok(Resource {
            id: rec.id,
            name: rec.name,
            volume: rec.volume as u64,
            priority_score: rec.priority_score as u64,
            quantity: rec.quantity as u64,
        })
    }
}

/// Convert a list of route records.
///
/// Fails on the first invalid record.
pub fn routes_from_records<I>(recs: I) -> Result<Vec<Route>>
where
    I: IntoIterator<Item = RouteRecord>,
{
    recs.into_iter().map(Route::try_from).collect()
}

/// Convert a list of resource records.
///
/// Fails on the first invalid record.
pub fn resources_from_records<I>(recs: I) -> Result<Vec<Resource>>
where
    I: IntoIterator<Item = ResourceRecord>,
{
    recs.into_iter().map(Resource::try_from).collect()
}

/// The body of a flow request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FlowRequest {
    pub source: String,
    pub sink: String,
}

impl FlowRequest {
    pub fn new<S, T>(source: S, sink: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        FlowRequest {
            source: source.into(),
            sink: sink.into(),
        }
    }
}

/// The body of a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ErrorBody {
    pub error: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        ErrorBody { error: err.to_string() }
    }
}
