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

//! Errors reported by the engine.
//!
//! All errors are local to a single request. Validation errors are raised
//! while building the network or the resource pool and never reach a solver.

use thiserror::Error;

/// The role of a district in a flow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Sink,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Endpoint::Source => write!(fmt, "Source"),
            Endpoint::Sink => write!(fmt, "Destination"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A route is malformed (negative capacity, self-loop, ...).
    #[error("Invalid route {route}: {reason}")]
    Validation { route: u64, reason: String },

    /// A resource is malformed (non-positive volume or score, ...).
    #[error("Invalid resource {resource}: {reason}")]
    InvalidResource { resource: u64, reason: String },

    /// The source or sink district does not occur in the network.
    #[error("{role} '{district}' not found in the network")]
    InvalidEndpoint { district: String, role: Endpoint },

    /// Source and sink are the same district.
    #[error("Source and destination must differ, both are '{district}'")]
    DegenerateRequest { district: String },

    /// The request was cancelled or ran out of time.
    #[error("Computation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[cfg(feature = "serialize")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Return `true` if the error was caused by the request data.
    ///
    /// These correspond to 4xx responses and must not be retried.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::Validation { .. }
            | Error::InvalidResource { .. }
            | Error::InvalidEndpoint { .. }
            | Error::DegenerateRequest { .. } => true,
            #[cfg(feature = "serialize")]
            Error::Json(_) => true,
            Error::Cancelled | Error::Config(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
