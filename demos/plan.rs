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

use time::OffsetDateTime;

use rustop::opts;

use rs_supply::config::Config;
use rs_supply::records::{resources_from_records, routes_from_records, FlowRequest, ResourceRecord, RouteRecord};
use rs_supply::Planner;

use std::error::Error;
use std::fs;

fn main() -> Result<(), Box<dyn Error>> {
    let (args, _) = opts! {
        synopsis "Compute the maximum flow between two districts and load the routes.";
        opt config:Option<String>, desc:"Configuration file (JSON).";
        opt resources:Option<String>, desc:"Resource file (JSON list of resource records).";
        opt dispatch:bool, desc:"Load the first legs of the flow instead of all routes.";
        param routes:String, desc:"Route file (JSON list of route records)";
        param source:String, desc:"Source district";
        param sink:String, desc:"Destination district";
    }
    .parse_or_exit();

    let cfg = match &args.config {
        Some(file) => Config::from_json(&fs::read_to_string(file)?)?,
        None => Config::default(),
    };
    let planner = Planner::new(cfg)?;

    let tstart = OffsetDateTime::now_utc();
    let routes: Vec<RouteRecord> = serde_json::from_str(&fs::read_to_string(&args.routes)?)?;
    let routes = routes_from_records(routes)?;
    let tend = OffsetDateTime::now_utc();
    println!("Time: {}", (tend - tstart).as_seconds_f64());
    println!("  number of routes: {}", routes.len());

    let tstart = OffsetDateTime::now_utc();
    let flow = planner.calculate_flow(&routes, &FlowRequest::new(args.source.as_str(), args.sink.as_str()))?;
    let tend = OffsetDateTime::now_utc();
    println!("Time: {}", (tend - tstart).as_seconds_f64());
    println!("Flow: {}", flow.max_flow);
    println!("{}", flow.to_json()?);

    if let Some(file) = &args.resources {
        let resources: Vec<ResourceRecord> = serde_json::from_str(&fs::read_to_string(file)?)?;
        let resources = resources_from_records(resources)?;

        let tstart = OffsetDateTime::now_utc();
        let alloc = if args.dispatch {
            planner.calculate_dispatch(&flow, &resources)?
        } else {
            planner.calculate_allocation(&routes, &resources)?
        };
        let tend = OffsetDateTime::now_utc();
        println!("Time: {}", (tend - tstart).as_seconds_f64());
        println!("Priority: {}", alloc.total_priority());
        println!("{}", alloc.to_json()?);
    }

    Ok(())
}
