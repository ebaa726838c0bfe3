pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod mapping;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod store;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
