pub mod archive;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod schedule;
pub mod summary;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
