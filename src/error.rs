//! Error types for the schedule, feed and retrieval boundaries.
//!
//! Classification itself never fails; everything here is raised before the
//! classifier runs and is terminal for the run (or for the one feed fetch).

use std::path::PathBuf;

use thiserror::Error;

/// The static schedule could not be turned into a [`crate::schedule::ScheduleIndex`].
#[derive(Debug, Error)]
pub enum ScheduleLoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schedule is missing {0}")]
    MissingFile(&'static str),
    #[error("malformed {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("trip {trip_id} references unknown route {route_id}")]
    DanglingRoute { trip_id: String, route_id: String },
    #[error("could not extract schedule archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// The real-time payload is not a valid GTFS-RT `FeedMessage`.
#[derive(Debug, Error)]
#[error("could not decode realtime feed: {0}")]
pub struct FeedDecodeError(#[from] pub prost::DecodeError);

/// Retrieving the raw real-time payload failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed server answered {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("invalid feed url {0}")]
    Url(String),
    #[error("invalid api key header: {0}")]
    Header(String),
    #[error("could not read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
