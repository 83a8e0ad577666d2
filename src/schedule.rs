//! In-memory trip index built from a static GTFS schedule directory.
//!
//! Only `routes.txt` and `trips.txt` are read: the classifier needs nothing
//! beyond each trip's route, its display name and its vehicle category.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ScheduleLoadError;

/// Mode of transport of a route, derived from the GTFS `route_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum VehicleType {
    Tram,
    Subway,
    Rail,
    Bus,
    Ferry,
    CableTram,
    AerialLift,
    Funicular,
    Trolleybus,
    Monorail,
    Other,
}

impl VehicleType {
    /// Maps basic and extended GTFS route types onto a category.
    pub fn from_route_type(route_type: i32) -> Self {
        match route_type {
            0 => VehicleType::Tram,
            1 => VehicleType::Subway,
            2 => VehicleType::Rail,
            3 => VehicleType::Bus,
            4 => VehicleType::Ferry,
            5 => VehicleType::CableTram,
            6 => VehicleType::AerialLift,
            7 => VehicleType::Funicular,
            11 => VehicleType::Trolleybus,
            12 => VehicleType::Monorail,
            100..=199 => VehicleType::Rail,
            200..=299 | 700..=799 => VehicleType::Bus,
            400..=499 => VehicleType::Subway,
            800..=899 => VehicleType::Trolleybus,
            900..=999 => VehicleType::Tram,
            1000..=1099 | 1200..=1299 => VehicleType::Ferry,
            1300..=1399 => VehicleType::AerialLift,
            1400..=1499 => VehicleType::Funicular,
            _ => VehicleType::Other,
        }
    }
}

/// Static knowledge about one scheduled trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripMetadata {
    pub trip_id: String,
    pub route_id: String,
    /// `route_long_name`, or `route_short_name` when the long name is absent.
    pub route_display_name: String,
    pub vehicle_type: VehicleType,
}

#[derive(Debug, Deserialize)]
struct RouteRecord {
    route_id: String,
    #[serde(default)]
    route_short_name: Option<String>,
    #[serde(default)]
    route_long_name: Option<String>,
    route_type: i32,
}

#[derive(Debug, Deserialize)]
struct TripRecord {
    route_id: String,
    trip_id: String,
}

struct RouteInfo {
    display_name: String,
    vehicle_type: VehicleType,
}

/// Read-only mapping from trip id to [`TripMetadata`].
///
/// Built once per run and never mutated, so it can be shared by reference
/// across any number of classification calls.
#[derive(Debug, Default)]
pub struct ScheduleIndex {
    trips: HashMap<String, TripMetadata>,
}

impl ScheduleIndex {
    /// Loads `routes.txt` and `trips.txt` from an extracted GTFS directory.
    ///
    /// # Errors
    ///
    /// Fails if either file is missing or unreadable, if a row does not parse,
    /// or if a trip points at a route that `routes.txt` does not define.
    #[tracing::instrument(fields(dir = %dir.display()))]
    pub fn build(dir: &Path) -> Result<Self, ScheduleLoadError> {
        let routes = load_routes(dir)?;
        info!(count = routes.len(), "Parsed GTFS routes");

        let reader = open_csv(dir, "trips.txt")?;
        let mut trips = HashMap::new();
        let mut skipped = 0usize;

        for result in reader.into_deserialize::<TripRecord>() {
            let record = result.map_err(|source| ScheduleLoadError::Csv {
                file: "trips.txt",
                source,
            })?;
            if record.trip_id.is_empty() {
                skipped += 1;
                continue;
            }

            let route = routes.get(&record.route_id).ok_or_else(|| {
                ScheduleLoadError::DanglingRoute {
                    trip_id: record.trip_id.clone(),
                    route_id: record.route_id.clone(),
                }
            })?;

            trips.insert(
                record.trip_id.clone(),
                TripMetadata {
                    trip_id: record.trip_id,
                    route_id: record.route_id,
                    route_display_name: route.display_name.clone(),
                    vehicle_type: route.vehicle_type,
                },
            );
        }

        if skipped > 0 {
            warn!(skipped, "Skipped trips.txt records with empty trip_id");
        }
        info!(count = trips.len(), "Parsed GTFS trips");

        Ok(Self { trips })
    }

    /// Builds an index from metadata that was enumerated elsewhere.
    ///
    /// A later entry with the same trip id replaces an earlier one.
    pub fn from_trips(trips: impl IntoIterator<Item = TripMetadata>) -> Self {
        Self {
            trips: trips.into_iter().map(|t| (t.trip_id.clone(), t)).collect(),
        }
    }

    /// Returns the metadata for `trip_id`, or `None` for trips the static
    /// schedule does not know (ad-hoc or unplanned services).
    pub fn lookup(&self, trip_id: &str) -> Option<&TripMetadata> {
        self.trips.get(trip_id)
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

fn open_csv(dir: &Path, file: &'static str) -> Result<csv::Reader<File>, ScheduleLoadError> {
    let path = dir.join(file);
    if !path.is_file() {
        return Err(ScheduleLoadError::MissingFile(file));
    }
    debug!(path = %path.display(), "Opening schedule file");

    let handle = File::open(&path).map_err(|source| ScheduleLoadError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(handle))
}

fn load_routes(dir: &Path) -> Result<HashMap<String, RouteInfo>, ScheduleLoadError> {
    let reader = open_csv(dir, "routes.txt")?;
    let mut routes = HashMap::new();

    for result in reader.into_deserialize::<RouteRecord>() {
        let record = result.map_err(|source| ScheduleLoadError::Csv {
            file: "routes.txt",
            source,
        })?;

        // Feeds may publish only one of the two names.
        let display_name = record
            .route_long_name
            .or(record.route_short_name)
            .unwrap_or_default();

        routes.insert(
            record.route_id,
            RouteInfo {
                display_name,
                vehicle_type: VehicleType::from_route_type(record.route_type),
            },
        );
    }

    Ok(routes)
}
