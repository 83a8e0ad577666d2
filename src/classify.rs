//! Delay classification of a decoded GTFS-RT feed.
//!
//! Each entity is turned into zero or more [`ClassificationResult`]s, in feed
//! order. Alerts pass straight through; trip updates are joined against the
//! [`ScheduleIndex`], filtered to one vehicle category, and every stop-time
//! update whose delay exceeds the threshold becomes a [`SlowTripEvent`].
//!
//! Classification has no failure mode. Unknown trips, trips of another
//! category and missing delay fields are routine and are skipped or
//! defaulted, never reported as errors.

use tracing::debug;

use crate::config::ClassifierConfig;
use crate::gtfs_rt::trip_update::StopTimeUpdate;
use crate::gtfs_rt::{Alert, FeedEntity, FeedMessage, TripUpdate};
use crate::schedule::ScheduleIndex;

/// Display name for trip updates that carry no trip id.
pub const UNREFERENCED_TRIP_NAME: &str = "This service";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Arrival,
    Departure,
}

/// A feed alert, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub entity_id: String,
    pub payload: Alert,
}

/// One stop along a trip that is running later than the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowTripEvent {
    pub trip_display_name: String,
    pub trip_id: Option<String>,
    pub stop_id: Option<String>,
    pub stop_sequence: Option<u32>,
    pub direction: Direction,
    pub delay_seconds: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationResult {
    Alert(AlertEvent),
    SlowTrip(SlowTripEvent),
}

/// Arrival and departure delay of one stop-time update.
///
/// `None` means the feed gave no delay for that side, which is compared as
/// zero but kept distinct from a reported zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopDelay {
    pub arrival: Option<i32>,
    pub departure: Option<i32>,
}

impl StopDelay {
    pub fn from_update(update: &StopTimeUpdate) -> Self {
        Self {
            arrival: update.arrival.as_ref().and_then(|e| e.delay),
            departure: update.departure.as_ref().and_then(|e| e.delay),
        }
    }

    /// Returns the direction and delay to report if either side is strictly
    /// above `threshold_seconds`.
    ///
    /// Arrival wins only when strictly greater than departure; equal delays
    /// report departure.
    pub fn slow_direction(&self, threshold_seconds: i32) -> Option<(Direction, i32)> {
        let arrival = self.arrival.unwrap_or(0);
        let departure = self.departure.unwrap_or(0);

        if arrival <= threshold_seconds && departure <= threshold_seconds {
            return None;
        }

        if arrival > departure {
            Some((Direction::Arrival, arrival))
        } else {
            Some((Direction::Departure, departure))
        }
    }
}

/// A trip update that survived the schedule join and category filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedTrip<'a> {
    display_name: &'a str,
    trip_id: Option<&'a str>,
}

/// Classifies feed messages against one schedule with one configuration.
///
/// Holds only shared references, so a single index can back any number of
/// classifiers, including on different threads.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'i> {
    index: &'i ScheduleIndex,
    config: ClassifierConfig,
}

impl<'i> Classifier<'i> {
    pub fn new(index: &'i ScheduleIndex, config: ClassifierConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies every entity of `feed`, preserving feed order.
    pub fn classify(&self, feed: &FeedMessage) -> Vec<ClassificationResult> {
        feed.entity
            .iter()
            .flat_map(|entity| self.classify_entity(entity))
            .collect()
    }

    /// An entity carrying both an alert and a trip update yields the alert
    /// first, then the trip update's slow stops.
    pub fn classify_entity<'e>(
        &'e self,
        entity: &'e FeedEntity,
    ) -> impl Iterator<Item = ClassificationResult> + 'e {
        let alert = entity.alert.as_ref().map(|alert| {
            ClassificationResult::Alert(AlertEvent {
                entity_id: entity.id.clone(),
                payload: alert.clone(),
            })
        });

        let slow_trips = entity
            .trip_update
            .as_ref()
            .filter(|update| has_stop_time_updates(update, &entity.id))
            .and_then(|update| self.resolve_trip(update).map(|trip| (update, trip)))
            .into_iter()
            .flat_map(move |(update, trip)| {
                update
                    .stop_time_update
                    .iter()
                    .filter_map(move |stop| self.slow_stop(trip, stop))
                    .map(ClassificationResult::SlowTrip)
            });

        alert.into_iter().chain(slow_trips)
    }

    /// Joins a trip update against the schedule.
    ///
    /// Returns `None` for trips absent from the schedule and for trips of a
    /// category other than the configured one. Updates with no trip id are
    /// never filtered and get the generic display name.
    fn resolve_trip<'e>(&self, update: &'e TripUpdate) -> Option<ResolvedTrip<'e>>
    where
        'i: 'e,
    {
        let Some(trip_id) = update.trip.trip_id.as_deref() else {
            return Some(ResolvedTrip {
                display_name: UNREFERENCED_TRIP_NAME,
                trip_id: None,
            });
        };

        let Some(metadata) = self.index.lookup(trip_id) else {
            debug!(trip_id, "Skipping trip update for trip not in static schedule");
            return None;
        };

        if metadata.vehicle_type != self.config.relevant_vehicle_type {
            debug!(
                trip_id,
                vehicle_type = ?metadata.vehicle_type,
                "Skipping trip update outside the relevant vehicle category"
            );
            return None;
        }

        Some(ResolvedTrip {
            display_name: &metadata.route_display_name,
            trip_id: Some(trip_id),
        })
    }

    fn slow_stop(&self, trip: ResolvedTrip<'_>, stop: &StopTimeUpdate) -> Option<SlowTripEvent> {
        let (direction, delay_seconds) =
            StopDelay::from_update(stop).slow_direction(self.config.slow_threshold_seconds)?;

        Some(SlowTripEvent {
            trip_display_name: trip.display_name.to_string(),
            trip_id: trip.trip_id.map(str::to_string),
            stop_id: stop.stop_id.clone(),
            stop_sequence: stop.stop_sequence,
            direction,
            delay_seconds,
        })
    }
}

fn has_stop_time_updates(update: &TripUpdate, entity_id: &str) -> bool {
    if update.stop_time_update.is_empty() {
        debug!(entity_id, "Skipping trip update without stop time updates");
        return false;
    }
    true
}

/// Classifies `feed` against `index` with `config`.
pub fn classify(
    feed: &FeedMessage,
    index: &ScheduleIndex,
    config: ClassifierConfig,
) -> Vec<ClassificationResult> {
    Classifier::new(index, config).classify(feed)
}
