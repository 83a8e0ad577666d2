use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::ClassificationResult;
use crate::gtfs_rt::FeedMessage;

/// Counters describing one classification run.
#[derive(Debug, Default, Serialize)]
pub struct FeedSummary {
    pub feed_timestamp: Option<DateTime<Utc>>,
    pub total_entities: usize,

    // entity types
    pub trip_updates: usize,
    pub vehicles: usize,
    pub alerts: usize,
    pub stop_time_updates: usize,
    pub without_trip_id: usize,

    // emitted events
    pub alert_events: usize,
    pub slow_trip_events: usize,
}

impl FeedSummary {
    pub fn from_feed(feed: &FeedMessage) -> Self {
        let mut s = FeedSummary {
            feed_timestamp: feed
                .header
                .timestamp
                .and_then(|ts| i64::try_from(ts).ok())
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            total_entities: feed.entity.len(),
            ..Default::default()
        };

        for e in &feed.entity {
            if let Some(update) = &e.trip_update {
                s.trip_updates += 1;
                s.stop_time_updates += update.stop_time_update.len();

                if update.trip.trip_id.is_none() {
                    s.without_trip_id += 1;
                }
            }

            if e.vehicle.is_some() {
                s.vehicles += 1;
            }

            if e.alert.is_some() {
                s.alerts += 1;
            }
        }

        s
    }

    /// Adds the events produced for this feed.
    pub fn record(mut self, events: &[ClassificationResult]) -> Self {
        for event in events {
            match event {
                ClassificationResult::Alert(_) => self.alert_events += 1,
                ClassificationResult::SlowTrip(_) => self.slow_trip_events += 1,
            }
        }
        self
    }

    /// Seconds between the feed header timestamp and `now`, if the header has one.
    pub fn feed_age_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.feed_timestamp.map(|ts| (now - ts).num_seconds())
    }
}
