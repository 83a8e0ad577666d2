use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use prost::Message;
use trip_status::archive::extract_archive;
use trip_status::classify::{ClassificationResult, Classifier, Direction};
use trip_status::config::ClassifierConfig;
use trip_status::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use trip_status::gtfs_rt::{Alert, FeedEntity, FeedHeader, FeedMessage, TripDescriptor, TripUpdate};
use trip_status::output::{OutputFormat, write_events};
use trip_status::parser::parse_feed;
use trip_status::schedule::{ScheduleIndex, VehicleType};
use zip::write::SimpleFileOptions;

const ROUTES: &str = "route_id,agency_id,route_short_name,route_long_name,route_type\n\
                      BDVL,TL,BDVL,Redcliffe Peninsula Line,2\n\
                      444,TL,444,UQ Lakes to City,3\n";

const TRIPS: &str = "route_id,service_id,trip_id,trip_headsign\n\
                     BDVL,WKDY,29512345,Kippa-Ring\n\
                     444,WKDY,14598765,City\n";

#[test]
fn test_full_pipeline() {
    let zip_path = write_schedule_zip("trip_status_pipeline.zip");
    let work_dir = extract_archive(&zip_path).expect("Failed to extract schedule");
    let index = ScheduleIndex::build(work_dir.path()).expect("Failed to build index");
    assert_eq!(index.len(), 2);

    let bytes = create_feed().encode_to_vec();
    let feed = parse_feed(&bytes).expect("Failed to parse feed");

    let events = Classifier::new(&index, ClassifierConfig::default()).classify(&feed);
    assert_eq!(events.len(), 3);

    match &events[0] {
        ClassificationResult::Alert(alert) => assert_eq!(alert.entity_id, "alert-1"),
        other => panic!("expected alert first, got {other:?}"),
    }
    match &events[1] {
        ClassificationResult::SlowTrip(slow) => {
            assert_eq!(slow.trip_display_name, "Redcliffe Peninsula Line");
            assert_eq!(slow.direction, Direction::Arrival);
            assert_eq!(slow.delay_seconds, 420);
        }
        other => panic!("expected slow rail trip, got {other:?}"),
    }
    match &events[2] {
        ClassificationResult::SlowTrip(slow) => {
            assert_eq!(slow.trip_display_name, "This service");
            assert_eq!(slow.direction, Direction::Departure);
            assert_eq!(slow.delay_seconds, 500);
        }
        other => panic!("expected placeholder trip, got {other:?}"),
    }

    let mut out = Vec::new();
    write_events(&mut out, &events, OutputFormat::Text).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Redcliffe Peninsula Line is slow, should arrive 420 seconds late"));
    assert!(text.contains("This service is slow, should depart 500 seconds late"));

    drop(work_dir);
    fs::remove_file(&zip_path).unwrap();
}

#[test]
fn test_bus_configuration_reports_bus_trip() {
    let zip_path = write_schedule_zip("trip_status_bus.zip");
    let work_dir = extract_archive(&zip_path).expect("Failed to extract schedule");
    let index = ScheduleIndex::build(work_dir.path()).expect("Failed to build index");

    let config = ClassifierConfig {
        relevant_vehicle_type: VehicleType::Bus,
        slow_threshold_seconds: 600,
    };
    let events = Classifier::new(&index, config).classify(&create_feed());

    let names: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ClassificationResult::SlowTrip(slow) => Some(slow.trip_display_name.as_str()),
            ClassificationResult::Alert(_) => None,
        })
        .collect();
    assert_eq!(names, vec!["UQ Lakes to City"]);

    drop(work_dir);
    fs::remove_file(&zip_path).unwrap();
}

// Helper functions for tests
fn write_schedule_zip(name: &str) -> PathBuf {
    let path = env::temp_dir().join(name);
    let file = File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);

    for (file_name, content) in [("routes.txt", ROUTES), ("trips.txt", TRIPS)] {
        writer
            .start_file(file_name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();

    path
}

fn create_feed() -> FeedMessage {
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1234567890),
            incrementality: None,
            feed_version: None,
        },
        entity: vec![
            FeedEntity {
                id: "alert-1".to_string(),
                alert: Some(Alert::default()),
                ..Default::default()
            },
            trip_entity("rail", Some("29512345"), Some(420), Some(60)),
            trip_entity("bus", Some("14598765"), None, Some(900)),
            trip_entity("adhoc", Some("UNPLANNED-1"), Some(1200), None),
            trip_entity("unreferenced", None, None, Some(500)),
        ],
    }
}

fn trip_entity(
    id: &str,
    trip_id: Option<&str>,
    arrival: Option<i32>,
    departure: Option<i32>,
) -> FeedEntity {
    let event = |delay: i32| StopTimeEvent {
        delay: Some(delay),
        ..Default::default()
    };

    FeedEntity {
        id: id.to_string(),
        trip_update: Some(TripUpdate {
            trip: TripDescriptor {
                trip_id: trip_id.map(str::to_string),
                ..Default::default()
            },
            stop_time_update: vec![StopTimeUpdate {
                stop_sequence: Some(1),
                stop_id: Some("600000".to_string()),
                arrival: arrival.map(event),
                departure: departure.map(event),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}
