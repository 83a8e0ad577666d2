//! Console rendering of classification results.
//!
//! Supports human-readable lines and one JSON object per line for machine
//! consumption.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::classify::{AlertEvent, ClassificationResult, Direction, SlowTripEvent};
use crate::gtfs_rt::TranslatedString;
use crate::summary::FeedSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EventRecord<'a> {
    Alert {
        entity_id: &'a str,
        header: Option<&'a str>,
        description: Option<&'a str>,
        cause: &'static str,
        effect: &'static str,
    },
    SlowTrip {
        trip: &'a str,
        trip_id: Option<&'a str>,
        stop_id: Option<&'a str>,
        stop_sequence: Option<u32>,
        direction: &'static str,
        delay_seconds: i32,
    },
}

impl<'a> From<&'a ClassificationResult> for EventRecord<'a> {
    fn from(event: &'a ClassificationResult) -> Self {
        match event {
            ClassificationResult::Alert(alert) => EventRecord::Alert {
                entity_id: &alert.entity_id,
                header: translated_text(&alert.payload.header_text),
                description: translated_text(&alert.payload.description_text),
                cause: alert.payload.cause().as_str_name(),
                effect: alert.payload.effect().as_str_name(),
            },
            ClassificationResult::SlowTrip(slow) => EventRecord::SlowTrip {
                trip: &slow.trip_display_name,
                trip_id: slow.trip_id.as_deref(),
                stop_id: slow.stop_id.as_deref(),
                stop_sequence: slow.stop_sequence,
                direction: match slow.direction {
                    Direction::Arrival => "arrival",
                    Direction::Departure => "departure",
                },
                delay_seconds: slow.delay_seconds,
            },
        }
    }
}

/// Picks the untagged or English translation, falling back to the first one.
fn translated_text(text: &Option<TranslatedString>) -> Option<&str> {
    let translations = &text.as_ref()?.translation;
    translations
        .iter()
        .find(|t| match t.language.as_deref() {
            None => true,
            Some(lang) => lang.starts_with("en"),
        })
        .or_else(|| translations.first())
        .map(|t| t.text.as_str())
}

fn alert_line(alert: &AlertEvent) -> String {
    let text = translated_text(&alert.payload.header_text)
        .or_else(|| translated_text(&alert.payload.description_text))
        .unwrap_or(alert.entity_id.as_str());
    format!("Alert: {} ({})", text, alert.payload.effect().as_str_name())
}

fn slow_trip_line(slow: &SlowTripEvent) -> String {
    let verb = match slow.direction {
        Direction::Arrival => "arrive",
        Direction::Departure => "depart",
    };
    format!(
        "{} is slow, should {} {} seconds late",
        slow.trip_display_name, verb, slow.delay_seconds
    )
}

/// Renders one event as a console line, without the trailing newline.
pub fn format_text(event: &ClassificationResult) -> String {
    match event {
        ClassificationResult::Alert(alert) => alert_line(alert),
        ClassificationResult::SlowTrip(slow) => slow_trip_line(slow),
    }
}

/// Renders one event as a single-line JSON object.
pub fn format_json(event: &ClassificationResult) -> Result<String> {
    Ok(serde_json::to_string(&EventRecord::from(event))?)
}

/// Writes every event to `writer`, one line each, in order.
pub fn write_events<W: Write>(
    mut writer: W,
    events: &[ClassificationResult],
    format: OutputFormat,
) -> Result<()> {
    for event in events {
        let line = match format {
            OutputFormat::Text => format_text(event),
            OutputFormat::Json => format_json(event)?,
        };
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Logs the run summary as JSON.
pub fn log_summary(summary: &FeedSummary) -> Result<()> {
    debug!("{}", serde_json::to_string(summary)?);
    Ok(())
}
