//! WASM bindings for series-engine.
//!
//! Exposes rule validation, rule description, and series expansion to the
//! Svelte frontend via `wasm-bindgen`. Complex types cross the boundary as
//! JSON strings: the frontend passes the series definition exactly as the
//! backend serves it and gets back an occurrence array with RFC 3339
//! datetimes.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p series-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir frontend/src/lib/wasm/ \
//!   target/wasm32-unknown-unknown/release/series_engine_wasm.wasm
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use series_engine::{Occurrence, SeriesDefinition};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OccurrenceDto {
    parent_event_id: i64,
    instance_date: String,
    start: String,
    end: String,
    is_recurring_instance: bool,
    title: String,
    description: Option<String>,
    location: Option<String>,
    is_cancelled: bool,
    cancellation_reason: Option<String>,
}

impl From<&Occurrence> for OccurrenceDto {
    fn from(o: &Occurrence) -> Self {
        Self {
            parent_event_id: o.parent_event_id,
            instance_date: o.instance_date.format("%Y-%m-%d").to_string(),
            start: o.start.to_rfc3339(),
            end: o.end.to_rfc3339(),
            is_recurring_instance: o.is_recurring_instance,
            title: o.title.clone(),
            description: o.description.clone(),
            location: o.location.clone(),
            is_cancelled: o.is_cancelled,
            cancellation_reason: o.cancellation_reason.clone(),
        }
    }
}

/// Parse a `YYYY-MM-DD` window boundary.
fn parse_window_date(s: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| JsValue::from_str(&format!("Invalid date '{}': expected YYYY-MM-DD", s)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand a series definition into concrete occurrences within a window.
///
/// `series_json` is the JSON-serialized series definition; `window_start`
/// and `window_end` are inclusive `YYYY-MM-DD` dates. When
/// `apply_overrides` is true, per-instance overrides (cancellations, field
/// changes) are overlaid on the result.
///
/// Returns a JSON array of occurrence objects with RFC 3339 datetimes.
#[wasm_bindgen(js_name = "expandSeries")]
pub fn expand_series(
    series_json: &str,
    window_start: &str,
    window_end: &str,
    apply_overrides: bool,
) -> Result<String, JsValue> {
    let series: SeriesDefinition = serde_json::from_str(series_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid series JSON: {}", e)))?;
    let start = parse_window_date(window_start)?;
    let end = parse_window_date(window_end)?;

    let occurrences = if apply_overrides {
        series_engine::expand_with_overrides(&series, start, end)
    } else {
        series_engine::expand(&series, start, end)
    };

    let dtos: Vec<OccurrenceDto> = occurrences.iter().map(OccurrenceDto::from).collect();
    serde_json::to_string(&dtos)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Validate rule text, returning a JSON array of violation messages.
///
/// An empty array means the rule is valid. A rule that cannot even be
/// parsed yields a single-element array with the parse error.
#[wasm_bindgen(js_name = "validateRule")]
pub fn validate_rule(rule: &str) -> Result<String, JsValue> {
    let messages: Vec<String> = match series_engine::parse(rule) {
        Ok(parsed) => series_engine::validate(&parsed)
            .iter()
            .map(ToString::to_string)
            .collect(),
        Err(e) => vec![e.to_string()],
    };

    serde_json::to_string(&messages)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Render a one-line human-readable description of rule text.
#[wasm_bindgen(js_name = "describeRule")]
pub fn describe_rule(rule: &str) -> Result<String, JsValue> {
    let parsed = series_engine::parse(rule)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(series_engine::describe(&parsed))
}
