// Route list writers
//
// JSON: one record per request with the route, completion and quality.
// SUMO: a route file with one vehicle per request, departures 10 s apart.

use anyhow::{Context, Result};
use antroute_core::{RouteResult, SegmentId, Termination};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Sumo,
}

/// Seconds between consecutive vehicle departures in SUMO output
const DEPART_INTERVAL_S: u64 = 10;

#[derive(Debug, Serialize)]
pub struct RouteRecord<'a> {
    pub id: String,
    pub start: &'a SegmentId,
    pub destination: &'a SegmentId,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<Termination>,
    pub quality: f64,
    pub segments: &'a [SegmentId],
}

impl<'a> RouteRecord<'a> {
    pub fn from_result(index: usize, result: &'a RouteResult) -> Self {
        Self {
            id: vehicle_id(index),
            start: &result.request.start,
            destination: &result.request.destination,
            complete: result.outcome.is_complete(),
            termination: result.outcome.termination(),
            quality: result.quality.quality().value(),
            segments: result.outcome.route().segments(),
        }
    }
}

fn vehicle_id(index: usize) -> String {
    format!("vehicle_{}", index)
}

pub fn render_json(results: &[RouteResult]) -> Result<String> {
    let records: Vec<RouteRecord<'_>> = results
        .iter()
        .enumerate()
        .map(|(i, r)| RouteRecord::from_result(i, r))
        .collect();
    serde_json::to_string_pretty(&records).context("Failed to serialize routes")
}

pub fn render_sumo(results: &[RouteResult]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<routes>\n");
    for (i, result) in results.iter().enumerate() {
        let edges: Vec<String> = result
            .outcome
            .route()
            .iter()
            .map(|segment| escape_xml(segment.as_str()))
            .collect();
        // Writing into a String cannot fail
        let _ = writeln!(
            xml,
            "    <vehicle id=\"{}\" depart=\"{}\">",
            vehicle_id(i),
            i as u64 * DEPART_INTERVAL_S
        );
        let _ = writeln!(xml, "        <route edges=\"{}\"/>", edges.join(" "));
        xml.push_str("    </vehicle>\n");
    }
    xml.push_str("</routes>\n");
    xml
}

pub fn write_routes(path: &Path, format: OutputFormat, results: &[RouteResult]) -> Result<()> {
    let contents = match format {
        OutputFormat::Json => render_json(results)?,
        OutputFormat::Sumo => render_sumo(results),
    };
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write routes to {}", path.display()))
}

fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            ch => escaped.push(ch),
        }
    }
    escaped
}
