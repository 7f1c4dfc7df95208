// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stride-Tracker session replay
//!
//! Feeds a recorded fix trace through the full tracker (filtering, session
//! aggregates, rewards, achievements) and prints the finished session.
//!
//! Usage: `stride-replay <trace.json> [--store DIR] [--user ID]`
//!
//! The trace is a JSON array of `{ "lat", "lon", "timestamp_ms", "speed_mps" }`
//! objects. Without `--store`, state lives in memory for the run only.

use futures_util::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;
use stride_tracker::{
    config::Config,
    db::{JsonFileStore, KeyValueStore, MemoryStore},
    models::{Coordinate, LocationFix, RunSession},
    services::{LogNotifier, ManualLocationService, SessionUploader, SyncError},
    time_utils::{format_utc_rfc3339, from_millis, ManualClock},
    AppState, Collaborators,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize)]
struct TracePoint {
    lat: f64,
    lon: f64,
    timestamp_ms: i64,
    #[serde(default)]
    speed_mps: f64,
}

impl From<&TracePoint> for LocationFix {
    fn from(p: &TracePoint) -> Self {
        LocationFix::new(Coordinate::new(p.lat, p.lon), p.timestamp_ms, p.speed_mps)
    }
}

struct Args {
    trace: String,
    store_dir: Option<String>,
    user_id: String,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut trace = None;
    let mut store_dir = None;
    let mut user_id = "replay".to_string();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--store" => store_dir = Some(args.next().ok_or("--store needs a directory")?),
            "--user" => user_id = args.next().ok_or("--user needs an id")?,
            _ if trace.is_none() => trace = Some(arg),
            other => return Err(format!("Unexpected argument: {}", other)),
        }
    }

    Ok(Args {
        trace: trace.ok_or("usage: stride-replay <trace.json> [--store DIR] [--user ID]")?,
        store_dir,
        user_id,
    })
}

/// Uploader that only logs; replays never talk to a backend.
struct LoggingUploader;

impl SessionUploader for LoggingUploader {
    fn upload<'a>(&'a self, session: &'a RunSession) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(async move {
            tracing::info!(session_id = session.id, "Upload skipped in replay");
            Ok(())
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args = parse_args()?;
    let config = Config::from_env()?;
    tracing::info!(trace = %args.trace, unit = %config.unit, "Starting replay");

    let raw = std::fs::read_to_string(&args.trace)?;
    let points: Vec<TracePoint> = serde_json::from_str(&raw)?;
    let Some(first) = points.first() else {
        return Err("trace contains no fixes".into());
    };
    tracing::info!(fixes = points.len(), "Trace loaded");

    let kv: Arc<dyn KeyValueStore> = match &args.store_dir {
        Some(dir) => Arc::new(JsonFileStore::new(dir)?),
        None => Arc::new(MemoryStore::new()),
    };

    let clock = ManualClock::new(from_millis(first.timestamp_ms));
    let location = Arc::new(ManualLocationService::new(true));
    let state = AppState::start(
        config,
        kv,
        &args.user_id,
        Collaborators {
            clock: Arc::new(clock.clone()),
            location: location.clone(),
            notifier: Arc::new(LogNotifier),
            uploader: Arc::new(LoggingUploader),
        },
    );

    state.tracker.start().await?;
    for point in &points {
        clock.set(from_millis(point.timestamp_ms));
        if !location.push(LocationFix::from(point)).await {
            tracing::warn!(timestamp_ms = point.timestamp_ms, "Fix not delivered");
        }
    }

    let outcome = state.tracker.finish().await?;
    let session = &outcome.session;
    let unit = state.config.unit;

    tracing::info!(
        session_id = session.id,
        gems = outcome.reward.total(),
        total_gems = outcome.ledger.total_gems,
        unlocked = outcome.newly_unlocked.len(),
        "Replay finished"
    );

    let summary = serde_json::json!({
        "session_id": session.id,
        "start_time": format_utc_rfc3339(session.start_time),
        "distance": session.distance_in(unit),
        "unit": unit.to_string(),
        "duration_seconds": session.duration_seconds,
        "average_speed": session.average_speed,
        "average_pace": session.average_pace,
        "max_speed": session.max_speed,
        "route_points": session.route.len(),
        "polyline": session.encoded_route().ok(),
        "route": session.route_geojson(),
        "reward": outcome.reward,
        "newly_unlocked": outcome
            .newly_unlocked
            .iter()
            .map(|a| a.id.as_str())
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "stride_tracker=debug".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };

    tracing_subscriber::registry().with(filter).with(format).init();
}
