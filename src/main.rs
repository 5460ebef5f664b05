use std::sync::Arc;

use anyhow::Result;
use chrono::Duration as ChronoDuration;
use chrono::Utc;
use log::info;
use rand::Rng;
use serde_json::json;
use tokio::time::{sleep, timeout, Duration};
use uuid::Uuid;

use beaconlab::config::PipelineSettings;
use beaconlab::meetings::{encode_meeting_key, MEETING_END_EVENT};
use beaconlab::models::MeetingEvent;
use beaconlab::pipeline::PipelineController;
use beaconlab::plot::{build_series, PlotKind, PlotRequest, PlotSeries, Variable};
use beaconlab::store::InMemoryStore;

/// Feeds the pipeline a synthetic classroom: a handful of cadets and
/// sectors reporting over the last few seconds, plus a meeting log for a
/// generated session. Useful for eyeballing the normalizer and the plot
/// contract without a live store.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("beaconlab simulator starting");

    let settings = PipelineSettings {
        session_poll_secs: 1,
        ..PipelineSettings::default()
    };
    let offset = settings.reference_offset();
    let now = Utc::now().with_timezone(&offset);

    let store = Arc::new(InMemoryStore::new());
    let session_id = Uuid::new_v4().to_string();
    store.set_session(Some(&session_id));
    for seconds_ago in [40, 25, 10] {
        let end = now - ChronoDuration::seconds(seconds_ago);
        store.append_meeting_event(
            &session_id,
            encode_meeting_key(&end),
            MeetingEvent {
                event: MEETING_END_EVENT.to_string(),
                timestamp: end.to_rfc3339(),
            },
        );
    }

    let mut controller = PipelineController::start(store.clone(), settings.clone());
    let mut updates = controller.subscribe();

    let devices: Vec<String> = settings
        .catalog
        .cadets
        .iter()
        .take(6)
        .chain(settings.catalog.sectors.iter().take(2))
        .cloned()
        .collect();

    let mut rng = rand::thread_rng();
    for round in 0i64..5 {
        let timestamp = now - ChronoDuration::seconds(5 - round);
        for device_id in &devices {
            store.insert_record(
                &format!("{device_id}-{round}"),
                json!({
                    "device_id": device_id,
                    "timestamp": timestamp.to_rfc3339(),
                    "infection_status": if rng.gen_bool(0.25) { 1 } else { 0 },
                    "proximity_mask": rng.gen_range(0..64),
                    "tasks_completed": rng.gen_range(0..8),
                }),
            );
        }
        sleep(Duration::from_millis(50)).await;
    }

    // Wait for the last accepted recomputation to land.
    let _ = timeout(Duration::from_secs(2), updates.changed()).await;
    sleep(Duration::from_millis(200)).await;

    let records = controller.current_records().await;
    info!(
        "normalized {} records, watermark {:?}, session {:?}",
        records.len(),
        controller.watermark().await,
        controller.session_id().await,
    );

    let line = PlotRequest {
        kind: PlotKind::Line,
        x: Some(Variable::Time),
        y: Some(Variable::MeetingsHeld),
        ..Default::default()
    };
    match build_series(&line, &records)? {
        PlotSeries::Points {
            points, y_bounds, ..
        } => info!(
            "meetings-held line: {} points, y [{}, {}]",
            points.len(),
            y_bounds.min,
            y_bounds.max
        ),
        PlotSeries::Empty => info!("meetings-held line: no data"),
        other => info!("unexpected series shape: {other:?}"),
    }

    let histogram = PlotRequest {
        kind: PlotKind::Histogram,
        x: Some(Variable::InfectedCadets),
        ..Default::default()
    };
    match build_series(&histogram, &records)? {
        PlotSeries::Buckets { buckets } => {
            for bucket in buckets {
                info!(
                    "infected cadet {}: {} records",
                    bucket.range, bucket.frequency
                );
            }
        }
        PlotSeries::Empty => info!("no infected cadets this run"),
        other => info!("unexpected series shape: {other:?}"),
    }

    controller.stop().await?;
    info!("simulator done");
    Ok(())
}
