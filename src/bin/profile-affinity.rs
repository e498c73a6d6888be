//! Demo: run both passes over the sample profiles and print the snapshot and
//! its render projections as JSON.
//!
//! Usage: `profile-affinity [config.yaml]`
//!
//! Without a config file the engine runs offline (stub oracles) unless
//! `PROFILE_AFFINITY_API_KEY` is set, in which case both API endpoints are used.

use std::error::Error;
use std::sync::Arc;

use profile_affinity::config::ENV_API_KEY;
use profile_affinity::{sample_face_detector, sample_profiles, EngineConfig, ProfileEngine};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("PROFILE_AFFINITY_LOG_JSON").is_ok_and(|v| v == "1");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path)?,
        None if std::env::var(ENV_API_KEY).is_ok() => EngineConfig::default(),
        None => EngineConfig::stub(),
    };
    config.apply_env_overrides();
    config.validate()?;
    tracing::info!(
        similarity_mode = %config.similarity.mode,
        face_mode = %config.face.mode,
        "engine_config_loaded"
    );

    let mut engine = ProfileEngine::from_config(&config)?;
    if config.face.mode == "stub" {
        engine = engine.with_detector(Arc::new(sample_face_detector()));
    }

    let profiles = sample_profiles();
    let (interests, faces) = tokio::join!(
        engine.refresh_interests(profiles.interests.clone()),
        engine.refresh_faces(profiles.images.clone()),
    );

    let snapshot = engine.snapshot();
    let colors: serde_json::Map<String, serde_json::Value> = snapshot
        .all_unique_ordered_interests()
        .into_iter()
        .map(|label| {
            let color = json!(snapshot.interest_color(&label));
            (label, color)
        })
        .collect();

    let output = json!({
        "profiles": profiles,
        "snapshot": snapshot,
        "interest_pass": interests.committed().map(|r| r.similarity.stats),
        "face_pass_committed": faces.is_committed(),
        "render": {
            "all_unique_ordered_interests": snapshot.all_unique_ordered_interests(),
            "interest_colors": colors,
            "heatmap": snapshot.heatmap(),
            "face_box_styles": [
                snapshot.face_box_style(0).map(|s| s.to_string()),
                snapshot.face_box_style(1).map(|s| s.to_string()),
            ],
            "object_positions": [snapshot.object_position(0), snapshot.object_position(1)],
            "alignment_transform": snapshot.alignment_transform(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
