use std::path::PathBuf;

use campus_nav_lib::route::Route;
use campus_nav_tracking::{
    config::{resolve_gpx_path, NavigatorConfig},
    providers::{GoogleDirections, GpxReplaySource, ScheduleApiResolver},
    NavigationSession, SessionEvent, SessionOutcome,
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Walks a recorded GPX track to the classroom of a scheduled class.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Schedule entry to navigate to
    schedule_id: i64,

    /// GPX file to replay as the device location, absolute or relative to data/gpx
    gpx: PathBuf,

    /// Replay speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = NavigatorConfig::from_env()?;

    let client = reqwest::Client::new();
    let resolver = ScheduleApiResolver::from_config(client.clone(), &config);
    let directions = GoogleDirections::from_config(client, &config);
    let location = GpxReplaySource::from_path(&resolve_gpx_path(&args.gpx), args.speed)?;

    let (session, mut handle) = NavigationSession::new(directions, location);
    let schedule_id = args.schedule_id;
    let session_task = tokio::spawn(async move { session.run(&resolver, schedule_id).await });

    let mut shown_route: Option<Route> = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, ending session");
                handle.end();
            }
            event = handle.recv() => match event {
                Some(SessionEvent::StateChanged(state)) => {
                    let route = state.active_route.as_ref().map(|active| &active.route);
                    if route != shown_route.as_ref() {
                        for (i, step) in state.steps().iter().enumerate() {
                            tracing::info!("{:>2}. {} ({}, {})", i + 1, step.plain_instructions(), step.distance_text, step.duration_text);
                        }
                        for marker in state.turn_markers() {
                            tracing::debug!("Turn marker at {:?} heading {:.0}", marker.position, marker.heading_degrees);
                        }
                        shown_route = route.cloned();
                    }
                }
                Some(SessionEvent::RoutingFailed(msg)) => tracing::warn!("{msg}"),
                Some(SessionEvent::Arrived(floor_plan)) => {
                    tracing::info!("{} - Floor {}: {}", floor_plan.building_name, floor_plan.floor_number, floor_plan.image_url);
                }
                Some(SessionEvent::Failed(msg)) => tracing::error!("{msg}"),
                None => break,
            }
        }
    }

    match session_task.await? {
        Ok(SessionOutcome::Arrived(_)) => tracing::info!("You have arrived"),
        Ok(SessionOutcome::Abandoned) => tracing::info!("Navigation ended before arrival"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
