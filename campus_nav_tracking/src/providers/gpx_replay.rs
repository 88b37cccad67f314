use std::{collections::HashMap, io::Read, path::Path, time::Duration};

use campus_nav_lib::{
    coordinate::{Coordinate, PositionSample},
    NavigationError,
};
use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, task::JoinHandle};

use super::location::{LocationSource, Subscription, SubscriptionId, WatchOptions};

/// Spacing used between track points that carry no timestamp.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Replays a recorded GPX walk as if it were a live device.
pub struct GpxReplaySource {
    fixes: Vec<(Coordinate, Duration)>,
    next_id: u64,
    replays: HashMap<SubscriptionId, JoinHandle<()>>,
}

impl GpxReplaySource {
    pub fn from_path(path: &Path, speed: f64) -> Result<Self, NavigationError> {
        let file = std::fs::File::open(path)
            .map_err(|err| NavigationError::LocationUnavailable(format!("Failed to open {:?}: {err}", path)))?;
        Self::from_reader(std::io::BufReader::new(file), speed)
    }

    /// `speed` divides the recorded time between fixes.
    pub fn from_reader<R: Read>(reader: R, speed: f64) -> Result<Self, NavigationError> {
        let gpx = gpx::read(reader)
            .map_err(|err| NavigationError::LocationUnavailable(format!("Failed to read GPX: {err}")))?;

        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };

        let mut fixes = Vec::new();
        let mut previous_time: Option<DateTime<Utc>> = None;

        for track in gpx.tracks {
            for segment in track.segments {
                for point in segment.points {
                    let time = point.time.as_ref()
                        .and_then(|t| t.format().ok())
                        .and_then(|t| t.parse::<DateTime<Utc>>().ok());

                    let delay = match (previous_time, time) {
                        (None, _) if fixes.is_empty() => Duration::ZERO,
                        (Some(previous), Some(current)) => (current - previous).to_std().unwrap_or(Duration::ZERO),
                        _ => DEFAULT_INTERVAL,
                    };

                    previous_time = time;
                    fixes.push((Coordinate::from(point.point()), scale_delay(delay, speed)));
                }
            }
        }

        tracing::debug!("Loaded {} fixes for replay", fixes.len());

        Ok(Self {
            fixes,
            next_id: 0,
            replays: HashMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Saturates instead of overflowing for very small speeds.
fn scale_delay(delay: Duration, speed: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() / speed).unwrap_or(Duration::MAX)
}

impl LocationSource for GpxReplaySource {
    fn subscribe(&mut self, _options: &WatchOptions) -> Result<Subscription, NavigationError> {
        if self.fixes.is_empty() {
            return Err(NavigationError::LocationUnavailable("GPX track has no points".into()));
        }

        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let (sender, updates) = mpsc::unbounded_channel();
        let fixes = self.fixes.clone();

        let replay = tokio::spawn(async move {
            for (position, delay) in fixes {
                tokio::time::sleep(delay).await;
                if sender.send(Ok(PositionSample::now(position))).is_err() {
                    break;
                }
            }
            tracing::debug!("Replay finished");
        });

        self.replays.insert(id, replay);
        Ok(Subscription { id, updates })
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if let Some(replay) = self.replays.remove(&id) {
            replay.abort();
        }
    }
}

impl Drop for GpxReplaySource {
    fn drop(&mut self) {
        for replay in self.replays.values() {
            replay.abort();
        }
    }
}
