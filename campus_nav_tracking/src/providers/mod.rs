pub mod directions;
pub mod gpx_replay;
pub mod location;
pub mod resolver;

pub use directions::{DirectionsProvider, GoogleDirections};
pub use gpx_replay::GpxReplaySource;
pub use location::{ChannelLocationSource, LocationFeed, LocationSource, Subscription, SubscriptionId, WatchOptions};
pub use resolver::{DestinationResolver, ScheduleApiResolver};

#[cfg(test)]
pub(crate) mod mock_http;
