use std::time::Duration;

use campus_nav_lib::{coordinate::PositionSample, NavigationError};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

pub type LocationEvent = Result<PositionSample, NavigationError>;

/// A live location subscription. Fixes arrive on `updates` in the order the device produced them.
pub struct Subscription {
    pub id: SubscriptionId,
    pub updates: mpsc::UnboundedReceiver<LocationEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the source may deliver.
    pub maximum_age: Duration,
    pub timeout: Option<Duration>,
}

/// Navigation wants every fix fresh and as accurate as possible, for as long as the session lasts.
impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: None,
        }
    }
}

/// A continuous device location source.
pub trait LocationSource {
    fn subscribe(&mut self, options: &WatchOptions) -> Result<Subscription, NavigationError>;

    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Location source fed from outside, e.g. fixes relayed by a browser.
pub struct ChannelLocationSource {
    receiver: Option<mpsc::UnboundedReceiver<LocationEvent>>,
    active: Option<SubscriptionId>,
}

/// The sending half of a [`ChannelLocationSource`].
#[derive(Clone)]
pub struct LocationFeed {
    sender: mpsc::UnboundedSender<LocationEvent>,
}

impl ChannelLocationSource {
    pub fn new() -> (Self, LocationFeed) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let source = Self {
            receiver: Some(receiver),
            active: None,
        };
        (source, LocationFeed { sender })
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }
}

impl LocationSource for ChannelLocationSource {
    fn subscribe(&mut self, options: &WatchOptions) -> Result<Subscription, NavigationError> {
        let Some(updates) = self.receiver.take() else {
            return Err(NavigationError::LocationUnavailable("Location feed already in use".into()));
        };

        tracing::debug!("Subscribed to location feed with {:?}", options);
        let id = SubscriptionId(1);
        self.active = Some(id);
        Ok(Subscription { id, updates })
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.active == Some(id) {
            tracing::debug!("Released location feed subscription");
            self.active = None;
        }
    }
}

impl LocationFeed {
    /// Returns false once the session has stopped listening.
    pub fn push(&self, sample: PositionSample) -> bool {
        self.sender.send(Ok(sample)).is_ok()
    }

    pub fn push_error(&self, message: impl Into<String>) -> bool {
        self.sender.send(Err(NavigationError::LocationUnavailable(message.into()))).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use campus_nav_lib::coordinate::Coordinate;

    use super::*;

    #[tokio::test]
    async fn feed_delivers_in_order() {
        let (mut source, feed) = ChannelLocationSource::new();
        let mut subscription = source.subscribe(&WatchOptions::default()).unwrap();
        assert!(source.is_subscribed());

        feed.push(PositionSample::now(Coordinate::new(1.0, 1.0)));
        feed.push(PositionSample::now(Coordinate::new(2.0, 2.0)));
        feed.push_error("denied");

        let first = subscription.updates.recv().await.unwrap().unwrap();
        let second = subscription.updates.recv().await.unwrap().unwrap();
        assert_eq!(first.position.latitude, 1.0);
        assert_eq!(second.position.latitude, 2.0);
        assert!(matches!(subscription.updates.recv().await, Some(Err(NavigationError::LocationUnavailable(_)))));

        source.unsubscribe(subscription.id);
        assert!(!source.is_subscribed());

        drop(subscription);
        assert!(feed.is_closed());
        assert!(!feed.push(PositionSample::now(Coordinate::new(3.0, 3.0))));
    }

    #[test]
    fn second_subscription_is_refused() {
        let (mut source, _feed) = ChannelLocationSource::new();
        let _subscription = source.subscribe(&WatchOptions::default()).unwrap();
        assert!(matches!(
            source.subscribe(&WatchOptions::default()),
            Err(NavigationError::LocationUnavailable(_))
        ));
    }

    #[test]
    fn default_options_want_fresh_accurate_fixes() {
        let options = WatchOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.maximum_age, Duration::ZERO);
        assert_eq!(options.timeout, None);
    }
}
