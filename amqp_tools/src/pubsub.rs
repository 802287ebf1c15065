//! The lossy pub/sub channel.
//!
//! A single named channel carrying the same serialized envelope as the broker, with
//! best-effort delivery: a subscriber that falls behind loses the oldest messages instead of
//! applying backpressure to the publisher.

use log::*;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct PubSubChannel {
    name: String,
    sender: broadcast::Sender<Vec<u8>>,
}

impl PubSubChannel {
    pub fn new(name: &str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { name: name.to_string(), sender }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish to every current subscriber. Having no subscribers is not an error — the
    /// channel is best-effort by contract.
    pub fn publish(&self, payload: &[u8]) -> usize {
        match self.sender.send(payload.to_vec()) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("📡️ No subscribers on channel {}; message dropped", self.name);
                0
            },
        }
    }

    pub fn subscribe(&self) -> PubSubSubscription {
        PubSubSubscription { channel: self.name.clone(), receiver: self.sender.subscribe() }
    }
}

pub struct PubSubSubscription {
    channel: String,
    receiver: broadcast::Receiver<Vec<u8>>,
}

impl PubSubSubscription {
    /// The next message, skipping over any the subscriber was too slow to receive. Returns
    /// `None` when the channel is closed.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("📡️ Subscriber on {} lagged; {missed} message(s) lost", self.channel);
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn fan_out_to_multiple_subscribers() {
        let channel = PubSubChannel::new("orders.events.live", 16);
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();
        assert_eq!(channel.publish(b"ev-1"), 2);
        assert_eq!(a.next().await.unwrap(), b"ev-1");
        assert_eq!(b.next().await.unwrap(), b"ev-1");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let channel = PubSubChannel::new("orders.events.live", 16);
        assert_eq!(channel.publish(b"dropped"), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_loses_oldest() {
        let channel = PubSubChannel::new("orders.events.live", 2);
        let mut sub = channel.subscribe();
        for i in 0..5u8 {
            channel.publish(&[i]);
        }
        // The two newest survive; the lag is logged and skipped.
        assert_eq!(sub.next().await.unwrap(), vec![3]);
        assert_eq!(sub.next().await.unwrap(), vec![4]);
    }
}
