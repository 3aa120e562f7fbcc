use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const CHANNEL_CAPACITY: usize = 16;

struct ZeroBroadcastChannel<T> {
    broadcast_sender: Option<broadcast::Sender<T>>,
    receivers_count: usize,
}

/// Broadcast sender that only keeps the underlying tokio channel alive while somebody listens.
/// Publishing with no subscribers is a cheap no-op.
#[derive(Clone)]
pub struct ZeroBroadcastSender<T>
where
    T: Clone,
{
    channel: Arc<Mutex<ZeroBroadcastChannel<T>>>,
}

impl<T: Clone> Default for ZeroBroadcastSender<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ZeroBroadcastSender<T> {
    pub fn new() -> Self {
        ZeroBroadcastSender {
            channel: Arc::new(Mutex::new(ZeroBroadcastChannel {
                broadcast_sender: None,
                receivers_count: 0,
            })),
        }
    }

    pub fn subscribe(&self) -> ZeroBroadcastReceiver<T> {
        let mut channel = self.channel.lock().expect("poisoned");
        let receiver = if let Some(broadcast_sender) = channel.broadcast_sender.as_ref() {
            broadcast_sender.subscribe()
        } else {
            log::debug!("First subscriber - creating broadcast channel");
            let (tx, rec) = broadcast::channel(CHANNEL_CAPACITY);
            channel.broadcast_sender = Some(tx);
            rec
        };
        channel.receivers_count += 1;
        log::debug!("Subscriber added, {} subscribers", channel.receivers_count);
        ZeroBroadcastReceiver {
            receiver,
            channel: self.channel.clone(),
        }
    }

    /// Returns number of subscribers that received the message
    pub fn send(&self, msg: T) -> usize {
        let channel = self.channel.lock().expect("poisoned");
        match channel.broadcast_sender.as_ref() {
            Some(broadcast_sender) => broadcast_sender.send(msg).unwrap_or(0),
            None => 0,
        }
    }

    pub fn subscribers(&self) -> usize {
        self.channel.lock().expect("poisoned").receivers_count
    }
}

pub struct ZeroBroadcastReceiver<T>
where
    T: Clone,
{
    receiver: broadcast::Receiver<T>,
    channel: Arc<Mutex<ZeroBroadcastChannel<T>>>,
}

impl<T: Clone> ZeroBroadcastReceiver<T> {
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T: Clone> Drop for ZeroBroadcastReceiver<T> {
    fn drop(&mut self) {
        let mut channel = self.channel.lock().expect("poisoned");
        channel.receivers_count = channel.receivers_count.saturating_sub(1);
        if channel.receivers_count == 0 {
            log::debug!("Last subscriber dropped, closing broadcast channel");
            channel.broadcast_sender = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn broadcast_delivers_only_to_live_subscribers() -> Result<(), anyhow::Error> {
        let sender = ZeroBroadcastSender::<u64>::new();
        assert_eq!(sender.send(1), 0);

        {
            let mut receiver1 = sender.subscribe();
            let mut receiver2 = sender.subscribe();
            assert_eq!(sender.subscribers(), 2);
            assert_eq!(sender.send(7), 2);
            assert_eq!(receiver1.recv().await?, 7);
            assert_eq!(receiver2.try_recv(), Some(7));
        }

        assert_eq!(sender.subscribers(), 0);
        assert_eq!(sender.send(8), 0);

        let mut receiver = sender.subscribe();
        assert_eq!(sender.send(9), 1);
        assert_eq!(receiver.recv().await?, 9);
        Ok(())
    }
}
