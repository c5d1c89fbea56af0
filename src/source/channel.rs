//! Channel-based data source.
//!
//! Receives status snapshots via a tokio watch channel. Useful when the
//! dashboard is embedded next to the checker that produces the snapshots,
//! so they are pushed rather than fetched.

use tokio::sync::watch;

use super::{DataSource, Delivery, SequenceCounter, StatusSnapshot};

/// A data source that receives status snapshots via a channel.
///
/// # Example
///
/// ```
/// use uptime_board::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("in-process checker");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<StatusSnapshot>,
    description: String,
    sequence: SequenceCounter,
    /// Track if we've returned the initial value yet
    initial_returned: bool,
}

impl ChannelSource {
    /// Create a new channel source from the receiving end of a watch channel.
    pub fn new(receiver: watch::Receiver<StatusSnapshot>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            sequence: SequenceCounter::new(),
            initial_returned: false,
        }
    }

    /// Create a channel pair. Returns (sender, source).
    pub fn create(source_description: &str) -> (watch::Sender<StatusSnapshot>, Self) {
        let (tx, rx) = watch::channel(StatusSnapshot::default());
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<Delivery> {
        if !self.initial_returned {
            self.initial_returned = true;
            self.receiver.mark_changed();
        }

        if self.receiver.has_changed().unwrap_or(false) {
            let snapshot = self.receiver.borrow_and_update().clone();
            Some(Delivery {
                seq: self.sequence.next(),
                snapshot,
            })
        } else {
            None
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ServerRecord;

    #[test]
    fn test_channel_source_poll() {
        let (tx, mut source) = ChannelSource::create("test");

        // Initially returns the default (empty) snapshot
        let delivery = source.poll().unwrap();
        assert_eq!(delivery.seq, 1);
        assert!(delivery.snapshot.is_empty());

        assert!(source.poll().is_none());

        let mut snapshot = StatusSnapshot::new();
        snapshot.insert("10.0.0.1".to_string(), ServerRecord::new("web", "10.0.0.1"));
        tx.send(snapshot).unwrap();

        let delivery = source.poll().unwrap();
        assert_eq!(delivery.seq, 2);
        assert_eq!(delivery.snapshot.len(), 1);
    }

    #[test]
    fn test_description() {
        let (_tx, source) = ChannelSource::create("checker");
        assert_eq!(source.description(), "channel: checker");
        assert!(source.error().is_none());
    }
}
