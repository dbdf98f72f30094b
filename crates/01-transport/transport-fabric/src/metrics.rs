use std::sync::atomic::{AtomicU32, Ordering};

use transport::MailboxSend;

#[derive(Default)]
pub(crate) struct ReceiverMetrics {
    datagrams: AtomicU32,
    published: AtomicU32,
    coalesced: AtomicU32,
    ignored: AtomicU32,
    errors: AtomicU32,
}

impl ReceiverMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_datagram(&self) {
        self.datagrams.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_publish(&self, outcome: MailboxSend) {
        self.published.fetch_add(1, Ordering::Relaxed);
        if outcome == MailboxSend::Coalesced {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ReceiverStats {
        ReceiverStats {
            datagrams: self.datagrams.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Counters describing what the receiver has seen so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Datagrams read off the socket.
    pub datagrams: u32,
    /// Commands written into the mailbox.
    pub published: u32,
    /// Publishes that overwrote an unread command.
    pub coalesced: u32,
    /// Datagrams that did not decode to a command.
    pub ignored: u32,
    /// Unexpected socket errors while the receiver was open.
    pub errors: u32,
}
