//! Single-slot, coalescing mailbox backed by one atomic byte.
//!
//! A mailbox stores the most recent value written by a producer. Subsequent
//! writes overwrite the previous value and report a `Coalesced` outcome while
//! remaining strictly non-blocking. The consumer swaps the slot back to the
//! empty code, so every published value is observed at most once.

use core::fmt;
use core::marker::PhantomData;
#[cfg(feature = "loom")]
use loom::sync::atomic::{AtomicU8, Ordering};
#[cfg(not(feature = "loom"))]
use std::sync::atomic::{AtomicU8, Ordering};

/// One-byte encoding for values stored in a [`Mailbox`].
///
/// `from_code` must be total: codes it does not recognise map to the empty
/// value so a torn or foreign byte never surfaces as a pending value.
pub trait SlotCode: Copy {
    /// Code stored when the slot holds nothing.
    const EMPTY: u8;

    /// Encodes the value into its slot byte.
    fn to_code(self) -> u8;

    /// Decodes a slot byte.
    fn from_code(code: u8) -> Self;
}

/// Outcome reported when writing into the mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MailboxSend {
    /// Value replaced an empty slot.
    Accepted,
    /// Value overwrote one that had not yet been consumed.
    Coalesced,
}

/// Coalescing mailbox that retains only the newest value.
pub struct Mailbox<T: SlotCode> {
    slot: AtomicU8,
    _value: PhantomData<fn() -> T>,
}

impl<T: SlotCode> Mailbox<T> {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self {
            slot: AtomicU8::new(T::EMPTY),
            _value: PhantomData,
        }
    }

    /// Writes a value into the mailbox without blocking.
    ///
    /// Returns [`MailboxSend::Coalesced`] when the previous value is
    /// overwritten before the consumer observed it.
    pub fn publish(&self, value: T) -> MailboxSend {
        let prev = self.slot.swap(value.to_code(), Ordering::AcqRel);
        if prev == T::EMPTY {
            MailboxSend::Accepted
        } else {
            MailboxSend::Coalesced
        }
    }

    /// Returns the latest value and resets the slot to empty in one step.
    pub fn take(&self) -> T {
        T::from_code(self.slot.swap(T::EMPTY, Ordering::AcqRel))
    }

    /// Reads the pending value without consuming it.
    pub fn peek(&self) -> T {
        T::from_code(self.slot.load(Ordering::Acquire))
    }

    /// True when no value is pending.
    pub fn is_empty(&self) -> bool {
        self.slot.load(Ordering::Acquire) == T::EMPTY
    }
}

impl<T: SlotCode> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SlotCode + fmt::Debug> fmt::Debug for Mailbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox").field("pending", &self.peek()).finish()
    }
}
