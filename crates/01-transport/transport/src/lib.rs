//! Core transport primitives shared by the receiver and the control loop.
//!
//! * [`Mailbox`] – single-slot, overwrite-on-arrival exchange cell.
//! * [`SlotCode`] – byte encoding a value must provide to live in a mailbox.
//! * [`MailboxSend`] – outcome reported to the producer on every publish.

mod mailbox;

pub use mailbox::{Mailbox, MailboxSend, SlotCode};
