//! Inbox channel types.
//!
//! Every async handler reports back through one unbounded channel; the
//! runtime is the only receiver.

use tokio::sync::mpsc;

use crate::events::PageEvent;

pub type PageEventSender = mpsc::UnboundedSender<PageEvent>;
pub type PageEventReceiver = mpsc::UnboundedReceiver<PageEvent>;
