//! Sound / notification collaborator.
//!
//! The core only names the event (`session_started`, `level_up`, ...).
//! How it reaches the user is up to the front end.

use std::cell::RefCell;
use std::rc::Rc;

/// Fire-and-forget sink for notification events. Implementations must not
/// block and must not fail.
pub trait Notifier {
    fn notify(&self, event: &str);
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &str) {}
}

/// Emits each notification as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &str) {
        tracing::info!(event, "notify");
    }
}

/// Keeps every notification in order. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Rc<RefCell<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }

    pub fn clear(&self) {
        self.seen.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &str) {
        self.seen.borrow_mut().push(event.to_string());
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, event: &str) {
        (**self).notify(event)
    }
}
