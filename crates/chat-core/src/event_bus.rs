//! Hand-off queue between a running `ChatSession` and the egui frame loop.
//!
//! The session publishes while it awaits the assistant; the app takes the
//! whole backlog at the start of each frame. Everything runs on the browser's
//! single thread, so a shared `RefCell` is enough.

use std::cell::RefCell;
use std::rc::Rc;
use chat_types::event::ChatEvent;

/// Shared, clone-cheap queue of `ChatEvent`s in emission order
#[derive(Clone, Default)]
pub struct EventBus {
    queue: Rc<RefCell<Vec<ChatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ChatEvent) {
        self.queue.borrow_mut().push(event);
    }

    /// Take every queued event, oldest first, leaving the bus empty.
    pub fn drain(&self) -> Vec<ChatEvent> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    /// Whether the session published anything since the last drain
    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }
}
