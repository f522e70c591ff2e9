use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use event_listener::Event;

/// Terminal notification shared between weft tasks.
///
/// Once raised the event stays raised forever and subscribers arriving
/// after the fact observe it immediately. Close and shutdown signalling is
/// built on this: any number of waiters resolve against the same raise.
#[derive(Debug, Default)]
pub struct StickyEvent {
    raised: AtomicBool,
    waiters: Event,
}

impl StickyEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// raise the event and wake every waiter; raising again is a no-op
    pub fn raise(&self) {
        if !self.raised.swap(true, Ordering::SeqCst) {
            self.waiters.notify(usize::MAX);
        }
    }

    /// resolve once the event is raised, immediately if it already was
    pub async fn wait(&self) {
        while !self.is_raised() {
            let parked = self.waiters.listen();
            // the raise may have slipped in between the check and parking
            if self.is_raised() {
                break;
            }
            parked.await;
        }
    }
}
