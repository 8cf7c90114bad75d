use std::time::Duration;

/// A one-shot timer facility (`setTimeout` in the browser).
pub trait TimerBackend {
    type Handle;

    /// Schedule the owner's timeout callback after `delay`.
    fn start(&self, delay: Duration) -> Self::Handle;

    fn cancel(&self, handle: Self::Handle);
}

/// Single-slot cancellable timer: at most one timeout is ever pending.
pub struct HideTimer<B: TimerBackend> {
    backend: B,
    pending: Option<B::Handle>,
}

impl<B: TimerBackend> HideTimer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pending: None,
        }
    }

    /// Cancel any pending timeout and schedule a fresh one.
    pub fn restart(&mut self, delay: Duration) {
        self.cancel();
        self.pending = Some(self.backend.start(delay));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.backend.cancel(handle);
        }
    }

    /// The pending timeout ran; the slot is free again.
    pub fn fired(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
