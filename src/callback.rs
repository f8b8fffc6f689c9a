//! Callback adapters bridging functional handlers to callback objects.
//!
//! A live sensor delivers frames and notifications through callback objects
//! it owns. The adapters here wrap a plain closure in such an object; the
//! wrapping is one-way by construction: the adapter is moved into the
//! registration call, the sensor holds the only strong reference, and the
//! release contract is the adapter's `Drop`. There is no explicit release
//! entry point, so releasing twice or invoking a released adapter cannot be
//! expressed.

use tracing::trace;

use crate::sensor::types::{Frame, Notification};

/// Receiver of captured frames.
///
/// Invoked on the sensor's frame-delivery thread; implementations must not
/// assume any particular caller thread.
pub trait FrameCallback: Send + Sync {
    /// Deliver one frame. Ownership of the frame reference passes to the
    /// callee; the sensor does not retain it.
    fn on_frame(&self, frame: Frame);
}

/// Receiver of sensor notifications.
pub trait NotificationCallback: Send + Sync {
    /// Deliver one notification.
    fn on_notification(&self, notification: &Notification);
}

/// Adapter turning a closure into a [`FrameCallback`].
///
/// Owns exactly one handler. `on_frame` invokes it synchronously with no
/// buffering, retry, or error translation; whatever the handler does with a
/// failure is the handler's business.
pub struct FrameCallbackAdapter {
    on_frame: Box<dyn Fn(Frame) + Send + Sync>,
}

impl FrameCallbackAdapter {
    /// Wrap `handler`, taking ownership of it.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Frame) + Send + Sync + 'static,
    {
        Self {
            on_frame: Box::new(handler),
        }
    }
}

impl FrameCallback for FrameCallbackAdapter {
    fn on_frame(&self, frame: Frame) {
        (self.on_frame)(frame);
    }
}

impl Drop for FrameCallbackAdapter {
    fn drop(&mut self) {
        trace!("Frame callback adapter released");
    }
}

/// Adapter turning a closure into a [`NotificationCallback`].
pub struct NotificationCallbackAdapter {
    on_notification: Box<dyn Fn(&Notification) + Send + Sync>,
}

impl NotificationCallbackAdapter {
    /// Wrap `handler`, taking ownership of it.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        Self {
            on_notification: Box::new(handler),
        }
    }
}

impl NotificationCallback for NotificationCallbackAdapter {
    fn on_notification(&self, notification: &Notification) {
        (self.on_notification)(notification);
    }
}

impl Drop for NotificationCallbackAdapter {
    fn drop(&mut self) {
        trace!("Notification callback adapter released");
    }
}
